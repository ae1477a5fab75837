//! # ratatosk-report
//!
//! Turns a run's backup records into a report: a box-drawing console table,
//! or an HTML table delivered by SMTP.

pub mod email;
pub mod table;

pub use email::send_report;
pub use table::{render_console, render_html, report_rows, ReportRow};
