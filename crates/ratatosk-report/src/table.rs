//! Report table rendering
//!
//! Fixed columns, one row per backup record. Records without statistics
//! (host markers, composite announcements, failed drivers) render as empty
//! cells, so every row still spans the full column count.

use ratatosk_core::human_readable_size;
use ratatosk_restic::{BackupRecord, RunResults};
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

/// One rendered report row
#[derive(Debug, Clone, Tabled)]
pub struct ReportRow {
    #[tabled(rename = "hostname")]
    pub hostname: String,
    #[tabled(rename = "name")]
    pub name: String,
    #[tabled(rename = "subname")]
    pub subname: String,
    #[tabled(rename = "type")]
    pub backup_type: String,
    #[tabled(rename = "files\nnew")]
    pub files_new: String,
    #[tabled(rename = "files\nchanged")]
    pub files_changed: String,
    #[tabled(rename = "files\nunmodified")]
    pub files_unmodified: String,
    #[tabled(rename = "dirs\nnew")]
    pub dirs_new: String,
    #[tabled(rename = "dirs\nchanged")]
    pub dirs_changed: String,
    #[tabled(rename = "dirs\nunmodified")]
    pub dirs_unmodified: String,
    #[tabled(rename = "total\nfiles")]
    pub total_files: String,
    #[tabled(rename = "total\nbytes")]
    pub total_bytes: String,
    #[tabled(rename = "duration")]
    pub duration: String,
    #[tabled(rename = "snapshot ID")]
    pub snapshot_id: String,
}

/// HTML header cells, `<br>` instead of newlines
const HTML_HEADERS: [&str; 14] = [
    "hostname",
    "name",
    "subname",
    "type",
    "files<br>new",
    "files<br>changed",
    "files<br>unmodified",
    "dirs<br>new",
    "dirs<br>changed",
    "dirs<br>unmodified",
    "total<br>files",
    "total<br>bytes",
    "duration",
    "snapshot ID",
];

impl ReportRow {
    pub fn from_record(record: &BackupRecord) -> Self {
        let stats = record.stats.as_ref();
        let num = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_default();
        Self {
            hostname: record.hostname.clone(),
            name: record.name.clone(),
            subname: record.subname.clone(),
            // Only rows with statistics carry the type, matching the report
            // shape where announcement rows stay blank past the subname
            backup_type: stats.map(|_| record.backup_type.clone()).unwrap_or_default(),
            files_new: num(stats.map(|s| s.files_new)),
            files_changed: num(stats.map(|s| s.files_changed)),
            files_unmodified: num(stats.map(|s| s.files_unmodified)),
            dirs_new: num(stats.map(|s| s.dirs_new)),
            dirs_changed: num(stats.map(|s| s.dirs_changed)),
            dirs_unmodified: num(stats.map(|s| s.dirs_unmodified)),
            total_files: num(stats.map(|s| s.total_files_processed)),
            total_bytes: stats
                .map(|s| human_readable_size(s.total_bytes_processed))
                .unwrap_or_default(),
            duration: stats
                .map(|s| format!("{:.1}", s.total_duration))
                .unwrap_or_default(),
            snapshot_id: stats.map(|s| s.snapshot_id.clone()).unwrap_or_default(),
        }
    }

    fn cells(&self) -> [&str; 14] {
        [
            &self.hostname,
            &self.name,
            &self.subname,
            &self.backup_type,
            &self.files_new,
            &self.files_changed,
            &self.files_unmodified,
            &self.dirs_new,
            &self.dirs_changed,
            &self.dirs_unmodified,
            &self.total_files,
            &self.total_bytes,
            &self.duration,
            &self.snapshot_id,
        ]
    }
}

/// All records of a run in report order
pub fn report_rows(run: &RunResults) -> Vec<ReportRow> {
    run.records().map(ReportRow::from_record).collect()
}

/// Box-drawing console table; numeric columns right-aligned
pub fn render_console(rows: &[ReportRow]) -> String {
    let mut table = Table::new(rows);
    table
        .with(Style::modern())
        .with(Modify::new(Columns::new(4..)).with(Alignment::right()));
    table.to_string()
}

/// Bordered HTML table for the emailed report
pub fn render_html(rows: &[ReportRow]) -> String {
    let mut out = String::from("<table cellpadding='1' cellspacing='0' border='1'>\n<thead>\n  <tr>\n");
    for header in HTML_HEADERS {
        out.push_str(&format!("    <th align='right'>{header}</th>\n"));
    }
    out.push_str("  </tr>\n</thead>\n<tbody>\n");
    for row in rows {
        out.push_str("  <tr>\n");
        for cell in row.cells() {
            out.push_str(&format!("    <td align='right'>{cell}</td>\n"));
        }
        out.push_str("  </tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}
