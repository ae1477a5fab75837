//! # ratatosk-core
//!
//! Core library for the Ratatosk CLI providing:
//! - Global and per-host configuration file parsing (YAML)
//! - Type definitions for backup groups and sources
//! - Shared utilities (human readable sizes, home directory lookup)

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use config::{Config, HostEntry, HostStore};
pub use error::{Error, Result};
pub use types::{BackupGroup, DbParams, GlobalConfig, HostConfig, SmtpConfig, SourceEntry, SourceSpec};
pub use utils::{get_home_dir, human_readable_size};
