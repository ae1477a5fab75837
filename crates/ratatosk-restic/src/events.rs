//! restic's line-delimited JSON event protocol
//!
//! With `--json`, restic emits one JSON object per line tagged by
//! `message_type`: transient `status` lines, `error` lines, and a final
//! `summary`. The consumer is a single pass in input order; anything that
//! does not parse, or carries an unknown tag, is logged and dropped.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::record::BackupStats;

/// One parsed protocol line
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum ResticEvent {
    Error(ErrorEvent),
    Summary(SummaryEvent),
    Status(StatusEvent),
}

/// An error reported mid-backup; the backup usually continues past it
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEvent {
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "Op", default)]
    pub op: Option<String>,
    #[serde(rename = "Err", default)]
    pub err: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorEvent {
    /// Human readable form, mirroring restic's own fields
    pub fn message(&self) -> String {
        match &self.error {
            Some(detail) => {
                if let Some(message) = &detail.message {
                    format!("Error: {} ({})", message, self.item)
                } else {
                    format!(
                        "Error {}({}): {}",
                        detail.op.as_deref().unwrap_or("?"),
                        detail.err.as_ref().map(|e| e.to_string()).unwrap_or_default(),
                        self.item
                    )
                }
            }
            None => format!("Unknown error: {}", self.item),
        }
    }
}

/// Final statistics for one backup
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryEvent {
    #[serde(default)]
    pub files_new: u64,
    #[serde(default)]
    pub files_changed: u64,
    #[serde(default)]
    pub files_unmodified: u64,
    #[serde(default)]
    pub dirs_new: u64,
    #[serde(default)]
    pub dirs_changed: u64,
    #[serde(default)]
    pub dirs_unmodified: u64,
    #[serde(default)]
    pub total_files_processed: u64,
    #[serde(default)]
    pub total_bytes_processed: u64,
    #[serde(default)]
    pub data_added: u64,
    #[serde(default)]
    pub total_duration: f64,
    #[serde(default)]
    pub snapshot_id: String,
}

/// Transient progress, shown live but never persisted
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusEvent {
    #[serde(default)]
    pub seconds_elapsed: Option<u64>,
    #[serde(default)]
    pub percent_done: Option<f64>,
    #[serde(default)]
    pub files_done: Option<u64>,
    #[serde(default)]
    pub total_files: Option<u64>,
}

impl StatusEvent {
    /// One-line rendering for live feedback
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(s) = self.seconds_elapsed {
            parts.push(format!("Seconds elapsed: {s}"));
        }
        if let Some(p) = self.percent_done {
            parts.push(format!("Percent done: {:.0}", p * 100.0));
        }
        if let Some(f) = self.files_done {
            parts.push(format!("Files done: {f}"));
        }
        parts.join(", ")
    }
}

/// Where transient status lines go. Injected so drivers never care whether
/// a terminal is attached.
pub trait ProgressSink: Send + Sync {
    fn status(&self, status: &StatusEvent);

    /// Called when a backup finishes, to clear any live line
    fn clear(&self) {}
}

/// Discards all progress
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn status(&self, _status: &StatusEvent) {}
}

/// Parse one protocol line. `None` means the line carried no event: blank,
/// not JSON, or an unknown `message_type`.
pub fn parse_line(line: &str) -> Option<ResticEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if !line.starts_with('{') {
        debug!("non-json restic output: {line}");
        return None;
    }
    match serde_json::from_str::<ResticEvent>(line) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!("discarding unparseable restic line ({err}): {line}");
            None
        }
    }
}

/// Folds an event stream into the final statistics and error list.
///
/// The fold owns all mutation; the resulting record is immutable once
/// `finish` runs.
#[derive(Debug, Default)]
pub struct EventFold {
    errors: Vec<String>,
    summary: Option<SummaryEvent>,
}

impl EventFold {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ResticEvent, progress: &dyn ProgressSink) {
        match event {
            ResticEvent::Error(err) => self.errors.push(err.message()),
            ResticEvent::Summary(summary) => self.summary = Some(summary),
            ResticEvent::Status(status) => progress.status(&status),
        }
    }

    pub fn finish(self) -> (Option<BackupStats>, Vec<String>) {
        (self.summary.as_ref().map(BackupStats::from_summary), self.errors)
    }
}
