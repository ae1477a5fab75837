//! Backup result records
//!
//! One record per driver invocation, immutable once the driver returns.
//! Statistics are present if and only if restic reported a summary event.

use serde::Serialize;

use crate::events::SummaryEvent;

/// Statistics from one restic summary event
#[derive(Debug, Clone, Default, Serialize)]
pub struct BackupStats {
    pub files_new: u64,
    pub files_changed: u64,
    pub files_unmodified: u64,
    pub dirs_new: u64,
    pub dirs_changed: u64,
    pub dirs_unmodified: u64,
    pub total_files_processed: u64,
    pub total_bytes_processed: u64,
    pub total_duration: f64,
    pub snapshot_id: String,
}

impl BackupStats {
    /// Build from a summary event. When the backup was fed on stdin restic
    /// reports zero processed bytes; `data_added` is the usable count then.
    pub fn from_summary(summary: &SummaryEvent) -> Self {
        let total_bytes_processed =
            if summary.total_bytes_processed == 0 && summary.data_added > 0 {
                summary.data_added
            } else {
                summary.total_bytes_processed
            };
        Self {
            files_new: summary.files_new,
            files_changed: summary.files_changed,
            files_unmodified: summary.files_unmodified,
            dirs_new: summary.dirs_new,
            dirs_changed: summary.dirs_changed,
            dirs_unmodified: summary.dirs_unmodified,
            total_files_processed: summary.total_files_processed,
            total_bytes_processed,
            total_duration: summary.total_duration,
            snapshot_id: summary.snapshot_id.clone(),
        }
    }
}

/// One row of the final report
#[derive(Debug, Clone, Default, Serialize)]
pub struct BackupRecord {
    pub hostname: String,
    pub name: String,
    pub subname: String,
    pub backup_type: String,
    /// Present iff the restic invocation reported a summary
    pub stats: Option<BackupStats>,
    pub errors: Vec<String>,
}

impl BackupRecord {
    /// Record for one driver invocation
    pub fn new(
        name: impl Into<String>,
        subname: impl Into<String>,
        backup_type: impl Into<String>,
        stats: Option<BackupStats>,
        errors: Vec<String>,
    ) -> Self {
        Self {
            hostname: String::new(),
            name: name.into(),
            subname: subname.into(),
            backup_type: backup_type.into(),
            stats,
            errors,
        }
    }

    /// Hostname-only marker row that precedes a host's driver records
    pub fn host_marker(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Self::default()
        }
    }

    /// Stat-less record announcing a composite driver (compose, wordpress)
    pub fn announcement(
        name: impl Into<String>,
        subname: impl Into<String>,
        backup_type: impl Into<String>,
    ) -> Self {
        Self::new(name, subname, backup_type, None, Vec::new())
    }
}

/// Append-only record sequence for one host
#[derive(Debug, Clone, Default)]
pub struct HostResults {
    pub hostname: String,
    records: Vec<BackupRecord>,
}

impl HostResults {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: BackupRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[BackupRecord] {
        &self.records
    }
}

/// Records for a whole run, host by host in processing order
#[derive(Debug, Clone, Default)]
pub struct RunResults {
    hosts: Vec<HostResults>,
}

impl RunResults {
    pub fn push(&mut self, host: HostResults) {
        self.hosts.push(host);
    }

    pub fn hosts(&self) -> &[HostResults] {
        &self.hosts
    }

    /// All records in report order
    pub fn records(&self) -> impl Iterator<Item = &BackupRecord> {
        self.hosts.iter().flat_map(|h| h.records.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_has_hostname_and_nothing_else() {
        let marker = BackupRecord::host_marker("web1");
        assert_eq!(marker.hostname, "web1");
        assert!(marker.name.is_empty());
        assert!(marker.stats.is_none());
        assert!(marker.errors.is_empty());
    }

    #[test]
    fn run_results_iterate_in_push_order() {
        let mut a = HostResults::new("a");
        a.push(BackupRecord::host_marker("a"));
        a.push(BackupRecord::announcement("grp", "", "docker-compose"));
        let mut b = HostResults::new("b");
        b.push(BackupRecord::host_marker("b"));

        let mut run = RunResults::default();
        run.push(a);
        run.push(b);

        let hostnames: Vec<&str> = run.records().map(|r| r.hostname.as_str()).collect();
        assert_eq!(hostnames, ["a", "", "b"]);
    }
}
