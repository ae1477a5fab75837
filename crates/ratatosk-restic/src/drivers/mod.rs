//! Per-source backup drivers
//!
//! Each driver shells restic (and its dump helpers) through the host's SSH
//! session, folds the event stream, and appends exactly one top-level
//! record. Composite drivers (compose, wordpress, osticket) additionally
//! append records for their sub-backups.

use anyhow::{Context, Result};
use ratatosk_core::{GlobalConfig, SourceEntry, SourceSpec};
use ratatosk_ssh::SshSession;
use tracing::warn;

use crate::events::{parse_line, EventFold, ProgressSink};
use crate::record::{BackupStats, HostResults};

pub mod compose;
pub mod files;
pub mod mysql;
pub mod osticket;
pub mod psql;
pub mod wordpress;

/// Remote path of the restic password file for the duration of one host run
pub const REMOTE_PASSWORD_FILE: &str = "/tmp/restic_password.txt";

/// Remote path of the `--files-from` list for multi-path file backups
pub const BACKUP_LIST_FILE: &str = "/tmp/backup_list";

/// Everything a driver needs for one host
pub struct DriverCtx<'a> {
    pub global: &'a GlobalConfig,
    pub session: &'a SshSession,
    pub progress: &'a dyn ProgressSink,
}

impl DriverCtx<'_> {
    /// Repository URI the remote restic dials through the reverse tunnel
    pub fn repo(&self) -> String {
        self.global.sftp_repo_for(self.session.hostname())
    }
}

/// Run one configured source. Unknown types are logged and skipped; prior
/// and subsequent drivers are unaffected.
pub async fn dispatch(
    ctx: &DriverCtx<'_>,
    group_name: &str,
    entry: &SourceEntry,
    results: &mut HostResults,
) -> Result<()> {
    match &entry.spec {
        SourceSpec::Files { src } => {
            files::run(ctx, src, group_name, &entry.name, &[], "files", results).await
        }
        SourceSpec::Mysql { src } => mysql::run(ctx, src, group_name, &entry.name, results).await,
        SourceSpec::Psql { src } => psql::run(ctx, src, group_name, &entry.name, results).await,
        SourceSpec::DockerCompose { src } => {
            compose::run(ctx, src, group_name, results).await
        }
        SourceSpec::Wordpress { src } => {
            wordpress::run(ctx, src, group_name, results).await
        }
        SourceSpec::Osticket { src } => {
            osticket::run(ctx, src, group_name, &entry.name, results).await
        }
        SourceSpec::Unknown { kind } => {
            warn!(
                host = %ctx.session.hostname(),
                group = group_name,
                "unknown backup source type `{kind}`, skipping"
            );
            Ok(())
        }
    }
}

/// Run a remote command and fold its restic event stream.
pub(crate) async fn collect_events(
    ctx: &DriverCtx<'_>,
    cmd: &[&str],
) -> Result<(Option<BackupStats>, Vec<String>)> {
    let mut fold = EventFold::new();
    ctx.session
        .run_json_lines(cmd, |line| {
            if let Some(event) = parse_line(line) {
                fold.push(event, ctx.progress);
            }
        })
        .await
        .context("streaming restic output failed")?;
    ctx.progress.clear();
    Ok(fold.finish())
}

/// `php -r` one-liner that prints an application's database settings as
/// JSON. `constants` maps our JSON keys to the PHP constant names defined by
/// the application's config file.
pub(crate) fn php_credentials_cmd(config_file: &str, constants: &[(&str, &str)]) -> String {
    let pairs: Vec<String> = constants
        .iter()
        .map(|(key, constant)| format!("\"{key}\"=>{constant}, "))
        .collect();
    format!(
        "'include(\"{config_file}\"); $a=array({}); print(json_encode($a)); '",
        pairs.join("")
    )
}
