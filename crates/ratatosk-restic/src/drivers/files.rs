//! Plain file backups
//!
//! No compression: restic's dedup works best on raw content, and the stacks
//! we back up are mostly already-compressed media anyway.

use anyhow::Result;
use tracing::info;

use super::{collect_events, DriverCtx, BACKUP_LIST_FILE, REMOTE_PASSWORD_FILE};
use crate::command::ResticCmd;
use crate::record::{BackupRecord, HostResults};

/// Back up one or more remote paths.
///
/// Multiple paths are staged as a `--files-from` list on the remote host;
/// a single path is passed directly.
pub async fn run(
    ctx: &DriverCtx<'_>,
    paths: &[String],
    name: &str,
    subname: &str,
    tags: &[String],
    backup_type: &str,
    results: &mut HostResults,
) -> Result<()> {
    info!(host = %ctx.session.hostname(), ?paths, "backing up files");

    if paths.len() > 1 {
        ctx.session
            .write_file(BACKUP_LIST_FILE, &paths.join("\n"), None)
            .await?;
    }

    let mut cmd = ResticCmd::new(&ctx.global.restic_remote, ctx.repo(), REMOTE_PASSWORD_FILE)
        .subcommand("backup")
        .arg("--one-file-system")
        .json();
    if paths.len() > 1 {
        cmd = cmd.arg("--files-from").arg(BACKUP_LIST_FILE);
    } else if let Some(path) = paths.first() {
        cmd = cmd.arg(path);
    }
    for tag in tags {
        cmd = cmd.tag(tag);
    }

    let argv = cmd.argv();
    let argv_refs: Vec<&str> = argv.iter().map(String::as_str).collect();
    let (stats, errors) = collect_events(ctx, &argv_refs).await?;

    results.push(BackupRecord::new(name, subname, backup_type, stats, errors));
    Ok(())
}
