//! MySQL / MariaDB dump backups
//!
//! The dump is piped straight into restic on stdin through a small script
//! staged on the remote host; nothing lands on its disk. No compression,
//! which would defeat dedup between daily dumps.

use anyhow::Result;
use ratatosk_core::DbParams;
use tracing::info;

use super::{collect_events, DriverCtx, REMOTE_PASSWORD_FILE};
use crate::command::ResticCmd;
use crate::record::{BackupRecord, HostResults};

const SCRIPT_FILE: &str = "/tmp/mysql_backup.sh";

/// The remote dump-pipe script
pub(crate) fn dump_script(ctx: &DriverCtx<'_>, db: &DbParams) -> String {
    let restic = ResticCmd::new(&ctx.global.restic_remote, ctx.repo(), REMOTE_PASSWORD_FILE)
        .subcommand("backup")
        .arg("--stdin")
        .arg("--stdin-filename")
        .arg(format!("{}.mysql.dump", db.database))
        .json();
    format!(
        "#!/bin/bash\n/usr/bin/mysqldump --user={} --password={} {} | {}\n",
        db.username,
        db.password,
        db.database,
        restic.shell()
    )
}

pub async fn run(
    ctx: &DriverCtx<'_>,
    db: &DbParams,
    name: &str,
    subname: &str,
    results: &mut HostResults,
) -> Result<()> {
    info!(host = %ctx.session.hostname(), database = %db.database, "backing up mysql database");

    ctx.session
        .write_file(SCRIPT_FILE, &dump_script(ctx, db), Some("700"))
        .await?;

    let (stats, errors) = collect_events(ctx, &[SCRIPT_FILE]).await?;
    results.push(BackupRecord::new(name, subname, "mysql", stats, errors));
    Ok(())
}
