//! PostgreSQL dump backups
//!
//! pg_dump reads the password from ~/.pgpass, so that file is written first
//! (mode 600, or pg_dump refuses it). The dump itself is piped into restic
//! on stdin like the mysql driver.

use anyhow::Result;
use ratatosk_core::DbParams;
use tracing::info;

use super::{collect_events, DriverCtx, REMOTE_PASSWORD_FILE};
use crate::command::ResticCmd;
use crate::record::{BackupRecord, HostResults};

const SCRIPT_FILE: &str = "/tmp/psql_backup.sh";

/// `hostname:port:database:username:password`
pub(crate) fn pgpass_line(db: &DbParams) -> String {
    format!(
        "{}:*:{}:{}:{}",
        db.host.as_deref().unwrap_or("localhost"),
        db.database,
        db.username,
        db.password
    )
}

pub(crate) fn dump_script(ctx: &DriverCtx<'_>, db: &DbParams) -> String {
    let restic = ResticCmd::new(&ctx.global.restic_remote, ctx.repo(), REMOTE_PASSWORD_FILE)
        .subcommand("backup")
        .arg("--stdin")
        .arg("--stdin-filename")
        .arg(format!("{}.dump", db.database))
        .json();
    format!(
        "#!/bin/bash\npg_dump -h {} -U {} {} | {}\n",
        db.host.as_deref().unwrap_or("localhost"),
        db.username,
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
    info!(host = %ctx.session.hostname(), database = %db.database, "backing up postgresql database");

    let pgpass = format!("/home/{}/.pgpass", ctx.global.username);
    ctx.session
        .write_file(&pgpass, &pgpass_line(db), Some("600"))
        .await?;

    ctx.session
        .write_file(SCRIPT_FILE, &dump_script(ctx, db), Some("700"))
        .await?;

    let (stats, errors) = collect_events(ctx, &[SCRIPT_FILE]).await?;
    results.push(BackupRecord::new(name, subname, "psql", stats, errors));
    Ok(())
}
