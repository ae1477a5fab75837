//! WordPress site backups: all files plus the database, enough for a full
//! recovery. Database credentials come from wp-config.php via `php -r`.

use anyhow::{Context, Result};
use ratatosk_core::DbParams;
use tracing::info;

use super::{files, mysql, php_credentials_cmd, DriverCtx};
use crate::record::{BackupRecord, HostResults};

const WP_CONSTANTS: &[(&str, &str)] = &[
    ("host", "DB_HOST"),
    ("database", "DB_NAME"),
    ("username", "DB_USER"),
    ("password", "DB_PASSWORD"),
];

pub async fn run(
    ctx: &DriverCtx<'_>,
    site_dir: &str,
    group_name: &str,
    results: &mut HostResults,
) -> Result<()> {
    info!(host = %ctx.session.hostname(), site = site_dir, "backing up wordpress site");
    results.push(BackupRecord::announcement("Wordpress site", group_name, "wordpress"));

    let probe = php_credentials_cmd(&format!("{site_dir}/wp-config.php"), WP_CONSTANTS);
    let output = ctx
        .session
        .run(&["php", "-r", &probe])
        .await
        .context("reading wp-config.php")?;
    let db: DbParams =
        serde_json::from_str(output.trim()).context("parsing wordpress database settings")?;

    files::run(ctx, &[site_dir.to_string()], "", "", &[], "files", results).await?;
    mysql::run(ctx, &db, "", "", results).await?;
    Ok(())
}
