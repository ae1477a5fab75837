//! osTicket site backups: files plus the mysql database. Credentials come
//! from include/ost-config.php via `php -r`.

use anyhow::{Context, Result};
use ratatosk_core::DbParams;
use tracing::info;

use super::{files, mysql, php_credentials_cmd, DriverCtx};
use crate::record::HostResults;

const OST_CONSTANTS: &[(&str, &str)] = &[
    ("host", "DBHOST"),
    ("database", "DBNAME"),
    ("username", "DBUSER"),
    ("password", "DBPASS"),
];

pub async fn run(
    ctx: &DriverCtx<'_>,
    site_dir: &str,
    group_name: &str,
    subname: &str,
    results: &mut HostResults,
) -> Result<()> {
    info!(host = %ctx.session.hostname(), site = site_dir, "backing up osticket site");

    let probe = php_credentials_cmd(&format!("{site_dir}/include/ost-config.php"), OST_CONSTANTS);
    let output = ctx
        .session
        .run(&["php", "-r", &probe])
        .await
        .context("reading ost-config.php")?;
    let db: DbParams =
        serde_json::from_str(output.trim()).context("parsing osticket database settings")?;

    files::run(
        ctx,
        &[site_dir.to_string()],
        group_name,
        subname,
        &[],
        "files",
        results,
    )
    .await?;
    mysql::run(ctx, &db, group_name, subname, results).await?;
    Ok(())
}
