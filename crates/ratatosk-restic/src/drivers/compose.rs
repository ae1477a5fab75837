//! Docker Compose stack backups
//!
//! The stack is stopped for the duration of the backup so volumes are
//! quiescent, then restarted even when a backup step fails mid-way. Named
//! volumes are read straight out of /var/lib/docker/volumes; mounting them
//! into a helper container would be cleaner but doubles the moving parts.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use super::{files, DriverCtx};
use crate::record::{BackupRecord, HostResults};

/// The subset of a compose file we care about
#[derive(Debug, Deserialize)]
struct ComposeFile {
    #[serde(default)]
    volumes: Option<serde_yaml_ng::Mapping>,
}

/// Compose prefixes named volumes with the stack directory's basename
pub(crate) fn volume_name(stack_dir: &str, volume: &str) -> String {
    let basename = stack_dir.trim_end_matches('/').rsplit('/').next().unwrap_or(stack_dir);
    format!("{basename}_{volume}")
}

pub(crate) fn stop_command(stack_dir: &str) -> String {
    format!("cd {stack_dir}; docker-compose stop")
}

pub(crate) fn start_command(stack_dir: &str) -> String {
    format!("cd {stack_dir}; docker-compose start")
}

pub async fn run(
    ctx: &DriverCtx<'_>,
    stack_dir: &str,
    group_name: &str,
    results: &mut HostResults,
) -> Result<()> {
    info!(host = %ctx.session.hostname(), stack = stack_dir, "backing up docker-compose stack");
    results.push(BackupRecord::announcement(group_name, "", "docker-compose"));

    ctx.session
        .run(&[&stop_command(stack_dir)])
        .await
        .context("stopping compose stack")?;

    let outcome = backup_stack(ctx, stack_dir, group_name, results).await;

    // A failed backup step must not leave the stack stopped
    let restarted = ctx
        .session
        .run(&[&start_command(stack_dir)])
        .await
        .map(|_| ())
        .context("starting compose stack");
    outcome.and(restarted)
}

/// Stack directory plus every named volume the compose file declares
async fn backup_stack(
    ctx: &DriverCtx<'_>,
    stack_dir: &str,
    group_name: &str,
    results: &mut HostResults,
) -> Result<()> {
    // Stack directory itself (compose file, bind mounts, .env)
    files::run(
        ctx,
        &[stack_dir.to_string()],
        "",
        stack_dir,
        &[group_name.to_string()],
        "files",
        results,
    )
    .await?;

    // Named volumes, discovered from the compose file
    match read_compose_file(ctx, stack_dir).await {
        Ok(compose) => {
            for volume in compose.volumes.iter().flat_map(|m| m.keys()) {
                let Some(volume) = volume.as_str() else { continue };
                let volume_name = volume_name(stack_dir, volume);
                info!(volume = %volume_name, "backing up named volume");
                let src = format!("/var/lib/docker/volumes/{volume_name}");
                files::run(
                    ctx,
                    &[src],
                    "",
                    &volume_name,
                    &[group_name.to_string(), format!("Volume {volume_name}")],
                    "Volume",
                    results,
                )
                .await?;
            }
        }
        Err(err) => warn!(stack = stack_dir, "cannot read compose file: {err:#}"),
    }
    Ok(())
}

async fn read_compose_file(ctx: &DriverCtx<'_>, stack_dir: &str) -> Result<ComposeFile> {
    let mut path = format!("{stack_dir}/docker-compose.yaml");
    if !ctx.session.file_exists(&path).await? {
        path = format!("{stack_dir}/docker-compose.yml");
    }
    if !ctx.session.file_exists(&path).await? {
        anyhow::bail!("no docker-compose.yaml in {stack_dir}");
    }
    let content = ctx.session.read_file(&path).await?;
    serde_yaml_ng::from_str(&content).with_context(|| format!("parsing {path}"))
}
