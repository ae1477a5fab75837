//! Ls command: list the files in one snapshot

use anyhow::Result;
use ratatosk_core::Config;
use ratatosk_restic::run_local;

use super::local_restic;
use crate::cli::LsArgs;

pub async fn run(args: LsArgs, config: &Config) -> Result<()> {
    let cmd = local_restic(config, &args.hostname)
        .subcommand("ls")
        .arg("-l")
        .arg(&args.id);
    let (_ok, text) = run_local(&cmd.argv()).await?;
    println!("{text}");
    Ok(())
}
