//! Init command: create one host's repository

use anyhow::Result;
use ratatosk_core::Config;
use ratatosk_restic::run_local;

use super::local_restic;
use crate::cli::HostArgs;
use crate::output;

pub async fn run(args: HostArgs, config: &Config) -> Result<()> {
    output::header(&format!("Init repo {}", args.hostname));
    let cmd = local_restic(config, &args.hostname).subcommand("init");
    let (ok, text) = run_local(&cmd.argv()).await?;
    println!("{text}");
    if ok {
        output::success(&format!("repository for {} initialized", args.hostname));
    }
    Ok(())
}
