//! Setup command: enroll a host so unattended backups work afterwards

use anyhow::{ensure, Result};
use ratatosk_core::{utils, Config};
use ratatosk_restic::runner;

use crate::cli::SetupArgs;
use crate::output;

pub async fn run(args: SetupArgs, config: &Config) -> Result<()> {
    for tool in ["ssh", "scp", "ssh-keygen", "ssh-keyscan"] {
        ensure!(utils::command_exists(tool), "`{tool}` not found in PATH");
    }

    output::header(&format!("Setting up {}", args.hostname));
    runner::setup_host(&config.global, &args.hostname, args.port).await?;
    output::success(&format!("{} is ready for backups", args.hostname));
    Ok(())
}
