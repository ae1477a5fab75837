//! Check command: repository integrity per host

use anyhow::Result;
use ratatosk_core::Config;
use ratatosk_restic::run_local;

use super::{load_hosts, local_restic};
use crate::cli::FilterArgs;
use crate::output;

pub async fn run(args: FilterArgs, config: &Config) -> Result<()> {
    let store = load_hosts(config)?;
    for host in store.iter(args.hostname.as_deref()) {
        output::header(&format!("Check repo {}", host.name));
        let cmd = local_restic(config, &host.name)
            .subcommand("check")
            .arg("--no-lock")
            .json();
        let (_ok, text) = run_local(&cmd.argv()).await?;
        println!("{text}");
    }
    Ok(())
}
