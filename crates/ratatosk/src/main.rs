//! Ratatosk CLI - per-host restic backups over multiplexed SSH tunnels
//!
//! This is the main entry point for the Ratatosk command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::{bail, Result};
use clap::Parser;
use ratatosk_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    // Config errors are fatal to the whole run
    let config = Config::load(&cli.etcdir)?;

    if let Some(required) = &config.global.require_user {
        let current = std::env::var("USER").unwrap_or_default();
        if &current != required {
            bail!("this program must be executed as user '{required}' (running as '{current}')");
        }
    }

    match cli.command {
        Commands::Backup(args) => commands::backup::run(args, &config, cli.quiet).await,
        Commands::Check(args) => commands::check::run(args, &config).await,
        Commands::Init(args) => commands::init::run(args, &config).await,
        Commands::Ls(args) => commands::ls::run(args, &config).await,
        Commands::Prune(args) => commands::prune::run(args, &config).await,
        Commands::Setup(args) => commands::setup::run(args, &config).await,
        Commands::Snapshots(args) => commands::snapshots::run(args, &config).await,
        Commands::Stats(args) => commands::stats::run(args, &config).await,
        Commands::Unlock(args) => commands::unlock::run(args, &config).await,
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
