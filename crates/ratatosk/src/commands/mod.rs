//! CLI command implementations

pub mod backup;
pub mod check;
pub mod init;
pub mod ls;
pub mod prune;
pub mod setup;
pub mod snapshots;
pub mod stats;
pub mod unlock;

use anyhow::{Context, Result};
use ratatosk_core::{Config, HostStore};
use ratatosk_restic::ResticCmd;

/// Load the host store, requiring at least one definition
pub(crate) fn load_hosts(config: &Config) -> Result<HostStore> {
    let store = HostStore::load(&config.etc_dir)
        .with_context(|| format!("loading host definitions from {}", config.etc_dir))?;
    if store.is_empty() {
        tracing::warn!("no host definitions found in {}", config.etc_dir);
    }
    Ok(store)
}

/// restic invocation against a host's repository, from this machine
pub(crate) fn local_restic(config: &Config, hostname: &str) -> ResticCmd {
    ResticCmd::new(
        &config.global.restic_local,
        config.global.repo_for(hostname),
        config.global.password_file.as_str(),
    )
}
