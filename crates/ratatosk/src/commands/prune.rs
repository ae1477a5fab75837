//! Prune command: forget old snapshots and prune unreferenced data

use anyhow::Result;
use ratatosk_core::Config;
use ratatosk_restic::run_local;
use serde::Deserialize;

use super::{load_hosts, local_restic};
use crate::cli::PruneArgs;
use crate::output;

/// First JSON line of `restic forget --json`: one group per path set
#[derive(Debug, Deserialize)]
struct ForgetGroup {
    #[serde(default)]
    paths: Vec<String>,
    #[serde(default)]
    keep: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    remove: Option<Vec<serde_json::Value>>,
}

fn parse_forget_summary(first_line: &str) -> Option<ForgetGroup> {
    let mut groups: Vec<ForgetGroup> = serde_json::from_str(first_line).ok()?;
    if groups.is_empty() {
        None
    } else {
        Some(groups.swap_remove(0))
    }
}

pub async fn run(args: PruneArgs, config: &Config) -> Result<()> {
    let store = load_hosts(config)?;
    for host in store.iter(args.hostname.as_deref()) {
        output::header(&format!("Pruning repo {}", host.name));
        let cmd = local_restic(config, &host.name)
            .subcommand("forget")
            .arg("--prune")
            .arg("--keep-daily")
            .arg(args.keep_daily.to_string())
            .json();
        let (_ok, text) = run_local(&cmd.argv()).await?;

        let mut lines = text.lines();
        match lines.next().and_then(parse_forget_summary) {
            Some(group) => {
                output::kv(
                    "kept",
                    &group.keep.map(|k| k.len()).unwrap_or_default().to_string(),
                );
                output::kv(
                    "removed",
                    &group.remove.map(|r| r.len()).unwrap_or_default().to_string(),
                );
                output::kv("paths", &group.paths.join(", "));
            }
            None => output::warning("no forget summary in restic output"),
        }
        for line in lines {
            println!("{line}");
        }
    }
    Ok(())
}
