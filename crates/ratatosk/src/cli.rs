//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use ratatosk_core::config::DEFAULT_ETC_DIR;

/// Ratatosk - per-host restic backups over multiplexed SSH tunnels
#[derive(Parser, Debug)]
#[command(name = "ratatosk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory with backup configurations
    #[arg(long, global = true, default_value = DEFAULT_ETC_DIR)]
    pub etcdir: Utf8PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Back up all hosts (or a filtered subset) and report the result
    Backup(BackupArgs),

    /// Check repository integrity per host
    Check(FilterArgs),

    /// Initialize one host's repository
    Init(HostArgs),

    /// List the files in a snapshot
    Ls(LsArgs),

    /// Forget and prune old snapshots per host
    Prune(PruneArgs),

    /// Enroll a host: provision keys, tunnel config and the password file
    Setup(SetupArgs),

    /// Show snapshots per host
    Snapshots(FilterArgs),

    /// Show repository statistics per host
    Stats(FilterArgs),

    /// Remove stale repository locks per host
    Unlock(FilterArgs),
}

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Only back up these hosts (comma-separated)
    #[arg(short = 'H', long)]
    pub hostname: Option<String>,

    /// SSH port for hosts without one configured
    #[arg(short, long, default_value_t = 22)]
    pub port: u16,

    /// Email the report to this address (repeatable)
    #[arg(long)]
    pub email: Vec<String>,
}

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Only these hosts (comma-separated)
    #[arg(short = 'H', long)]
    pub hostname: Option<String>,
}

#[derive(Args, Debug)]
pub struct HostArgs {
    /// SSH hostname
    #[arg(short = 'H', long)]
    pub hostname: String,
}

#[derive(Args, Debug)]
pub struct LsArgs {
    /// SSH hostname
    #[arg(short = 'H', long)]
    pub hostname: String,

    /// Restic snapshot id
    #[arg(long)]
    pub id: String,
}

#[derive(Args, Debug)]
pub struct PruneArgs {
    /// Only these hosts (comma-separated)
    #[arg(short = 'H', long)]
    pub hostname: Option<String>,

    /// Daily snapshots to keep
    #[arg(long, default_value_t = 365)]
    pub keep_daily: u32,
}

#[derive(Args, Debug)]
pub struct SetupArgs {
    /// SSH hostname
    #[arg(short = 'H', long)]
    pub hostname: String,

    /// SSH port
    #[arg(short, long, default_value_t = 22)]
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_accepts_filter_port_and_repeated_email() {
        let cli = Cli::try_parse_from([
            "ratatosk", "backup", "-H", "a,b", "-p", "2222", "--email", "x@example.com",
            "--email", "y@example.com",
        ])
        .unwrap();
        match cli.command {
            Commands::Backup(args) => {
                assert_eq!(args.hostname.as_deref(), Some("a,b"));
                assert_eq!(args.port, 2222);
                assert_eq!(args.email, ["x@example.com", "y@example.com"]);
            }
            other => panic!("expected backup, got {other:?}"),
        }
    }

    #[test]
    fn ls_requires_hostname_and_id() {
        assert!(Cli::try_parse_from(["ratatosk", "ls", "-H", "web1"]).is_err());
        let cli =
            Cli::try_parse_from(["ratatosk", "ls", "-H", "web1", "--id", "ab12cd"]).unwrap();
        match cli.command {
            Commands::Ls(args) => {
                assert_eq!(args.hostname, "web1");
                assert_eq!(args.id, "ab12cd");
            }
            other => panic!("expected ls, got {other:?}"),
        }
    }

    #[test]
    fn init_requires_hostname() {
        assert!(Cli::try_parse_from(["ratatosk", "init"]).is_err());
        assert!(Cli::try_parse_from(["ratatosk", "init", "-H", "web1"]).is_ok());
    }

    #[test]
    fn etcdir_defaults_and_overrides() {
        let cli = Cli::try_parse_from(["ratatosk", "snapshots"]).unwrap();
        assert_eq!(cli.etcdir, DEFAULT_ETC_DIR);

        let cli =
            Cli::try_parse_from(["ratatosk", "--etcdir", "/tmp/etc", "snapshots"]).unwrap();
        assert_eq!(cli.etcdir, "/tmp/etc");
    }

    #[test]
    fn prune_keep_daily_defaults_to_a_year() {
        let cli = Cli::try_parse_from(["ratatosk", "prune"]).unwrap();
        match cli.command {
            Commands::Prune(args) => assert_eq!(args.keep_daily, 365),
            other => panic!("expected prune, got {other:?}"),
        }
    }
}
