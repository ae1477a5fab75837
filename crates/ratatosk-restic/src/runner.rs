//! Per-host orchestration
//!
//! Hosts run strictly sequentially: open the multiplexed session, provision
//! the remote side (keys, known_hosts, password file), run each configured
//! driver in order, clean up, disconnect. A host that blows up is logged
//! and the run moves on to the next one.

use anyhow::{Context, Result};
use ratatosk_core::{GlobalConfig, HostEntry, HostStore};
use ratatosk_ssh::{keys, SshSession};
use tracing::{error, info};

use crate::drivers::{self, DriverCtx, REMOTE_PASSWORD_FILE};
use crate::events::ProgressSink;
use crate::record::{BackupRecord, HostResults, RunResults};

/// Local key name used for the tunnel in both directions
const KEY_NAME: &str = "id_rsa";

/// Back up every host the filter admits, in store order. Per-host failures
/// are logged with their full error chain and do not abort the run; the
/// failed host keeps whatever records it produced before failing.
pub async fn backup_all(
    global: &GlobalConfig,
    store: &HostStore,
    filter: Option<&str>,
    default_port: u16,
    progress: &dyn ProgressSink,
) -> RunResults {
    let mut run = RunResults::default();
    for entry in store.iter(filter) {
        let mut results = HostResults::new(&entry.name);
        if let Err(err) = backup_host(global, entry, default_port, progress, &mut results).await {
            error!(host = %entry.name, "backup failed: {err:#}");
        }
        run.push(results);
    }
    run
}

/// Run one host's full backup into `results`
async fn backup_host(
    global: &GlobalConfig,
    entry: &HostEntry,
    default_port: u16,
    progress: &dyn ProgressSink,
    results: &mut HostResults,
) -> Result<()> {
    info!(host = %entry.name, "running backup");

    let port = entry.config.port.unwrap_or(default_port);
    let mut session = SshSession::new(&entry.name, port, &global.username);

    let outcome = async {
        provision(global, &mut session).await?;

        results.push(BackupRecord::host_marker(&entry.name));

        let ctx = DriverCtx {
            global,
            session: &session,
            progress,
        };
        for group in &entry.config.backups {
            for source in &group.sources {
                drivers::dispatch(&ctx, &group.name, source, results).await?;
            }
        }

        session.remove(REMOTE_PASSWORD_FILE).await
    }
    .await;

    // Always tear the master down, even when the backup failed
    let _ = session.disconnect().await;
    outcome
}

/// Provision the remote side of the tunnel: our key on their side, their
/// key on ours, their known_hosts pointing at the tunnel endpoint, and the
/// restic password file in /tmp.
async fn provision(global: &GlobalConfig, session: &mut SshSession) -> Result<()> {
    let ssh_dir = keys::local_ssh_dir()?;
    keys::ensure_local_keypair(&ssh_dir, KEY_NAME).await?;

    session
        .connect(global.tunnel_port)
        .await
        .context("opening ssh control master")?;

    let remote_home = format!("/home/{}", global.username);
    let remote_ssh_dir = format!("{remote_home}/.ssh");
    session.run(&["mkdir", "-p", &remote_ssh_dir]).await?;
    session.chmod(&remote_ssh_dir, "700").await?;

    // The remote host needs its own identity to dial back through the tunnel
    let remote_key = format!("{remote_ssh_dir}/{KEY_NAME}");
    if !session.file_exists(&remote_key).await? {
        info!(host = %session.hostname(), "generating keypair on remote host");
        session
            .run(&["ssh-keygen", "-N", "''", "-f", &remote_key])
            .await?;
    }

    // Remote public key into our authorized_keys, so its restic can land here
    let remote_pubkey = session.read_file(&format!("{remote_key}.pub")).await?;
    if keys::add_authorized_key(&ssh_dir, &remote_pubkey)? {
        info!(host = %session.hostname(), "authorized remote public key");
    }

    // known_hosts for the tunnel endpoint, generated on the remote side
    let keyscan = format!(
        "ssh-keyscan -p {} 127.0.0.1 > {remote_ssh_dir}/known_hosts",
        global.tunnel_port
    );
    session.run(&[&keyscan]).await?;

    // ssh client config (tunnel port and friends), then the restic password
    session
        .copy(
            global.ssh_config.as_std_path(),
            &format!("{remote_ssh_dir}/config"),
            Some("600"),
        )
        .await?;
    session
        .copy(
            global.password_file.as_std_path(),
            REMOTE_PASSWORD_FILE,
            Some("600"),
        )
        .await?;
    Ok(())
}

/// Provision a host without backing anything up. This is the `setup`
/// command: run it once when enrolling a new host, after which `backup`
/// needs no interaction.
pub async fn setup_host(global: &GlobalConfig, hostname: &str, port: u16) -> Result<()> {
    let mut session = SshSession::new(hostname, port, &global.username);
    let outcome = provision(global, &mut session).await;
    let _ = session.disconnect().await;
    outcome
}
