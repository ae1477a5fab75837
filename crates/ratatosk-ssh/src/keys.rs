//! Local and remote SSH key provisioning
//!
//! The remote restic process authenticates back to us through the reverse
//! tunnel, so each host's public key must end up in our authorized_keys and
//! our host key in its known_hosts.

use anyhow::{bail, Context, Result};
use ratatosk_core::get_home_dir;
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Local .ssh directory of the running user
pub fn local_ssh_dir() -> Result<PathBuf> {
    Ok(get_home_dir()?.join(".ssh"))
}

/// Generate a local identity if the pair is missing.
///
/// This also creates the .ssh directory when it does not exist.
pub async fn ensure_local_keypair(ssh_dir: &Path, keyname: &str) -> Result<()> {
    let priv_key = ssh_dir.join(keyname);
    let pub_key = ssh_dir.join(format!("{keyname}.pub"));
    if priv_key.exists() && pub_key.exists() {
        return Ok(());
    }

    fs::create_dir_all(ssh_dir)?;
    fs::set_permissions(ssh_dir, fs::Permissions::from_mode(0o700))?;

    info!("creating local ssh key {keyname} with no passphrase");
    let output = Command::new("ssh-keygen")
        .args(["-f", &priv_key.display().to_string(), "-N", ""])
        .output()
        .await
        .context("failed to run ssh-keygen")?;
    if !output.status.success() {
        bail!(
            "ssh-keygen failed:\n{}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

/// Add a public key to authorized_keys unless it is already there.
///
/// Returns true when the key was appended.
pub fn add_authorized_key(ssh_dir: &Path, new_key: &str) -> Result<bool> {
    let new_key = new_key.trim();
    let file = ssh_dir.join("authorized_keys");

    if !file.exists() {
        fs::create_dir_all(ssh_dir)?;
        fs::write(&file, format!("{new_key}\n"))?;
        fs::set_permissions(&file, fs::Permissions::from_mode(0o600))?;
        return Ok(true);
    }

    let content = fs::read_to_string(&file)?;
    if content.lines().any(|line| line.trim() == new_key) {
        debug!("authorized_keys already contains the key");
        return Ok(false);
    }

    let mut f = fs::OpenOptions::new().append(true).open(&file)?;
    writeln!(f, "{new_key}")?;
    Ok(true)
}
