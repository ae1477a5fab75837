//! Multiplexed SSH session with a reverse tunnel

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// A multiplexed SSH connection to one host.
///
/// `connect` starts a control master with a reverse port forward; every
/// subsequent `ssh`/`scp` invocation reuses it through the control socket,
/// so only the first connection pays for the handshake.
pub struct SshSession {
    hostname: String,
    port: u16,
    username: String,
    control_path: PathBuf,
    master: Option<Child>,
}

impl SshSession {
    pub fn new(hostname: impl Into<String>, port: u16, username: impl Into<String>) -> Self {
        let hostname = hostname.into();
        let username = username.into();
        let control_path =
            PathBuf::from(format!("/tmp/ratatosk-master-{username}@{hostname}:{port}"));
        Self {
            hostname,
            port,
            username,
            control_path,
            master: None,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn control_path(&self) -> &Path {
        &self.control_path
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.username, self.hostname)
    }

    /// Argv for a remote command through the control socket. Pure; the
    /// command parts are passed to the remote shell as-is.
    pub fn ssh_argv(&self, cmd: &[&str]) -> Vec<String> {
        let mut argv = vec![
            "ssh".to_string(),
            "-6".to_string(),
            "-S".to_string(),
            self.control_path.display().to_string(),
            "-p".to_string(),
            self.port.to_string(),
            self.destination(),
        ];
        argv.extend(cmd.iter().map(|s| s.to_string()));
        argv
    }

    /// Argv for copying a local file to the remote host
    pub fn scp_argv(&self, local: &Path, remote: &str) -> Vec<String> {
        vec![
            "scp".to_string(),
            "-6".to_string(),
            "-o".to_string(),
            format!("ControlPath={}", self.control_path.display()),
            "-P".to_string(),
            self.port.to_string(),
            local.display().to_string(),
            format!("{}:{}", self.destination(), remote),
        ]
    }

    /// Reuse a live master at the control path. A socket whose master does
    /// not answer `-O check` is left over from a crashed run; it is removed
    /// so a fresh master can bind the path.
    async fn reuse_or_clear(&self) -> Result<bool> {
        if !self.control_path.exists() {
            return Ok(false);
        }
        let check = Command::new("ssh")
            .args([
                "-S",
                &self.control_path.display().to_string(),
                "-O",
                "check",
                &self.hostname,
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if matches!(check, Ok(status) if status.success()) {
            debug!(host = %self.hostname, "control master already up");
            return Ok(true);
        }
        warn!(host = %self.hostname, "removing stale control socket");
        std::fs::remove_file(&self.control_path)?;
        Ok(false)
    }

    /// Open the control master with a reverse port forward back to our SSH
    /// endpoint. Idempotent: a live master is reused, a stale socket is
    /// cleared first.
    pub async fn connect(&mut self, tunnel_port: u16) -> Result<()> {
        if self.master.is_some() {
            debug!(host = %self.hostname, "control master already up");
            return Ok(());
        }
        if self.reuse_or_clear().await? {
            return Ok(());
        }

        let argv = [
            "-6",
            "-M",
            "-N",
            "-S",
            &self.control_path.display().to_string(),
            "-p",
            &self.port.to_string(),
            "-R",
            &format!("{tunnel_port}:[::1]:22"),
            &self.destination(),
        ]
        .map(str::to_string);
        debug!("ssh {}", argv.join(" "));

        let child = Command::new("ssh")
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("failed to spawn ssh control master")?;
        self.master = Some(child);

        // The socket appears once the master has authenticated
        for _ in 0..100 {
            if self.control_path.exists() {
                return Ok(());
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        bail!("ssh control socket never appeared at {}", self.control_path.display());
    }

    /// Tear down the control master. Idempotent: without a socket this is a
    /// no-op.
    pub async fn disconnect(&mut self) -> Result<()> {
        if self.control_path.exists() {
            debug!(host = %self.hostname, "closing control master");
            let _ = Command::new("ssh")
                .args([
                    "-S",
                    &self.control_path.display().to_string(),
                    "-O",
                    "exit",
                    &self.hostname,
                ])
                .output()
                .await;
        }
        if let Some(mut child) = self.master.take() {
            let _ = child.wait().await;
        }
        Ok(())
    }

    /// Run a remote command, blocking until it finishes. Returns the
    /// combined stdout and stderr; non-zero exit turns that text into the
    /// error.
    pub async fn run(&self, cmd: &[&str]) -> Result<String> {
        let argv = self.ssh_argv(cmd);
        debug!("{}", argv.join(" "));

        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .output()
            .await
            .with_context(|| format!("failed to run {}", argv.join(" ")))?;

        let text = combined_text(&output.stdout, &output.stderr);
        if !output.status.success() {
            bail!("remote command `{}` failed:\n{}", cmd.join(" "), text.trim());
        }
        Ok(text)
    }

    /// Run a remote command and stream its stdout line by line into the
    /// callback.
    ///
    /// The exit status is deliberately not an error: a failed restic run
    /// still produced the events we already consumed, and the caller's
    /// record simply ends up without a summary. Stderr lines are fed to the
    /// callback after stdout is exhausted.
    pub async fn run_json_lines<F>(&self, cmd: &[&str], mut on_line: F) -> Result<()>
    where
        F: FnMut(&str),
    {
        let argv = self.ssh_argv(cmd);
        debug!("{}", argv.join(" "));

        let mut child = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn {}", argv.join(" ")))?;

        let stderr = child.stderr.take().map(|err| {
            tokio::spawn(async move {
                let mut lines = BufReader::new(err).lines();
                let mut collected = Vec::new();
                while let Ok(Some(line)) = lines.next_line().await {
                    collected.push(line);
                }
                collected
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                on_line(&line);
            }
        }

        let status = child.wait().await?;
        if let Some(handle) = stderr {
            for line in handle.await.unwrap_or_default() {
                on_line(&line);
            }
        }
        if !status.success() {
            warn!(host = %self.hostname, %status, "remote command exited non-zero");
        }
        Ok(())
    }

    /// Copy a local file to the remote host, optionally chmod-ing it there
    pub async fn copy(&self, local: &Path, remote: &str, mode: Option<&str>) -> Result<()> {
        let argv = self.scp_argv(local, remote);
        debug!("{}", argv.join(" "));

        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .output()
            .await
            .context("failed to run scp")?;
        if !output.status.success() {
            bail!(
                "scp to {}:{} failed:\n{}",
                self.hostname,
                remote,
                combined_text(&output.stdout, &output.stderr).trim()
            );
        }

        if let Some(mode) = mode {
            self.chmod(remote, mode).await?;
        }
        Ok(())
    }

    /// Write a string as a remote file by staging it locally first
    pub async fn write_file(&self, remote: &str, data: &str, mode: Option<&str>) -> Result<()> {
        let mut staged = tempfile::NamedTempFile::new()?;
        staged.write_all(data.as_bytes())?;
        staged.flush()?;
        self.copy(staged.path(), remote, mode).await
    }

    /// Read a remote file into a string
    pub async fn read_file(&self, remote: &str) -> Result<String> {
        self.run(&["cat", remote]).await
    }

    /// Check whether a remote path exists as a regular file
    pub async fn file_exists(&self, remote: &str) -> Result<bool> {
        let probe = format!("test -f {remote} && echo exists_yes || echo exists_no");
        let output = self.run(&[&probe]).await?;
        Ok(output.contains("exists_yes"))
    }

    pub async fn chmod(&self, remote: &str, mode: &str) -> Result<()> {
        self.run(&["chmod", mode, remote]).await.map(|_| ())
    }

    pub async fn remove(&self, remote: &str) -> Result<()> {
        self.run(&["rm", "-f", remote]).await.map(|_| ())
    }
}

fn combined_text(stdout: &[u8], stderr: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(stdout).into_owned();
    if !stderr.is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&String::from_utf8_lossy(stderr));
    }
    text
}
