//! restic command construction and local execution

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, warn};

/// Builder for a restic invocation.
///
/// Renders to an argv for local execution, or to a shell pipeline tail for
/// the dump drivers that feed restic on stdin through a remote script.
#[derive(Debug, Clone)]
pub struct ResticCmd {
    binary: String,
    repo: String,
    password_file: String,
    subcommand: String,
    args: Vec<String>,
    json: bool,
}

impl ResticCmd {
    pub fn new(
        binary: impl Into<String>,
        repo: impl Into<String>,
        password_file: impl Into<String>,
    ) -> Self {
        Self {
            binary: binary.into(),
            repo: repo.into(),
            password_file: password_file.into(),
            subcommand: String::new(),
            args: Vec::new(),
            json: false,
        }
    }

    pub fn subcommand(mut self, sub: impl Into<String>) -> Self {
        self.subcommand = sub.into();
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.args.push("--tag".to_string());
        self.args.push(format!("\"{tag}\""));
        self
    }

    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }

    /// Render the full argv
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![
            self.binary.clone(),
            "-r".to_string(),
            self.repo.clone(),
            "-p".to_string(),
            self.password_file.clone(),
        ];
        if !self.subcommand.is_empty() {
            argv.push(self.subcommand.clone());
        }
        argv.extend(self.args.iter().cloned());
        if self.json {
            argv.push("--json".to_string());
        }
        argv
    }

    /// Render as a single shell command line, for remote scripts
    pub fn shell(&self) -> String {
        self.argv().join(" ")
    }
}

/// Run a local command to completion, returning success and the combined
/// stdout/stderr text. Failure is reported, not raised; callers print the
/// text either way.
pub async fn run_local(argv: &[String]) -> Result<(bool, String)> {
    debug!("{}", argv.join(" "));
    let output = Command::new(&argv[0])
        .args(&argv[1..])
        .output()
        .await
        .with_context(|| format!("failed to run {}", argv[0]))?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.stderr.is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&String::from_utf8_lossy(&output.stderr));
    }
    if !output.status.success() {
        warn!(command = %argv.join(" "), %output.status, "command exited non-zero");
    }
    Ok((output.status.success(), text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_orders_repo_password_subcommand_flags() {
        let cmd = ResticCmd::new("/opt/restic/restic", "sftp:127.0.0.1:/backup/web1", "/tmp/pw")
            .subcommand("backup")
            .arg("--one-file-system")
            .json()
            .arg("/var/www");
        assert_eq!(
            cmd.argv(),
            [
                "/opt/restic/restic",
                "-r",
                "sftp:127.0.0.1:/backup/web1",
                "-p",
                "/tmp/pw",
                "backup",
                "--one-file-system",
                "/var/www",
                "--json"
            ]
        );
    }

    #[test]
    fn tags_are_quoted_for_the_remote_shell() {
        let cmd = ResticCmd::new("restic", "/backup/web1", "/tmp/pw")
            .subcommand("backup")
            .tag("blog stack");
        let shell = cmd.shell();
        assert!(shell.ends_with("backup --tag \"blog stack\""));
    }

    #[test]
    fn no_subcommand_still_renders() {
        let cmd = ResticCmd::new("restic", "/backup/x", "/etc/pw");
        assert_eq!(cmd.argv(), ["restic", "-r", "/backup/x", "-p", "/etc/pw"]);
    }
}
