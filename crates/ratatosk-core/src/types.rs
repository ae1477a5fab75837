//! Configuration type definitions
//!
//! The global config (`ratatosk.yaml`) describes the repository destination,
//! SSH identity and report delivery. Every other YAML file in the etc
//! directory describes one host and the ordered backup groups to run on it.

use camino::Utf8PathBuf;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use serde_yaml_ng::Value;

/// Global configuration, loaded from `ratatosk.yaml`
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
    /// Base path of the restic repositories; one repository per host is
    /// created underneath it
    pub default_dest: String,

    /// Remote account used for SSH sessions and backups
    #[serde(default = "default_username")]
    pub username: String,

    /// Local restic password file, copied to the remote host for a backup
    #[serde(default = "default_password_file")]
    pub password_file: Utf8PathBuf,

    /// Path of the restic binary on this machine
    #[serde(default = "default_restic_local")]
    pub restic_local: String,

    /// Path of the restic binary on the remote hosts
    #[serde(default = "default_restic_remote")]
    pub restic_remote: String,

    /// Remote port forwarded back to our SSH endpoint
    #[serde(default = "default_tunnel_port")]
    pub tunnel_port: u16,

    /// SSH client config installed on remote hosts (sets up the tunnel port)
    #[serde(default = "default_ssh_config")]
    pub ssh_config: Utf8PathBuf,

    /// Refuse to run unless invoked as this user
    #[serde(default)]
    pub require_user: Option<String>,

    /// SMTP settings for emailed reports
    #[serde(default)]
    pub smtp: SmtpConfig,
}

impl GlobalConfig {
    /// Repository path for local restic invocations
    pub fn repo_for(&self, hostname: &str) -> String {
        format!("{}/{}", self.default_dest, hostname)
    }

    /// Repository URI used by the remote restic process, dialing back to us
    /// through the reverse tunnel
    pub fn sftp_repo_for(&self, hostname: &str) -> String {
        format!("sftp:127.0.0.1:{}/{}", self.default_dest, hostname)
    }
}

fn default_username() -> String {
    "ratatosk".to_string()
}

fn default_password_file() -> Utf8PathBuf {
    Utf8PathBuf::from("/etc/ratatosk/restic_password.txt")
}

fn default_restic_local() -> String {
    "/opt/restic/restic".to_string()
}

fn default_restic_remote() -> String {
    "/opt/restic/restic".to_string()
}

fn default_tunnel_port() -> u16 {
    44444
}

fn default_ssh_config() -> Utf8PathBuf {
    Utf8PathBuf::from("/etc/ratatosk/remote/ssh-config")
}

/// SMTP settings for emailed reports
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub from: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 25,
            from: "noreply@example.com".to_string(),
        }
    }
}

/// One host's backup definition file
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    /// Overrides the hostname derived from the file name
    #[serde(default)]
    pub hostname: Option<String>,

    /// SSH port for this host
    #[serde(default)]
    pub port: Option<u16>,

    /// Ordered list of named backup groups
    pub backups: Vec<BackupGroup>,
}

/// A named group of backup sources, run in order
#[derive(Debug, Clone, Deserialize)]
pub struct BackupGroup {
    #[serde(default)]
    pub name: String,

    #[serde(default, rename = "backup")]
    pub sources: Vec<SourceEntry>,
}

/// One typed backup source within a group
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub name: String,
    pub spec: SourceSpec,
}

/// Source-specific parameters, keyed by the `type` field.
///
/// An unrecognized `type` parses into [`SourceSpec::Unknown`] so a single
/// typo cannot fail the whole host; the dispatcher logs and skips it.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    Files { src: Vec<String> },
    Mysql { src: DbParams },
    Psql { src: DbParams },
    DockerCompose { src: String },
    Wordpress { src: String },
    Osticket { src: String },
    Unknown { kind: String },
}

impl SourceSpec {
    /// The `type` tag this source was declared with
    pub fn kind(&self) -> &str {
        match self {
            SourceSpec::Files { .. } => "files",
            SourceSpec::Mysql { .. } => "mysql",
            SourceSpec::Psql { .. } => "psql",
            SourceSpec::DockerCompose { .. } => "docker-compose",
            SourceSpec::Wordpress { .. } => "wordpress",
            SourceSpec::Osticket { .. } => "osticket",
            SourceSpec::Unknown { kind } => kind,
        }
    }
}

/// Database connection parameters for dump-based sources
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DbParams {
    #[serde(default)]
    pub host: Option<String>,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl<'de> Deserialize<'de> for SourceEntry {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        let name = value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| D::Error::custom("backup source is missing a `type` field"))?
            .to_string();

        let src = value.get("src").cloned().unwrap_or(Value::Null);
        let spec = match kind.as_str() {
            "files" => SourceSpec::Files {
                src: field(src, "files", "src")?,
            },
            "mysql" => SourceSpec::Mysql {
                src: field(src, "mysql", "src")?,
            },
            "psql" => SourceSpec::Psql {
                src: field(src, "psql", "src")?,
            },
            "docker-compose" => SourceSpec::DockerCompose {
                src: field(src, "docker-compose", "src")?,
            },
            "wordpress" => SourceSpec::Wordpress {
                src: field(src, "wordpress", "src")?,
            },
            "osticket" => SourceSpec::Osticket {
                src: field(src, "osticket", "src")?,
            },
            _ => SourceSpec::Unknown { kind },
        };

        Ok(SourceEntry { name, spec })
    }
}

fn field<'de, T, E>(value: Value, kind: &str, key: &str) -> std::result::Result<T, E>
where
    T: serde::de::DeserializeOwned,
    E: DeError,
{
    serde_yaml_ng::from_value(value)
        .map_err(|err| E::custom(format!("invalid `{key}` for {kind} source: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_entry(yaml: &str) -> SourceEntry {
        serde_yaml_ng::from_str(yaml).expect("source entry should parse")
    }

    #[test]
    fn files_source_parses_path_list() {
        let entry = parse_entry("{name: logs, type: files, src: [/var/log, /etc]}");
        assert_eq!(entry.name, "logs");
        assert_eq!(
            entry.spec,
            SourceSpec::Files {
                src: vec!["/var/log".to_string(), "/etc".to_string()]
            }
        );
    }

    #[test]
    fn mysql_source_parses_credentials() {
        let entry = parse_entry(
            "type: mysql\nsrc: {database: shop, username: shop, password: hunter2}",
        );
        match entry.spec {
            SourceSpec::Mysql { src } => {
                assert_eq!(src.database, "shop");
                assert_eq!(src.host, None);
            }
            other => panic!("expected mysql source, got {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_preserved_not_rejected() {
        let entry = parse_entry("{name: vm, type: esxi, src: /vmfs}");
        assert_eq!(entry.spec, SourceSpec::Unknown { kind: "esxi".to_string() });
        assert_eq!(entry.spec.kind(), "esxi");
    }

    #[test]
    fn missing_type_is_an_error() {
        let err = serde_yaml_ng::from_str::<SourceEntry>("{name: broken, src: /x}");
        assert!(err.is_err());
    }

    #[test]
    fn host_config_parses_groups_in_order() {
        let yaml = r#"
port: 2222
backups:
  - name: system
    backup:
      - type: files
        src: [/etc]
  - name: web
    backup:
      - name: site
        type: wordpress
        src: /var/www/blog
"#;
        let host: HostConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(host.port, Some(2222));
        assert_eq!(host.backups.len(), 2);
        assert_eq!(host.backups[0].name, "system");
        assert_eq!(host.backups[1].sources[0].name, "site");
        assert_eq!(host.backups[1].sources[0].spec.kind(), "wordpress");
    }

    #[test]
    fn path_fields_deserialize_from_yaml() {
        let yaml = r#"
default_dest: /backup/restic
password_file: /run/secrets/restic_pw
ssh_config: /srv/ratatosk/ssh-config
"#;
        let global: GlobalConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(global.password_file, Utf8PathBuf::from("/run/secrets/restic_pw"));
        assert_eq!(global.ssh_config, Utf8PathBuf::from("/srv/ratatosk/ssh-config"));
    }

    #[test]
    fn repo_uris_include_hostname() {
        let yaml = "default_dest: /backup/restic";
        let global: GlobalConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(global.repo_for("web1"), "/backup/restic/web1");
        assert_eq!(
            global.sftp_repo_for("web1"),
            "sftp:127.0.0.1:/backup/restic/web1"
        );
        assert_eq!(global.tunnel_port, 44444);
    }
}
