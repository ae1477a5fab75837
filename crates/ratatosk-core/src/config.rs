//! Configuration file loading
//!
//! One directory holds everything: `ratatosk.yaml` with the global settings,
//! and one `<hostname>.yaml` per host describing what to back up there.

use crate::error::{Error, Result};
use crate::types::{GlobalConfig, HostConfig};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Default configuration directory
pub const DEFAULT_ETC_DIR: &str = "/etc/ratatosk";

/// Global configuration file name inside the etc directory
pub const CONFIG_FILE_NAME: &str = "ratatosk.yaml";

/// Loaded global configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// The parsed global configuration
    pub global: GlobalConfig,

    /// Directory the configuration was loaded from
    pub etc_dir: Utf8PathBuf,
}

impl Config {
    /// Load the global configuration from `<etc_dir>/ratatosk.yaml`
    pub fn load(etc_dir: &Utf8Path) -> Result<Self> {
        let path = etc_dir.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config_not_found(path.as_str())
            } else {
                Error::Io(e)
            }
        })?;

        let global: GlobalConfig = serde_yaml_ng::from_str(&content)?;

        Ok(Self {
            global,
            etc_dir: etc_dir.to_owned(),
        })
    }
}

/// One host and its backup definition
#[derive(Debug, Clone)]
pub struct HostEntry {
    /// Effective hostname (file stem, unless the file overrides it)
    pub name: String,

    /// The parsed host configuration
    pub config: HostConfig,
}

/// All host definition files, in sorted file-name order.
///
/// Iteration yields hosts in load order; a comma-separated filter restricts
/// the iteration without reordering it.
#[derive(Debug, Clone, Default)]
pub struct HostStore {
    hosts: Vec<HostEntry>,
}

impl HostStore {
    /// Load every `*.yaml` in the etc directory except the global config.
    ///
    /// Files without a `backups` key are ignored; a malformed file is fatal.
    pub fn load(etc_dir: &Utf8Path) -> Result<Self> {
        let mut paths: Vec<Utf8PathBuf> = Vec::new();
        for dirent in fs::read_dir(etc_dir)? {
            let dirent = dirent?;
            let path = Utf8PathBuf::from_path_buf(dirent.path())
                .map_err(|p| Error::invalid_config(p.display().to_string(), "non-UTF-8 path"))?;
            if path.extension() != Some("yaml") {
                continue;
            }
            if path.file_name() == Some(CONFIG_FILE_NAME) {
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        let mut hosts = Vec::new();
        for path in paths {
            let content = fs::read_to_string(&path)?;

            // Skip files that do not describe backups at all
            let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(&content)
                .map_err(|e| Error::invalid_config(path.as_str(), e.to_string()))?;
            if value.get("backups").is_none() {
                tracing::debug!("skipping {path}: no `backups` key");
                continue;
            }

            let config: HostConfig = serde_yaml_ng::from_value(value)
                .map_err(|e| Error::invalid_config(path.as_str(), e.to_string()))?;

            let name = config
                .hostname
                .clone()
                .unwrap_or_else(|| path.file_stem().unwrap_or_default().to_string());

            hosts.push(HostEntry { name, config });
        }

        Ok(Self { hosts })
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Iterate hosts in store order, optionally restricted to a
    /// comma-separated allow-list of hostnames.
    pub fn iter<'a>(&'a self, filter: Option<&str>) -> impl Iterator<Item = &'a HostEntry> + 'a {
        let allow: Option<Vec<String>> =
            filter.map(|f| f.split(',').map(|s| s.trim().to_string()).collect());
        self.hosts
            .iter()
            .filter(move |entry| match &allow {
                Some(names) => names.iter().any(|n| n == &entry.name),
                None => true,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &std::path::Path, name: &str, content: &str) {
        let mut f = fs::File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    const HOST_YAML: &str = "backups:\n  - name: sys\n    backup:\n      - {type: files, src: [/etc]}\n";

    #[test]
    fn store_skips_global_config_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "b.yaml", HOST_YAML);
        write_file(dir.path(), "a.yaml", HOST_YAML);
        write_file(dir.path(), CONFIG_FILE_NAME, "default_dest: /backup\n");

        let etc = Utf8Path::from_path(dir.path()).unwrap();
        let store = HostStore::load(etc).unwrap();
        let names: Vec<&str> = store.iter(None).map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn filter_restricts_without_reordering() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.yaml", "b.yaml", "c.yaml", "d.yaml"] {
            write_file(dir.path(), name, HOST_YAML);
        }

        let etc = Utf8Path::from_path(dir.path()).unwrap();
        let store = HostStore::load(etc).unwrap();
        assert_eq!(store.len(), 4);

        // Filter order does not matter; store order wins
        let names: Vec<&str> = store.iter(Some("d,a")).map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["a", "d"]);

        let none: Vec<&str> = store.iter(Some("zz")).map(|h| h.name.as_str()).collect();
        assert!(none.is_empty());
    }

    #[test]
    fn hostname_key_overrides_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "alias.yaml",
            "hostname: real.example.com\nbackups: []\n",
        );

        let etc = Utf8Path::from_path(dir.path()).unwrap();
        let store = HostStore::load(etc).unwrap();
        let names: Vec<&str> = store.iter(None).map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["real.example.com"]);
    }

    #[test]
    fn files_without_backups_key_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "notes.yaml", "something: else\n");
        write_file(dir.path(), "web.yaml", HOST_YAML);

        let etc = Utf8Path::from_path(dir.path()).unwrap();
        let store = HostStore::load(etc).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn malformed_yaml_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "bad.yaml", "backups: [unclosed\n");

        let etc = Utf8Path::from_path(dir.path()).unwrap();
        assert!(HostStore::load(etc).is_err());
    }

    #[test]
    fn missing_global_config_is_config_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let etc = Utf8Path::from_path(dir.path()).unwrap();
        match Config::load(etc) {
            Err(Error::ConfigNotFound { path }) => assert!(path.ends_with(CONFIG_FILE_NAME)),
            other => panic!("expected ConfigNotFound, got {other:?}"),
        }
    }
}
