//! Integration tests for configuration loading
//!
//! These tests build a realistic etc directory on disk and verify the
//! complete loading path: global config, host store, and source parsing.

use ratatosk_core::{Config, HostStore, SourceSpec};
use std::fs;

const GLOBAL_YAML: &str = r#"
default_dest: /backup/restic
username: backup
tunnel_port: 48000
require_user: backup
smtp:
  host: mail.internal
  port: 587
  from: backups@example.com
"#;

const WEB_YAML: &str = r#"
port: 2222
backups:
  - name: system
    backup:
      - type: files
        src: [/etc, /usr/local/bin]
  - name: blog
    backup:
      - name: site
        type: wordpress
        src: /var/www/blog
      - name: stack
        type: docker-compose
        src: /srv/stacks/blog
"#;

const DB_YAML: &str = r#"
backups:
  - name: databases
    backup:
      - name: shop
        type: mysql
        src: {database: shop, username: shop, password: hunter2}
      - name: tickets
        type: psql
        src: {host: db.internal, database: tickets, username: ost, password: s3cret}
      - name: legacy
        type: vmware
        src: /vmfs
"#;

fn etc_dir() -> (tempfile::TempDir, camino::Utf8PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 path");
    fs::write(path.join("ratatosk.yaml"), GLOBAL_YAML).unwrap();
    fs::write(path.join("web1.yaml"), WEB_YAML).unwrap();
    fs::write(path.join("db1.yaml"), DB_YAML).unwrap();
    (dir, path)
}

#[test]
fn test_global_config_round_trip() {
    let (_guard, etc) = etc_dir();
    let config = Config::load(&etc).expect("global config loads");

    assert_eq!(config.global.default_dest, "/backup/restic");
    assert_eq!(config.global.username, "backup");
    assert_eq!(config.global.tunnel_port, 48000);
    assert_eq!(config.global.require_user.as_deref(), Some("backup"));
    assert_eq!(config.global.smtp.host, "mail.internal");
    assert_eq!(config.global.smtp.port, 587);

    // Defaults fill in everything the file leaves out
    assert_eq!(config.global.restic_local, "/opt/restic/restic");
    assert_eq!(
        config.global.password_file.as_str(),
        "/etc/ratatosk/restic_password.txt"
    );
}

#[test]
fn test_repository_uris_derive_from_dest() {
    let (_guard, etc) = etc_dir();
    let config = Config::load(&etc).expect("global config loads");

    assert_eq!(config.global.repo_for("web1"), "/backup/restic/web1");
    assert_eq!(
        config.global.sftp_repo_for("web1"),
        "sftp:127.0.0.1:/backup/restic/web1"
    );
}

#[test]
fn test_host_store_loads_both_hosts() {
    let (_guard, etc) = etc_dir();
    let store = HostStore::load(&etc).expect("host store loads");

    // Sorted by file name, the global config excluded
    let names: Vec<&str> = store.iter(None).map(|h| h.name.as_str()).collect();
    assert_eq!(names, ["db1", "web1"]);
}

#[test]
fn test_web_host_groups_and_sources() {
    let (_guard, etc) = etc_dir();
    let store = HostStore::load(&etc).unwrap();
    let web = store.iter(Some("web1")).next().expect("web1 present");

    assert_eq!(web.config.port, Some(2222));
    assert_eq!(web.config.backups.len(), 2);

    let system = &web.config.backups[0];
    assert_eq!(system.name, "system");
    match &system.sources[0].spec {
        SourceSpec::Files { src } => assert_eq!(src, &["/etc", "/usr/local/bin"]),
        other => panic!("expected files source, got {:?}", other),
    }

    let blog = &web.config.backups[1];
    assert_eq!(blog.sources[0].name, "site");
    assert_eq!(blog.sources[0].spec.kind(), "wordpress");
    assert_eq!(blog.sources[1].spec.kind(), "docker-compose");
}

#[test]
fn test_unknown_source_type_survives_loading() {
    let (_guard, etc) = etc_dir();
    let store = HostStore::load(&etc).unwrap();
    let db = store.iter(Some("db1")).next().expect("db1 present");

    let sources = &db.config.backups[0].sources;
    assert_eq!(sources.len(), 3);

    // The typo'd source parses; the two good ones are intact around it
    match &sources[2].spec {
        SourceSpec::Unknown { kind } => assert_eq!(kind, "vmware"),
        other => panic!("expected unknown source, got {:?}", other),
    }
    match &sources[0].spec {
        SourceSpec::Mysql { src } => {
            assert_eq!(src.database, "shop");
            assert_eq!(src.host, None);
        }
        other => panic!("expected mysql source, got {:?}", other),
    }
    match &sources[1].spec {
        SourceSpec::Psql { src } => assert_eq!(src.host.as_deref(), Some("db.internal")),
        other => panic!("expected psql source, got {:?}", other),
    }
}

#[test]
fn test_filter_returns_only_requested_hosts() {
    let (_guard, etc) = etc_dir();
    let store = HostStore::load(&etc).unwrap();

    let names: Vec<&str> = store.iter(Some("web1")).map(|h| h.name.as_str()).collect();
    assert_eq!(names, ["web1"]);

    let names: Vec<&str> = store
        .iter(Some("web1,db1"))
        .map(|h| h.name.as_str())
        .collect();
    assert_eq!(names, ["db1", "web1"]);
}
