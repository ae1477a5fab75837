//! Integration tests for report rendering
//!
//! These tests build a multi-host run and verify the complete rendering
//! path for both the console table and the emailed HTML table.

use ratatosk_report::{render_console, render_html, report_rows};
use ratatosk_restic::{BackupRecord, BackupStats, HostResults, RunResults};

fn stats(bytes: u64, snapshot: &str) -> BackupStats {
    BackupStats {
        files_new: 12,
        files_changed: 3,
        files_unmodified: 240,
        dirs_new: 2,
        dirs_changed: 1,
        dirs_unmodified: 55,
        total_files_processed: 255,
        total_bytes_processed: bytes,
        total_duration: 12.7,
        snapshot_id: snapshot.to_string(),
    }
}

fn two_host_run() -> RunResults {
    let mut web = HostResults::new("web1");
    web.push(BackupRecord::host_marker("web1"));
    web.push(BackupRecord::new(
        "system",
        "",
        "files",
        Some(stats(2_500_000, "aa11bb22")),
        vec![],
    ));
    web.push(BackupRecord::announcement("blog", "", "docker-compose"));
    web.push(BackupRecord::new(
        "",
        "blog_db-data",
        "Volume",
        Some(stats(900, "cc33dd44")),
        vec!["Error open(13): /var/lib/docker/volumes/blog_db-data/lost".to_string()],
    ));

    let mut db = HostResults::new("db1");
    db.push(BackupRecord::host_marker("db1"));
    db.push(BackupRecord::new(
        "databases",
        "shop",
        "mysql",
        Some(stats(4_000_000_000, "ee55ff66")),
        vec![],
    ));

    let mut run = RunResults::default();
    run.push(web);
    run.push(db);
    run
}

#[test]
fn test_rows_follow_run_order() {
    let rows = report_rows(&two_host_run());
    assert_eq!(rows.len(), 6);

    let hostnames: Vec<&str> = rows.iter().map(|r| r.hostname.as_str()).collect();
    assert_eq!(hostnames, ["web1", "", "", "", "db1", ""]);

    // Marker and announcement rows stay blank past their labels
    assert!(rows[0].snapshot_id.is_empty());
    assert_eq!(rows[2].name, "blog");
    assert!(rows[2].backup_type.is_empty());
}

#[test]
fn test_console_table_renders_every_row() {
    let rows = report_rows(&two_host_run());
    let rendered = render_console(&rows);

    assert!(rendered.contains("web1"));
    assert!(rendered.contains("db1"));
    assert!(rendered.contains("2.50 MB"));
    assert!(rendered.contains("4.00 GB"));
    assert!(rendered.contains("aa11bb22"));
    assert!(rendered.contains("ee55ff66"));

    // Every line of the box-drawing table is the same width
    let widths: Vec<usize> = rendered.lines().map(|l| l.chars().count()).collect();
    assert!(widths.iter().all(|w| *w == widths[0]), "{:?}", widths);
}

#[test]
fn test_html_table_matches_row_and_column_counts() {
    let rows = report_rows(&two_host_run());
    let html = render_html(&rows);

    assert_eq!(html.matches("<th align='right'>").count(), 14);
    assert_eq!(html.matches("<tr>").count(), 1 + 6);
    assert_eq!(html.matches("<td align='right'>").count(), 6 * 14);

    assert!(html.contains("<td align='right'>4.00 GB</td>"));
    assert!(html.contains("<td align='right'>Volume</td>"));
    assert!(html.starts_with("<table"));
    assert!(html.trim_end().ends_with("</table>"));
}

#[test]
fn test_stdin_fed_backup_reports_data_added() {
    // A dump piped into restic reports zero processed bytes; the stats
    // substitute data_added, and the rendered row shows that figure
    let summary: ratatosk_restic::ResticEvent = serde_json::from_str(
        r#"{"message_type":"summary","total_bytes_processed":0,"data_added":123456,
            "total_duration":2.0,"snapshot_id":"0102aabb"}"#,
    )
    .unwrap();
    let mut fold = ratatosk_restic::EventFold::new();
    fold.push(summary, &ratatosk_restic::NullProgress);
    let (stats, errors) = fold.finish();

    let record = BackupRecord::new("databases", "shop", "mysql", stats, errors);
    let mut host = HostResults::new("db1");
    host.push(record);
    let mut run = RunResults::default();
    run.push(host);

    let rows = report_rows(&run);
    assert_eq!(rows[0].total_bytes, "123.46 KB");
}
