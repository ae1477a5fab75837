//! Backup command: run every host's backup, then report

use anyhow::Result;
use ratatosk_core::{utils, Config};
use ratatosk_restic::{runner, NullProgress, ProgressSink};
use ratatosk_report::{render_console, render_html, report_rows, send_report};

use super::load_hosts;
use crate::cli::BackupArgs;
use crate::output::{self, SpinnerProgress};

pub async fn run(args: BackupArgs, config: &Config, quiet: bool) -> Result<()> {
    let store = load_hosts(config)?;

    let started = chrono::Local::now();
    output::header("Backup run");
    output::kv("started", &started.format("%Y-%m-%d %H:%M:%S").to_string());

    let spinner;
    let progress: &dyn ProgressSink = if quiet {
        &NullProgress
    } else {
        spinner = SpinnerProgress::new();
        &spinner
    };

    let results = runner::backup_all(
        &config.global,
        &store,
        args.hostname.as_deref(),
        args.port,
        progress,
    )
    .await;

    let rows = report_rows(&results);

    if args.email.is_empty() {
        println!("{}", render_console(&rows));
    } else {
        let html = render_html(&rows);
        let subject = format!("ratatosk on {}", utils::local_hostname());
        send_report(&config.global.smtp, &args.email, &subject, &html).await?;
        output::success(&format!("report sent to {}", args.email.join(", ")));
    }

    let failed: usize = results
        .records()
        .filter(|r| !r.errors.is_empty())
        .count();
    if failed > 0 {
        output::warning(&format!("{failed} backup(s) reported errors"));
    } else {
        output::success("backup run complete");
    }
    Ok(())
}
