//! SMTP delivery of the HTML report

use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use ratatosk_core::SmtpConfig;
use tracing::info;

/// Build the report message for one recipient
pub fn build_message(
    smtp: &SmtpConfig,
    recipient: &str,
    subject: &str,
    html: &str,
) -> Result<Message> {
    Message::builder()
        .from(smtp.from.parse().context("invalid sender address")?)
        .to(recipient.parse().context("invalid recipient address")?)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html.to_string())
        .context("building report email")
}

/// Send the HTML report to every recipient through the configured relay
pub async fn send_report(
    smtp: &SmtpConfig,
    recipients: &[String],
    subject: &str,
    html: &str,
) -> Result<()> {
    let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
        .port(smtp.port)
        .build();

    for recipient in recipients {
        info!("sending report to {recipient}");
        let message = build_message(smtp, recipient, subject, html)?;
        transport
            .send(message)
            .await
            .with_context(|| format!("sending report to {recipient}"))?;
    }
    Ok(())
}
