//! Transactional email for payment and refund confirmations.
//!
//! Sends through the Resend API when an API key is configured, otherwise logs
//! and skips. Callers treat every send as fire-and-forget.

use anyhow::{bail, Result};
use serde::Serialize;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct ResendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

pub struct ResendNotifier {
    api_key: String,
    from: String,
    client: reqwest::Client,
}

impl ResendNotifier {
    pub fn new(api_key: String, from: String, client: reqwest::Client) -> Self {
        Self {
            api_key,
            from,
            client,
        }
    }
}

#[async_trait::async_trait]
impl Notifier for ResendNotifier {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        let body = ResendEmailRequest {
            from: &self.from,
            to: vec![&message.to],
            subject: &message.subject,
            html: &message.html,
        };

        let resp = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("resend responded {}: {}", status, text.chars().take(200).collect::<String>());
        }

        tracing::info!(to = %message.to, subject = %message.subject, "email sent");
        Ok(())
    }
}

/// Used when no email provider is configured.
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        tracing::info!(to = %message.to, subject = %message.subject, "email delivery disabled, skipping");
        Ok(())
    }
}

pub fn payment_confirmation(
    to: &str,
    order_id: &str,
    payment_id: Option<&str>,
    amount: i64,
    currency: &str,
) -> EmailMessage {
    let payment_row = payment_id
        .map(|p| format!("<tr><td>Payment ID</td><td>{}</td></tr>", escape(p)))
        .unwrap_or_default();

    EmailMessage {
        to: to.to_string(),
        subject: "Payment received".to_string(),
        html: format!(
            r#"<div style="font-family:sans-serif;max-width:560px;margin:auto">
<h2>Thank you for your payment</h2>
<p>We have received your payment of <strong>{amount}</strong>.</p>
<table cellpadding="6">
<tr><td>Order ID</td><td>{order}</td></tr>
{payment_row}
</table>
<p>Your subscription is now active.</p>
</div>"#,
            amount = format_amount(amount, currency),
            order = escape(order_id),
        ),
    }
}

pub fn refund_confirmation(
    to: &str,
    order_id: &str,
    refund_id: Option<&str>,
    amount: i64,
    currency: &str,
) -> EmailMessage {
    let refund_row = refund_id
        .map(|r| format!("<tr><td>Refund ID</td><td>{}</td></tr>", escape(r)))
        .unwrap_or_default();

    EmailMessage {
        to: to.to_string(),
        subject: "Your refund has been processed".to_string(),
        html: format!(
            r#"<div style="font-family:sans-serif;max-width:560px;margin:auto">
<h2>Refund processed</h2>
<p>A refund of <strong>{amount}</strong> has been issued to your original payment method.</p>
<table cellpadding="6">
<tr><td>Order ID</td><td>{order}</td></tr>
{refund_row}
</table>
<p>It may take 5-7 business days to appear on your statement.</p>
</div>"#,
            amount = format_amount(amount, currency),
            order = escape(order_id),
        ),
    }
}

/// Renders minor units as a major-unit amount, e.g. `49900, INR` -> `INR 499.00`.
pub fn format_amount(minor: i64, currency: &str) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{} {}{}.{:02}", escape(currency), sign, abs / 100, abs % 100)
}

fn escape(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '&' => "&amp;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#39;".to_string(),
            c => c.to_string(),
        })
        .collect()
}
