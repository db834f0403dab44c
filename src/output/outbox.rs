//! File-based notifier
//!
//! Writes one RFC 822 style message per recipient into the outbox
//! directory, plus the markdown digest. A separate mail transfer agent (or
//! a person) can pick the `.eml` files up from there.

use crate::config::{NotifyConfig, Recipient};
use crate::output::html::render_html;
use crate::output::markdown::write_markdown_digest;
use crate::output::traits::{Digest, Notifier, OutputResult};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;

/// Notifier writing `.eml` files to a directory
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    outbox_dir: PathBuf,
    summary_path: PathBuf,
    sender: String,
    subject_template: String,
    recipients: Vec<Recipient>,
}

impl OutboxNotifier {
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            outbox_dir: PathBuf::from(&config.outbox_dir),
            summary_path: PathBuf::from(&config.summary_path),
            sender: config.sender.clone(),
            subject_template: config.subject_template.clone(),
            recipients: config.recipients.clone(),
        }
    }

    fn message_path(&self, digest: &Digest, index: usize, recipient: &Recipient) -> PathBuf {
        self.outbox_dir.join(format!(
            "{}-{:02}-{}.eml",
            digest.generated_at.format("%Y%m%dT%H%M%SZ"),
            index + 1,
            mailbox_slug(&recipient.email)
        ))
    }
}

impl Notifier for OutboxNotifier {
    fn notify(&self, digest: &Digest) -> OutputResult<usize> {
        fs::create_dir_all(&self.outbox_dir)?;
        let subject = digest.subject(&self.subject_template);

        for (index, recipient) in self.recipients.iter().enumerate() {
            let body = render_html(digest, &recipient.name);
            let message = format_message(&self.sender, recipient, &subject, &body, digest.generated_at);
            let path = self.message_path(digest, index, recipient);
            fs::write(&path, message)?;
            tracing::info!("Wrote notification for {} to {}", recipient.email, path.display());
        }

        write_markdown_digest(digest, &subject, &self.summary_path)?;

        Ok(self.recipients.len())
    }
}

/// Formats a complete HTML message with headers
pub fn format_message(
    sender: &str,
    recipient: &Recipient,
    subject: &str,
    html_body: &str,
    date: DateTime<Utc>,
) -> String {
    let mut message = String::new();
    message.push_str(&format!("From: {}\r\n", header_value(sender)));
    message.push_str(&format!(
        "To: {} <{}>\r\n",
        header_value(&recipient.name),
        header_value(&recipient.email)
    ));
    message.push_str(&format!("Subject: {}\r\n", header_value(subject)));
    message.push_str(&format!("Date: {}\r\n", date.to_rfc2822()));
    message.push_str("MIME-Version: 1.0\r\n");
    message.push_str("Content-Type: text/html; charset=utf-8\r\n");
    message.push_str("\r\n");
    message.push_str(html_body);
    message
}

// Header values are single-line
fn header_value(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

fn mailbox_slug(email: &str) -> String {
    email
        .chars()
        .map(|c| match c {
            '@' => '_',
            c if c.is_ascii_alphanumeric() || c == '.' || c == '-' => c,
            _ => '_',
        })
        .collect()
}
