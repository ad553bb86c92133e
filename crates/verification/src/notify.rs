//! Outbound notification channels.
//!
//! The workflow talks to SMS and email through these traits so the service
//! can run with either channel missing and tests can substitute fakes.

use async_trait::async_trait;
use mailer::{Email, Mailer, MailerError};
use sms_gateway::{SmsClient, SmsError};

/// Sends text messages.
#[async_trait]
pub trait SmsNotifier: Send + Sync {
    /// Send `body` to `to`, returning the provider's message id.
    async fn send_text(&self, to: &str, body: &str) -> Result<String, SmsError>;
}

#[async_trait]
impl SmsNotifier for SmsClient {
    async fn send_text(&self, to: &str, body: &str) -> Result<String, SmsError> {
        let sent = SmsClient::send_text(self, to, body).await?;
        Ok(sent.sid)
    }
}

/// Sends report emails.
#[async_trait]
pub trait ReportMailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailerError>;

    /// Recipient used when a caller names none.
    fn default_recipient(&self) -> Option<&str>;
}

#[async_trait]
impl ReportMailer for Mailer {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        Mailer::send(self, email).await
    }

    fn default_recipient(&self) -> Option<&str> {
        Mailer::default_recipient(self)
    }
}
