use secrecy::{ExposeSecret, SecretString};
use std::env;

use crate::MailerError;

/// Configuration for the outbound SMTP relay.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// SMTP host
    pub smtp_host: String,
    /// SMTP port (default: 587)
    pub smtp_port: u16,
    /// Login user; no authentication when absent
    pub username: Option<String>,
    /// Login password
    password: Option<SecretString>,
    /// Sender address
    pub from_address: String,
    /// Recipient used when a caller names none
    pub default_recipient: Option<String>,
}

impl MailerConfig {
    /// Create a new configuration with explicit values.
    pub fn new(
        smtp_host: impl Into<String>,
        smtp_port: u16,
        from_address: impl Into<String>,
    ) -> Self {
        Self {
            smtp_host: smtp_host.into(),
            smtp_port,
            username: None,
            password: None,
            from_address: from_address.into(),
            default_recipient: None,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `SMTP_HOST` - relay host; its absence means email is not configured
    /// - `EMAIL_FROM` - sender address
    ///
    /// Optional:
    /// - `SMTP_PORT` - Default: 587
    /// - `SMTP_USER` / `SMTP_PASSWORD` - credentials, used only when both are set
    /// - `EMAIL_TO` - default recipient
    pub fn from_env() -> Result<Self, MailerError> {
        let smtp_host =
            env::var("SMTP_HOST").map_err(|_| MailerError::MissingEnvVar("SMTP_HOST".to_string()))?;

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .map_err(|e| MailerError::Config(format!("Invalid SMTP_PORT: {}", e)))?;

        let from_address =
            env::var("EMAIL_FROM").map_err(|_| MailerError::MissingEnvVar("EMAIL_FROM".to_string()))?;

        let username = env::var("SMTP_USER").ok().filter(|v| !v.is_empty());
        let password = env::var("SMTP_PASSWORD")
            .ok()
            .filter(|v| !v.is_empty())
            .map(SecretString::from);
        let default_recipient = env::var("EMAIL_TO").ok().filter(|v| !v.is_empty());

        Ok(Self {
            smtp_host,
            smtp_port,
            username,
            password,
            from_address,
            default_recipient,
        })
    }

    /// Credentials pair when both halves are present (exposes the secret).
    pub(crate) fn credentials(&self) -> Option<(String, String)> {
        match (&self.username, &self.password) {
            (Some(user), Some(password)) => {
                Some((user.clone(), password.expose_secret().to_string()))
            }
            _ => None,
        }
    }

    /// Builder method to set login credentials.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Builder method to set the default recipient.
    pub fn with_default_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.default_recipient = Some(recipient.into());
        self
    }

    /// Builder method to set SMTP port.
    pub fn with_smtp_port(mut self, port: u16) -> Self {
        self.smtp_port = port;
        self
    }
}
