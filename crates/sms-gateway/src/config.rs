//! Configuration types for sms-gateway.

use std::env;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::SmsError;

/// Default API host.
pub const DEFAULT_API_URL: &str = "https://api.twilio.com";

/// Configuration for the SMS REST API.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    /// Base URL of the API (e.g., "https://api.twilio.com").
    pub base_url: String,
    /// Account SID, also the basic-auth user.
    pub account_sid: String,
    auth_token: SecretString,
    /// Sender number in E.164 form.
    pub from_number: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl SmsConfig {
    /// Create a new configuration against the default API host.
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            account_sid: account_sid.into(),
            auth_token: SecretString::from(auth_token.into()),
            from_number: from_number.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `SMS_ACCOUNT_SID`
    /// - `SMS_AUTH_TOKEN`
    /// - `SMS_FROM_NUMBER`
    ///
    /// Optional:
    /// - `SMS_API_URL` - Default: https://api.twilio.com
    pub fn from_env() -> Result<Self, SmsError> {
        let account_sid = required("SMS_ACCOUNT_SID")?;
        let auth_token = required("SMS_AUTH_TOKEN")?;
        let from_number = required("SMS_FROM_NUMBER")?;

        let mut config = Self::new(account_sid, auth_token, from_number);
        if let Ok(url) = env::var("SMS_API_URL") {
            config = config.with_base_url(url);
        }
        Ok(config)
    }

    /// Builder method to point at another API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder method to set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the messages endpoint URL.
    pub fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url,
            urlencoding::encode(&self.account_sid)
        )
    }

    pub(crate) fn auth_token(&self) -> &str {
        self.auth_token.expose_secret()
    }
}

fn required(var: &str) -> Result<String, SmsError> {
    env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SmsError::MissingEnvVar(var.to_string()))
}
