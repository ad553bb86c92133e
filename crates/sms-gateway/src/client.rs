//! SMS REST client.

use reqwest::Client;
use tracing::{debug, info, instrument};

use crate::config::SmsConfig;
use crate::error::SmsError;
use crate::types::{ApiErrorBody, SendParams, SentMessage};

/// Client for the messages endpoint.
#[derive(Clone)]
pub struct SmsClient {
    http: Client,
    config: SmsConfig,
}

impl SmsClient {
    /// Build a client. No request is made until the first send.
    pub fn new(config: SmsConfig) -> Result<Self, SmsError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(SmsError::Http)?;

        info!(base_url = %config.base_url, from = %config.from_number, "Created SMS client");

        Ok(Self { http, config })
    }

    /// Send a text message, returning the accepted message.
    #[instrument(skip(self, body), fields(to = %to))]
    pub async fn send_text(&self, to: &str, body: &str) -> Result<SentMessage, SmsError> {
        if to.trim().is_empty() {
            return Err(SmsError::SendFailed("recipient is empty".to_string()));
        }

        let params = SendParams {
            to: to.trim().to_string(),
            from: self.config.from_number.clone(),
            body: body.to_string(),
        };

        let url = self.config.messages_url();
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(self.config.auth_token()))
            .form(&params)
            .send()
            .await
            .map_err(SmsError::Http)?;

        let status = response.status();
        let text = response.text().await.map_err(SmsError::Http)?;

        if !status.is_success() {
            let error: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();
            return Err(SmsError::Api {
                code: error.code.unwrap_or(i64::from(status.as_u16())),
                message: error.message.unwrap_or(text),
            });
        }

        let sent: SentMessage = serde_json::from_str(&text)?;
        info!(sid = %sent.sid, "SMS accepted");
        Ok(sent)
    }

    /// Get the configuration.
    pub fn config(&self) -> &SmsConfig {
        &self.config
    }
}

impl std::fmt::Debug for SmsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsClient")
            .field("config", &self.config)
            .finish()
    }
}
