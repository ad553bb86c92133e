//! Error types for sms-gateway.

use thiserror::Error;

/// Errors that can occur when talking to the SMS API.
#[derive(Debug, Error)]
pub enum SmsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error response from the API.
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Missing required environment variable.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Message rejected before sending.
    #[error("Send failed: {0}")]
    SendFailed(String),
}
