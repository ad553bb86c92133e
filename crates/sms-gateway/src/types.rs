//! Wire types for the messages endpoint.

use serde::{Deserialize, Serialize};

/// Form body of a send request.
#[derive(Debug, Clone, Serialize)]
pub struct SendParams {
    #[serde(rename = "To")]
    pub to: String,
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "Body")]
    pub body: String,
}

/// Accepted message as reported by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    /// Message identifier.
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}
