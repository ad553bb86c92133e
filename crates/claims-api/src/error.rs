//! Error types for the claims API.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use verification::VerificationError;

/// Errors returned by handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Workflow error, mapped by kind.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// Malformed request.
    #[error("{0}")]
    BadRequest(String),
}

impl From<database::DatabaseError> for ApiError {
    fn from(err: database::DatabaseError) -> Self {
        ApiError::Verification(err.into())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(format!("invalid multipart body: {}", err))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Verification(err) => match err {
                VerificationError::NotFound { .. } => StatusCode::NOT_FOUND,
                VerificationError::Conflict { .. } => StatusCode::CONFLICT,
                VerificationError::Validation(_) => StatusCode::BAD_REQUEST,
                VerificationError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                VerificationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", message);
        } else {
            tracing::debug!(status = status.as_u16(), "{}", message);
        }

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
