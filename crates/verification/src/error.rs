//! Error types for the verification workflow.

use database::{DatabaseError, ValidationError};
use thiserror::Error;

/// Errors surfaced by verification operations.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A unique value is already taken.
    #[error("{entity} already exists: {id}")]
    Conflict { entity: &'static str, id: String },

    /// A required external transport is unconfigured or failed.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Caller input was rejected.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Unexpected storage failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VerificationError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        VerificationError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<DatabaseError> for VerificationError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity, id } => VerificationError::NotFound { entity, id },
            DatabaseError::AlreadyExists { entity, id } => {
                VerificationError::Conflict { entity, id }
            }
            DatabaseError::Invalid(e) => VerificationError::Validation(e.to_string()),
            other => VerificationError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationError> for VerificationError {
    fn from(err: ValidationError) -> Self {
        VerificationError::Validation(err.to_string())
    }
}

/// Result type for verification operations.
pub type Result<T> = std::result::Result<T, VerificationError>;
