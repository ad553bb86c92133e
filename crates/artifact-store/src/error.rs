//! Storage error types.

use thiserror::Error;

/// Errors that can occur when talking to object storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend failure (network, permissions, I/O)
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// Key is not a valid object path
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing required environment variable
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
