//! Storage configuration.

use std::env;
use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::{Result, StorageError};

/// Which backend holds the objects.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// Amazon S3 (or a compatible service). Credentials fall back to the
    /// ambient AWS chain when not given.
    S3 {
        bucket: String,
        region: String,
        access_key_id: Option<String>,
        secret_access_key: Option<SecretString>,
    },
    /// A directory on local disk, created if missing.
    Local { root: PathBuf },
    /// Process memory. Useful for tests and demos.
    Memory,
}

/// Configuration for [`crate::ArtifactStore`].
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Prepended to every generated key (e.g. "recordings/").
    pub prefix: String,
    /// Base URL used for public links instead of the backend default.
    pub public_url: Option<String>,
}

impl StorageConfig {
    /// Create a configuration for the given backend with no prefix.
    pub fn new(backend: StorageBackend) -> Self {
        Self {
            backend,
            prefix: String::new(),
            public_url: None,
        }
    }

    /// In-memory configuration.
    pub fn memory() -> Self {
        Self::new(StorageBackend::Memory)
    }

    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `STORAGE_BACKEND` - `s3`, `local` or `memory`
    ///
    /// Backend specific:
    /// - `S3_BUCKET` (required for s3), `AWS_REGION` (default: us-east-1),
    ///   `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`
    /// - `STORAGE_LOCAL_ROOT` (default: ./storage)
    ///
    /// Optional:
    /// - `STORAGE_PREFIX` - key prefix
    /// - `STORAGE_PUBLIC_URL` - base for public links
    pub fn from_env() -> Result<Self> {
        let kind = env::var("STORAGE_BACKEND")
            .map_err(|_| StorageError::MissingEnvVar("STORAGE_BACKEND".to_string()))?;

        let backend = match kind.trim().to_lowercase().as_str() {
            "s3" => StorageBackend::S3 {
                bucket: env::var("S3_BUCKET")
                    .map_err(|_| StorageError::MissingEnvVar("S3_BUCKET".to_string()))?,
                region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                access_key_id: env::var("AWS_ACCESS_KEY_ID").ok(),
                secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").ok().map(SecretString::from),
            },
            "local" => StorageBackend::Local {
                root: env::var("STORAGE_LOCAL_ROOT")
                    .unwrap_or_else(|_| "./storage".to_string())
                    .into(),
            },
            "memory" => StorageBackend::Memory,
            other => {
                return Err(StorageError::Config(format!(
                    "unknown STORAGE_BACKEND '{}'",
                    other
                )))
            }
        };

        Ok(Self {
            backend,
            prefix: env::var("STORAGE_PREFIX").unwrap_or_default(),
            public_url: env::var("STORAGE_PUBLIC_URL").ok().filter(|v| !v.is_empty()),
        })
    }

    /// Builder method to set the key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Builder method to set the public URL base.
    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = Some(url.into());
        self
    }
}
