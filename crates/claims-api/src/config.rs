//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// Claims API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Owner assigned to claims created without one.
    pub default_claim_owner_id: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `CLAIMS_ADDR` | Server bind address | `127.0.0.1:8000` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:claims.db?mode=rwc` |
    /// | `CORS_ORIGINS` | Comma separated allowed origins | `http://localhost:5173` |
    /// | `DEFAULT_CLAIM_OWNER_ID` | Owner of claims created without one | `1` |
    ///
    /// Transport settings (SMTP, SMS, storage, tokens) are read by their
    /// own crates.
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("CLAIMS_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("SQLITE_PATH")
            .unwrap_or_else(|_| "sqlite:claims.db?mode=rwc".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        let default_claim_owner_id = match env::var("DEFAULT_CLAIM_OWNER_ID") {
            Ok(v) => v.trim().parse().map_err(|_| ConfigError::InvalidOwnerId)?,
            Err(_) => 1,
        };

        Ok(Self {
            addr,
            database_url,
            cors_origins,
            default_claim_owner_id,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid CLAIMS_ADDR format")]
    InvalidAddr,

    #[error("DEFAULT_CLAIM_OWNER_ID must be an integer")]
    InvalidOwnerId,
}
