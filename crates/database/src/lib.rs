//! SQLite entity store for claim verification.
//!
//! This crate provides async CRUD operations for users, claims, meetings,
//! recordings, the geolocation log and form submissions using SQLx with
//! SQLite. Uniqueness (claim numbers, room names, session ids) and
//! referential integrity are enforced by the schema, not by the callers.
//!
//! # Example
//!
//! ```no_run
//! use database::{claim, user, Database, NewClaim};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:claims.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let owner = user::create_user(db.pool(), "ops@example.com", "hunter22").await?;
//!     let claim = NewClaim {
//!         claim_number: "CLM-001".to_string(),
//!         patient_mobile: "+15551234567".to_string(),
//!         hospital_city: "Springfield".to_string(),
//!         hospital_state: "IL".to_string(),
//!         language: "en".to_string(),
//!     };
//!     claim::create_claim(db.pool(), owner.id, &claim).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod claim;
pub mod error;
pub mod form_submission;
pub mod geolocation;
pub mod meeting;
pub mod models;
pub mod recording;
pub mod user;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    Claim, FormSubmission, GeoSnapshot, Geolocation, Meeting, MeetingStatus, NewClaim,
    NewFormSubmission, NewGeolocation, NewMeeting, NewRecording, Recording, User,
};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/claims.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
