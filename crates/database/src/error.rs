//! Database error types.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Record already exists (unique index violation)
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// Input rejected before reaching SQLite
    #[error("invalid input: {0}")]
    Invalid(#[from] ValidationError),

    /// Password hashing failed
    #[error("password hash error: {0}")]
    PasswordHash(String),
}

impl DatabaseError {
    /// Translate a constraint violation on insert/update into a typed error.
    ///
    /// Unique violations become [`DatabaseError::AlreadyExists`] for `entity`;
    /// foreign key violations become [`DatabaseError::NotFound`] for the
    /// referenced `parent`.
    pub(crate) fn from_constraint(
        err: sqlx::Error,
        entity: &'static str,
        id: impl Into<String>,
        parent: Option<(&'static str, String)>,
    ) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity,
                    id: id.into(),
                };
            }
            if db_err.is_foreign_key_violation() {
                if let Some((parent_entity, parent_id)) = parent {
                    return DatabaseError::NotFound {
                        entity: parent_entity,
                        id: parent_id,
                    };
                }
            }
        }
        DatabaseError::Sqlx(err)
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
