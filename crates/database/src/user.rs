//! User CRUD operations.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::User;
use crate::validation::{validate_email, validate_password};

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DatabaseError::PasswordHash(e.to_string()))
}

/// Check a plaintext password against a stored user's hash.
pub fn verify_password(user: &User, password: &str) -> bool {
    match PasswordHash::new(&user.password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Register a new user, hashing the password.
pub async fn create_user(pool: &SqlitePool, email: &str, password: &str) -> Result<User> {
    let email = email.trim();
    validate_email(email)?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password_hash)
        VALUES (?, ?)
        RETURNING id, email, password_hash, created_at
        "#,
    )
    .bind(email)
    .bind(&password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| DatabaseError::from_constraint(e, "User", email, None))
}

/// Get a user by ID.
pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, password_hash, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: id.to_string(),
    })
}

/// Get a user by email.
pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, password_hash, created_at
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email.trim())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: email.to_string(),
    })
}

/// Replace a user's password.
pub async fn update_password(pool: &SqlitePool, id: i64, password: &str) -> Result<()> {
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let result = sqlx::query(
        r#"
        UPDATE users
        SET password_hash = ?
        WHERE id = ?
        "#,
    )
    .bind(&password_hash)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List all users.
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, password_hash, created_at
        FROM users
        ORDER BY email
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Count total users.
pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM users
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_password_is_hashed() {
        let db = test_db().await;
        let user = create_user(db.pool(), "ops@example.com", "hunter22").await.unwrap();

        assert_ne!(user.password_hash, "hunter22");
        assert!(user.password_hash.starts_with("$argon2"));
        assert!(verify_password(&user, "hunter22"));
        assert!(!verify_password(&user, "wrong-password"));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = test_db().await;
        create_user(db.pool(), "ops@example.com", "hunter22").await.unwrap();

        let result = create_user(db.pool(), "ops@example.com", "another1").await;
        assert!(matches!(
            result,
            Err(DatabaseError::AlreadyExists { entity: "User", .. })
        ));
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let db = test_db().await;
        let result = create_user(db.pool(), "ops@example.com", "abc").await;
        assert!(matches!(result, Err(DatabaseError::Invalid(_))));
        assert_eq!(count_users(db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_password() {
        let db = test_db().await;
        let user = create_user(db.pool(), "ops@example.com", "hunter22").await.unwrap();

        update_password(db.pool(), user.id, "new-secret").await.unwrap();
        let fetched = get_user_by_email(db.pool(), "ops@example.com").await.unwrap();
        assert!(verify_password(&fetched, "new-secret"));
        assert!(!verify_password(&fetched, "hunter22"));

        let missing = update_password(db.pool(), 999, "new-secret").await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }
}
