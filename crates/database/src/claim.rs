//! Claim CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Claim, NewClaim};
use crate::validation::{
    validate_required, ValidationError, MAX_CLAIM_NUMBER_LENGTH, MAX_MOBILE_LENGTH,
    MAX_NAME_LENGTH,
};

/// Status assigned to freshly created claims.
pub const DEFAULT_CLAIM_STATUS: &str = "open";

const CLAIM_COLUMNS: &str = "id, claim_number, patient_mobile, hospital_city, hospital_state, \
                             language, status, user_id, created_at";

fn validate_claim(claim: &NewClaim) -> std::result::Result<(), ValidationError> {
    validate_required("claim_number", &claim.claim_number, MAX_CLAIM_NUMBER_LENGTH)?;
    validate_required("patient_mobile", &claim.patient_mobile, MAX_MOBILE_LENGTH)?;
    validate_required("hospital_city", &claim.hospital_city, MAX_NAME_LENGTH)?;
    validate_required("hospital_state", &claim.hospital_state, MAX_NAME_LENGTH)?;
    validate_required("language", &claim.language, MAX_NAME_LENGTH)?;
    Ok(())
}

/// Create a new claim owned by `user_id`.
///
/// The unique index on `claim_number` decides concurrent duplicates.
pub async fn create_claim(pool: &SqlitePool, user_id: i64, claim: &NewClaim) -> Result<Claim> {
    validate_claim(claim)?;

    let query = format!(
        r#"
        INSERT INTO claims (claim_number, patient_mobile, hospital_city, hospital_state, language, status, user_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING {CLAIM_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Claim>(&query)
        .bind(claim.claim_number.trim())
        .bind(claim.patient_mobile.trim())
        .bind(claim.hospital_city.trim())
        .bind(claim.hospital_state.trim())
        .bind(claim.language.trim())
        .bind(DEFAULT_CLAIM_STATUS)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            DatabaseError::from_constraint(
                e,
                "Claim",
                claim.claim_number.trim(),
                Some(("User", user_id.to_string())),
            )
        })
}

/// Get a claim by ID.
pub async fn get_claim(pool: &SqlitePool, id: i64) -> Result<Claim> {
    let query = format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE id = ?");

    sqlx::query_as::<_, Claim>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Claim",
            id: id.to_string(),
        })
}

/// Get a claim by its external claim number.
pub async fn get_claim_by_number(pool: &SqlitePool, claim_number: &str) -> Result<Claim> {
    let query = format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE claim_number = ?");

    sqlx::query_as::<_, Claim>(&query)
        .bind(claim_number.trim())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Claim",
            id: claim_number.to_string(),
        })
}

/// List claims, newest first.
pub async fn list_claims(pool: &SqlitePool) -> Result<Vec<Claim>> {
    let query = format!("SELECT {CLAIM_COLUMNS} FROM claims ORDER BY created_at DESC, id DESC");

    let claims = sqlx::query_as::<_, Claim>(&query).fetch_all(pool).await?;
    Ok(claims)
}

/// Replace the descriptive fields of a claim. Status and owner are untouched.
pub async fn update_claim(pool: &SqlitePool, id: i64, claim: &NewClaim) -> Result<Claim> {
    validate_claim(claim)?;

    let query = format!(
        r#"
        UPDATE claims
        SET claim_number = ?, patient_mobile = ?, hospital_city = ?, hospital_state = ?, language = ?
        WHERE id = ?
        RETURNING {CLAIM_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Claim>(&query)
        .bind(claim.claim_number.trim())
        .bind(claim.patient_mobile.trim())
        .bind(claim.hospital_city.trim())
        .bind(claim.hospital_state.trim())
        .bind(claim.language.trim())
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| DatabaseError::from_constraint(e, "Claim", claim.claim_number.trim(), None))?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Claim",
            id: id.to_string(),
        })
}

/// Set the operator-controlled status string.
pub async fn update_claim_status(pool: &SqlitePool, id: i64, status: &str) -> Result<()> {
    validate_required("status", status, MAX_NAME_LENGTH)?;

    let result = sqlx::query(
        r#"
        UPDATE claims
        SET status = ?
        WHERE id = ?
        "#,
    )
    .bind(status.trim())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Claim",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Delete a claim by ID.
pub async fn delete_claim(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM claims
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Claim",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Count total claims.
pub async fn count_claims(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM claims")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
