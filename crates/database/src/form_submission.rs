//! Form submission audit records.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{FormSubmission, NewFormSubmission};
use crate::validation::{
    validate_email, validate_latitude, validate_longitude, validate_non_negative,
    validate_required, MAX_NAME_LENGTH,
};

const FORM_COLUMNS: &str =
    "id, full_name, email, notes, latitude, longitude, geo_accuracy_m, claim_id, captured_at";

/// Insert a form submission.
pub async fn create_form_submission(
    pool: &SqlitePool,
    form: &NewFormSubmission,
) -> Result<FormSubmission> {
    validate_required("full_name", &form.full_name, MAX_NAME_LENGTH)?;
    validate_email(&form.email)?;
    if let Some(latitude) = form.geo.latitude {
        validate_latitude(latitude)?;
    }
    if let Some(longitude) = form.geo.longitude {
        validate_longitude(longitude)?;
    }
    if let Some(accuracy) = form.geo.accuracy_m {
        validate_non_negative("geo_accuracy_m", accuracy)?;
    }

    let query = format!(
        r#"
        INSERT INTO form_submissions (full_name, email, notes, latitude, longitude, geo_accuracy_m, claim_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING {FORM_COLUMNS}
        "#
    );

    sqlx::query_as::<_, FormSubmission>(&query)
        .bind(form.full_name.trim())
        .bind(form.email.trim())
        .bind(&form.notes)
        .bind(form.geo.latitude)
        .bind(form.geo.longitude)
        .bind(form.geo.accuracy_m)
        .bind(form.claim_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            DatabaseError::from_constraint(
                e,
                "FormSubmission",
                form.email.clone(),
                form.claim_id.map(|id| ("Claim", id.to_string())),
            )
        })
}

/// All submissions in insertion order.
pub async fn list_form_submissions(pool: &SqlitePool) -> Result<Vec<FormSubmission>> {
    let query = format!("SELECT {FORM_COLUMNS} FROM form_submissions ORDER BY id");

    let rows = sqlx::query_as::<_, FormSubmission>(&query)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Most recent submission linked to a claim, if any.
pub async fn latest_for_claim(pool: &SqlitePool, claim_id: i64) -> Result<Option<FormSubmission>> {
    let query = format!(
        "SELECT {FORM_COLUMNS} FROM form_submissions WHERE claim_id = ? \
         ORDER BY captured_at DESC, id DESC LIMIT 1"
    );

    let row = sqlx::query_as::<_, FormSubmission>(&query)
        .bind(claim_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoSnapshot;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let db = test_db().await;
        let form = NewFormSubmission {
            full_name: "Jane Roe".to_string(),
            email: "jane@example.com".to_string(),
            notes: Some("Phone: +15551234567".to_string()),
            geo: GeoSnapshot {
                latitude: Some(41.88),
                longitude: Some(-87.63),
                accuracy_m: None,
            },
            claim_id: None,
        };

        let created = create_form_submission(db.pool(), &form).await.unwrap();
        assert_eq!(created.full_name, "Jane Roe");
        assert_eq!(created.latitude, Some(41.88));

        let all = list_form_submissions(db.pool()).await.unwrap();
        assert_eq!(all, vec![created]);
    }

    #[tokio::test]
    async fn test_rejects_bad_email() {
        let db = test_db().await;
        let form = NewFormSubmission {
            full_name: "Jane Roe".to_string(),
            email: "not-an-email".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_form_submission(db.pool(), &form).await,
            Err(DatabaseError::Invalid(_))
        ));
    }
}
