//! Append-only geolocation log keyed by claim.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Geolocation, NewGeolocation};
use crate::validation::{validate_latitude, validate_longitude, validate_non_negative};

const GEOLOCATION_COLUMNS: &str =
    "id, claim_id, latitude, longitude, accuracy, timestamp, source, metadata";

/// Append a fix to a claim's log.
pub async fn create_geolocation(pool: &SqlitePool, geo: &NewGeolocation) -> Result<Geolocation> {
    validate_latitude(geo.latitude)?;
    validate_longitude(geo.longitude)?;
    if let Some(accuracy) = geo.accuracy {
        validate_non_negative("accuracy", accuracy)?;
    }

    let query = format!(
        r#"
        INSERT INTO geolocations (claim_id, latitude, longitude, accuracy, timestamp, source, metadata)
        VALUES (?, ?, ?, ?, COALESCE(?, strftime('%Y-%m-%d %H:%M:%f', 'now')), ?, ?)
        RETURNING {GEOLOCATION_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Geolocation>(&query)
        .bind(geo.claim_id)
        .bind(geo.latitude)
        .bind(geo.longitude)
        .bind(geo.accuracy)
        .bind(&geo.timestamp)
        .bind(&geo.source)
        .bind(&geo.metadata)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            DatabaseError::from_constraint(
                e,
                "Geolocation",
                geo.claim_id.to_string(),
                Some(("Claim", geo.claim_id.to_string())),
            )
        })
}

/// Get a geolocation entry by ID.
pub async fn get_geolocation(pool: &SqlitePool, id: i64) -> Result<Geolocation> {
    let query = format!("SELECT {GEOLOCATION_COLUMNS} FROM geolocations WHERE id = ?");

    sqlx::query_as::<_, Geolocation>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Geolocation",
            id: id.to_string(),
        })
}

/// The max-timestamp entry for a claim, if any.
pub async fn latest_for_claim(pool: &SqlitePool, claim_id: i64) -> Result<Option<Geolocation>> {
    let query = format!(
        "SELECT {GEOLOCATION_COLUMNS} FROM geolocations WHERE claim_id = ? \
         ORDER BY timestamp DESC, id DESC LIMIT 1"
    );

    let geo = sqlx::query_as::<_, Geolocation>(&query)
        .bind(claim_id)
        .fetch_optional(pool)
        .await?;

    Ok(geo)
}

/// All entries for a claim, newest first.
pub async fn list_for_claim(pool: &SqlitePool, claim_id: i64) -> Result<Vec<Geolocation>> {
    let query = format!(
        "SELECT {GEOLOCATION_COLUMNS} FROM geolocations WHERE claim_id = ? \
         ORDER BY timestamp DESC, id DESC"
    );

    let rows = sqlx::query_as::<_, Geolocation>(&query)
        .bind(claim_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Number of entries logged for a claim.
pub async fn count_for_claim(pool: &SqlitePool, claim_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM geolocations WHERE claim_id = ?")
        .bind(claim_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewClaim;
    use crate::{claim, user, Database};

    async fn test_db() -> (Database, i64) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let owner = user::create_user(db.pool(), "ops@example.com", "hunter22")
            .await
            .unwrap();
        let claim = claim::create_claim(
            db.pool(),
            owner.id,
            &NewClaim {
                claim_number: "CLM-001".to_string(),
                patient_mobile: "+15551234567".to_string(),
                hospital_city: "Springfield".to_string(),
                hospital_state: "IL".to_string(),
                language: "en".to_string(),
            },
        )
        .await
        .unwrap();
        (db, claim.id)
    }

    fn fix(claim_id: i64, timestamp: Option<&str>) -> NewGeolocation {
        NewGeolocation {
            claim_id,
            latitude: 41.88,
            longitude: -87.63,
            accuracy: Some(10.0),
            timestamp: timestamp.map(str::to_string),
            source: "browser".to_string(),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_latest_is_max_timestamp() {
        let (db, claim_id) = test_db().await;
        assert!(latest_for_claim(db.pool(), claim_id).await.unwrap().is_none());

        create_geolocation(db.pool(), &fix(claim_id, Some("2025-03-02 10:00:00.000")))
            .await
            .unwrap();
        let older = create_geolocation(db.pool(), &fix(claim_id, Some("2025-03-01 10:00:00.000")))
            .await
            .unwrap();

        let latest = latest_for_claim(db.pool(), claim_id).await.unwrap().unwrap();
        assert_eq!(latest.timestamp, "2025-03-02 10:00:00.000");

        let all = list_for_claim(db.pool(), claim_id).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].id, older.id);
        assert_eq!(count_for_claim(db.pool(), claim_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_default_timestamp_and_lookup() {
        let (db, claim_id) = test_db().await;
        let created = create_geolocation(db.pool(), &fix(claim_id, None)).await.unwrap();
        assert!(!created.timestamp.is_empty());
        assert_eq!(get_geolocation(db.pool(), created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_rejects_bad_coordinates_and_unknown_claim() {
        let (db, claim_id) = test_db().await;

        let mut bad = fix(claim_id, None);
        bad.latitude = 123.0;
        assert!(matches!(
            create_geolocation(db.pool(), &bad).await,
            Err(DatabaseError::Invalid(_))
        ));

        assert!(matches!(
            create_geolocation(db.pool(), &fix(claim_id + 100, None)).await,
            Err(DatabaseError::NotFound { entity: "Claim", .. })
        ));
    }
}
