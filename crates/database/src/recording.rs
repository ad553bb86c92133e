//! Recording persistence.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{NewRecording, Recording};

const RECORDING_COLUMNS: &str = "id, meeting_id, storage_key, storage_url, mime_type, duration_sec, \
                                 latitude, longitude, geo_accuracy_m, created_at";

/// Insert a recording row.
pub async fn create_recording(pool: &SqlitePool, recording: &NewRecording) -> Result<Recording> {
    let query = format!(
        r#"
        INSERT INTO recordings (meeting_id, storage_key, storage_url, mime_type, duration_sec,
                                latitude, longitude, geo_accuracy_m)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {RECORDING_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Recording>(&query)
        .bind(recording.meeting_id)
        .bind(&recording.storage_key)
        .bind(&recording.storage_url)
        .bind(&recording.mime_type)
        .bind(recording.duration_sec)
        .bind(recording.geo.latitude)
        .bind(recording.geo.longitude)
        .bind(recording.geo.accuracy_m)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            DatabaseError::from_constraint(
                e,
                "Recording",
                recording.storage_key.clone(),
                recording.meeting_id.map(|id| ("Meeting", id.to_string())),
            )
        })
}

/// Get a recording by ID.
pub async fn get_recording(pool: &SqlitePool, id: i64) -> Result<Recording> {
    let query = format!("SELECT {RECORDING_COLUMNS} FROM recordings WHERE id = ?");

    sqlx::query_as::<_, Recording>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Recording",
            id: id.to_string(),
        })
}

/// Recordings of one meeting, newest first.
pub async fn list_recordings_for_meeting(
    pool: &SqlitePool,
    meeting_id: i64,
) -> Result<Vec<Recording>> {
    let query = format!(
        "SELECT {RECORDING_COLUMNS} FROM recordings WHERE meeting_id = ? ORDER BY created_at DESC, id DESC"
    );

    let recordings = sqlx::query_as::<_, Recording>(&query)
        .bind(meeting_id)
        .fetch_all(pool)
        .await?;

    Ok(recordings)
}

/// Delete a recording row, returning what was removed so the caller can
/// clean up the stored object.
pub async fn delete_recording(pool: &SqlitePool, id: i64) -> Result<Recording> {
    let query = format!("DELETE FROM recordings WHERE id = ? RETURNING {RECORDING_COLUMNS}");

    sqlx::query_as::<_, Recording>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Recording",
            id: id.to_string(),
        })
}
