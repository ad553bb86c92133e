//! Recording upload, webhook and lookup.

use std::str::FromStr;

use axum::extract::{Multipart, Path, State};
use axum::Json;
use database::{GeoSnapshot, MeetingStatus, Recording};
use serde::Serialize;
use verification::{RecordingUpload, RecordingWebhook};

use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub recording_id: i64,
    pub storage_key: String,
    pub storage_url: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub recording_id: i64,
    pub previous_status: MeetingStatus,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MeetingRecordings {
    pub meeting_id: i64,
    pub recordings: Vec<Recording>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub object_deleted: bool,
}

fn parse_field<T: FromStr>(name: &str, value: &str) -> Result<Option<T>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ApiError::BadRequest(format!("{} is not a number: {}", name, value)))
}

/// Multipart fields: `file`, `room_name`, and optional `duration_sec`,
/// `latitude`, `longitude`, `geo_accuracy_m`.
pub async fn upload_recording(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut upload = RecordingUpload::default();
    let mut geo = GeoSnapshot::default();
    let mut has_file = false;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                upload.filename = field.file_name().unwrap_or_default().to_string();
                upload.content_type = field.content_type().map(str::to_string);
                upload.data = field.bytes().await?.to_vec();
                has_file = true;
            }
            "room_name" => upload.room_name = field.text().await?.trim().to_string(),
            "duration_sec" => upload.duration_sec = parse_field(&name, &field.text().await?)?,
            "latitude" => geo.latitude = parse_field(&name, &field.text().await?)?,
            "longitude" => geo.longitude = parse_field(&name, &field.text().await?)?,
            "geo_accuracy_m" => geo.accuracy_m = parse_field(&name, &field.text().await?)?,
            other => tracing::debug!(field = other, "Ignoring unknown upload field"),
        }
    }

    if !has_file {
        return Err(ApiError::BadRequest("file is required".to_string()));
    }
    if upload.room_name.is_empty() {
        return Err(ApiError::BadRequest("room_name is required".to_string()));
    }
    upload.geo = geo;

    let recording = state.service.upload_recording(upload).await?;
    Ok(Json(UploadResponse {
        success: true,
        recording_id: recording.id,
        storage_key: recording.storage_key,
        storage_url: recording.storage_url,
        message: "Recording uploaded successfully".to_string(),
    }))
}

pub async fn recording_webhook(
    State(state): State<AppState>,
    Json(body): Json<RecordingWebhook>,
) -> Result<Json<WebhookResponse>> {
    let outcome = state.service.recording_webhook(body).await?;
    Ok(Json(WebhookResponse {
        success: true,
        recording_id: outcome.recording.id,
        previous_status: outcome.status_change.from,
        message: "Recording saved and meeting completed".to_string(),
    }))
}

pub async fn recordings_for_meeting(
    State(state): State<AppState>,
    Path(meeting_id): Path<i64>,
) -> Result<Json<MeetingRecordings>> {
    let recordings = state.service.recordings_for_meeting(meeting_id).await?;
    Ok(Json(MeetingRecordings {
        meeting_id,
        recordings,
    }))
}

pub async fn get_recording(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Recording>> {
    Ok(Json(state.service.get_recording(id).await?))
}

pub async fn delete_recording(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>> {
    let deleted = state.service.delete_recording(id).await?;
    Ok(Json(DeleteResponse {
        message: "Recording deleted successfully".to_string(),
        object_deleted: deleted.object_deleted,
    }))
}
