//! Artifact linker: recordings, the geolocation log and form submissions.

use database::validation::{
    validate_latitude, validate_longitude, validate_non_negative, validate_required,
    MAX_NAME_LENGTH,
};
use database::{
    claim, form_submission, geolocation, meeting, recording, FormSubmission, GeoSnapshot,
    Geolocation, MeetingStatus, NewFormSubmission, NewGeolocation, NewRecording, Recording,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::{Result, VerificationError};
use crate::lifecycle::StatusChange;
use crate::service::VerificationService;

/// Mime type assumed when a client sends none.
pub const DEFAULT_RECORDING_MIME: &str = "video/mp4";

/// Source tag used when a geolocation capture names none.
pub const DEFAULT_GEO_SOURCE: &str = "browser";

/// Metadata for a recording already sitting in storage.
#[derive(Debug, Clone, Default)]
pub struct RecordingAttachment {
    pub room_name: String,
    pub storage_key: String,
    pub storage_url: Option<String>,
    pub mime_type: Option<String>,
    pub duration_sec: Option<i64>,
    pub geo: GeoSnapshot,
}

/// A recording file to store and attach.
#[derive(Debug, Clone, Default)]
pub struct RecordingUpload {
    pub room_name: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
    pub duration_sec: Option<i64>,
    pub geo: GeoSnapshot,
}

/// Completion notice from the external recorder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordingWebhook {
    pub room_name: String,
    #[serde(alias = "s3_key")]
    pub storage_key: String,
    #[serde(default)]
    pub duration_sec: Option<i64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub geo_accuracy_m: Option<f64>,
}

impl RecordingWebhook {
    fn geo(&self) -> GeoSnapshot {
        GeoSnapshot {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy_m: self.geo_accuracy_m,
        }
    }
}

/// Result of a webhook: the new recording and the forced status move.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookOutcome {
    pub recording: Recording,
    pub status_change: StatusChange,
}

/// Recording removal result.
#[derive(Debug, Clone, Serialize)]
pub struct DeletedRecording {
    pub recording: Recording,
    /// Whether the stored object was removed as well.
    pub object_deleted: bool,
}

/// A geolocation fix to append to a claim's log.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoCapture {
    pub claim_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A claim's geolocation log.
#[derive(Debug, Clone, Serialize)]
pub struct GeolocationList {
    pub geolocations: Vec<Geolocation>,
    pub total_count: i64,
}

/// Contact form submitted from inside a video session.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionForm {
    pub session_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub policy_number: String,
    #[serde(default)]
    pub message: String,
}

impl SessionForm {
    fn notes(&self) -> String {
        format!(
            "Phone: {}\nPolicy: {}\nMessage: {}",
            self.phone, self.policy_number, self.message
        )
    }
}

fn validate_geo(geo: &GeoSnapshot) -> Result<()> {
    if let Some(latitude) = geo.latitude {
        validate_latitude(latitude)?;
    }
    if let Some(longitude) = geo.longitude {
        validate_longitude(longitude)?;
    }
    if let Some(accuracy) = geo.accuracy_m {
        validate_non_negative("geo_accuracy_m", accuracy)?;
    }
    Ok(())
}

fn validate_duration(duration_sec: Option<i64>) -> Result<()> {
    match duration_sec {
        Some(d) if d < 0 => Err(VerificationError::Validation(format!(
            "duration_sec must be non-negative, got {}",
            d
        ))),
        _ => Ok(()),
    }
}

fn mime_or_default(content_type: Option<&str>) -> String {
    content_type
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_RECORDING_MIME)
        .to_string()
}

impl VerificationService {
    /// Link a stored recording to the meeting in `room_name`.
    #[instrument(skip(self, attachment), fields(room_name = %attachment.room_name))]
    pub async fn attach_recording(&self, attachment: RecordingAttachment) -> Result<Recording> {
        let meeting = meeting::get_meeting_by_room(self.pool(), &attachment.room_name).await?;
        validate_required("storage_key", &attachment.storage_key, 1024)?;
        validate_duration(attachment.duration_sec)?;
        validate_geo(&attachment.geo)?;

        let storage_url = attachment.storage_url.or_else(|| {
            self.storage()
                .map(|store| store.url_for(&attachment.storage_key))
        });

        let recording = recording::create_recording(
            self.pool(),
            &NewRecording {
                meeting_id: Some(meeting.id),
                storage_key: attachment.storage_key,
                storage_url,
                mime_type: mime_or_default(attachment.mime_type.as_deref()),
                duration_sec: attachment.duration_sec,
                geo: attachment.geo,
            },
        )
        .await?;

        info!(
            recording_id = recording.id,
            meeting_id = meeting.id,
            located = recording.geo().is_located(),
            "Recording attached"
        );
        Ok(recording)
    }

    /// Store an uploaded file and attach it to its meeting.
    ///
    /// Storage is on the critical path: without it the upload fails with
    /// `ServiceUnavailable` and nothing is written.
    #[instrument(skip(self, upload), fields(room_name = %upload.room_name, size = upload.data.len()))]
    pub async fn upload_recording(&self, upload: RecordingUpload) -> Result<Recording> {
        meeting::get_meeting_by_room(self.pool(), &upload.room_name).await?;
        if upload.filename.trim().is_empty() {
            return Err(VerificationError::Validation("No filename provided".to_string()));
        }
        validate_duration(upload.duration_sec)?;
        validate_geo(&upload.geo)?;

        let store = self.require_storage()?;
        let mime_type = mime_or_default(upload.content_type.as_deref());
        let key = store.recording_key(&upload.filename);
        let url = self
            .bounded("storage", store.put(&key, upload.data, &mime_type))
            .await?;

        self.attach_recording(RecordingAttachment {
            room_name: upload.room_name,
            storage_key: key,
            storage_url: Some(url),
            mime_type: Some(mime_type),
            duration_sec: upload.duration_sec,
            geo: upload.geo,
        })
        .await
    }

    /// Attach the recorder's artifact, then force the meeting to completed.
    pub async fn recording_webhook(&self, notice: RecordingWebhook) -> Result<WebhookOutcome> {
        let geo = notice.geo();
        let recording = self
            .attach_recording(RecordingAttachment {
                room_name: notice.room_name,
                storage_key: notice.storage_key,
                duration_sec: notice.duration_sec,
                geo,
                ..Default::default()
            })
            .await?;

        let meeting_id = recording.meeting_id.ok_or_else(|| {
            VerificationError::Internal(format!("recording {} has no meeting", recording.id))
        })?;
        let status_change = self.transition(meeting_id, MeetingStatus::Completed).await?;

        Ok(WebhookOutcome {
            recording,
            status_change,
        })
    }

    pub async fn get_recording(&self, id: i64) -> Result<Recording> {
        Ok(recording::get_recording(self.pool(), id).await?)
    }

    /// Recordings of a meeting, newest first. Unknown meetings yield an empty list.
    pub async fn recordings_for_meeting(&self, meeting_id: i64) -> Result<Vec<Recording>> {
        Ok(recording::list_recordings_for_meeting(self.pool(), meeting_id).await?)
    }

    /// Remove a recording row and, best effort, its stored object.
    pub async fn delete_recording(&self, id: i64) -> Result<DeletedRecording> {
        let recording = recording::delete_recording(self.pool(), id).await?;

        let object_deleted = match self.storage() {
            Some(store) => match self
                .bounded("storage", store.delete(&recording.storage_key))
                .await
            {
                Ok(deleted) => deleted,
                Err(e) => {
                    warn!(recording_id = id, key = %recording.storage_key, error = %e, "Failed to delete stored recording");
                    false
                }
            },
            None => false,
        };

        info!(recording_id = id, object_deleted, "Recording deleted");
        Ok(DeletedRecording {
            recording,
            object_deleted,
        })
    }

    /// Append a fix to a claim's geolocation log.
    pub async fn capture_geolocation(&self, capture: GeoCapture) -> Result<Geolocation> {
        claim::get_claim(self.pool(), capture.claim_id).await?;

        let source = capture
            .source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_GEO_SOURCE)
            .to_string();

        let geo = geolocation::create_geolocation(
            self.pool(),
            &NewGeolocation {
                claim_id: capture.claim_id,
                latitude: capture.latitude,
                longitude: capture.longitude,
                accuracy: capture.accuracy,
                timestamp: capture.timestamp,
                source,
                metadata: capture.metadata.map(|m| m.to_string()),
            },
        )
        .await?;

        info!(claim_id = geo.claim_id, geolocation_id = geo.id, "Geolocation captured");
        Ok(geo)
    }

    /// Most recent fix for a claim. NotFound when the log is empty.
    pub async fn latest_geolocation(&self, claim_id: i64) -> Result<Geolocation> {
        claim::get_claim(self.pool(), claim_id).await?;
        geolocation::latest_for_claim(self.pool(), claim_id)
            .await?
            .ok_or_else(|| VerificationError::not_found("Geolocation", format!("claim {}", claim_id)))
    }

    /// A claim's full log, newest first, with its size.
    pub async fn list_geolocations(&self, claim_id: i64) -> Result<GeolocationList> {
        claim::get_claim(self.pool(), claim_id).await?;
        let geolocations = geolocation::list_for_claim(self.pool(), claim_id).await?;
        let total_count = geolocation::count_for_claim(self.pool(), claim_id).await?;
        Ok(GeolocationList {
            geolocations,
            total_count,
        })
    }

    pub async fn get_geolocation(&self, id: i64) -> Result<Geolocation> {
        Ok(geolocation::get_geolocation(self.pool(), id).await?)
    }

    /// Record a standalone form submission.
    pub async fn create_form(&self, form: NewFormSubmission) -> Result<FormSubmission> {
        Ok(form_submission::create_form_submission(self.pool(), &form).await?)
    }

    /// Record a form submitted from a session, linked to that session's claim.
    pub async fn submit_session_form(&self, form: SessionForm) -> Result<FormSubmission> {
        let meeting = meeting::get_meeting_by_session(self.pool(), &form.session_id).await?;
        validate_required("phone", &form.phone, MAX_NAME_LENGTH)?;

        let submission = form_submission::create_form_submission(
            self.pool(),
            &NewFormSubmission {
                full_name: form.full_name.clone(),
                email: form.email.clone(),
                notes: Some(form.notes()),
                geo: GeoSnapshot::default(),
                claim_id: meeting.claim_id,
            },
        )
        .await?;

        info!(form_id = submission.id, session_id = %form.session_id, "Session form submitted");
        Ok(submission)
    }

    pub async fn list_forms(&self) -> Result<Vec<FormSubmission>> {
        Ok(form_submission::list_form_submissions(self.pool()).await?)
    }
}
