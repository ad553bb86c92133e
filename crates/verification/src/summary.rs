//! Verification status derivation.
//!
//! A claim is VERIFIED once one of its meetings has completed and at least
//! one recording exists across its meetings. Geolocation is reported from
//! the recordings' own snapshots only; the separate geolocation log does not
//! feed the status.

use std::fmt;

use database::{claim, meeting, recording, Claim, Meeting, MeetingStatus, Recording};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::service::VerificationService;

/// Derived compliance state of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerificationStatus {
    Verified,
    Pending,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Verified => "VERIFIED",
            VerificationStatus::Pending => "PENDING",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence flags computed from a claim's meetings and recordings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VerificationFlags {
    pub has_completed_meeting: bool,
    pub has_recording: bool,
    pub has_geolocation: bool,
}

impl VerificationFlags {
    pub fn status(&self) -> VerificationStatus {
        if self.has_completed_meeting && self.has_recording {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Pending
        }
    }
}

/// Compute the evidence flags.
pub fn derive_flags(meetings: &[Meeting], recordings: &[Recording]) -> VerificationFlags {
    VerificationFlags {
        has_completed_meeting: meetings
            .iter()
            .any(|m| m.status == MeetingStatus::Completed),
        has_recording: !recordings.is_empty(),
        has_geolocation: recordings.iter().any(|r| r.geo().is_located()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeetingSnapshot {
    pub session_id: String,
    pub status: MeetingStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordingSnapshot {
    pub id: i64,
    pub storage_url: Option<String>,
    pub duration_sec: Option<i64>,
    pub created_at: String,
}

/// Verification overview of one claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimSummary {
    pub claim: Claim,
    pub meetings_count: usize,
    pub recordings_count: usize,
    pub verification_status: VerificationStatus,
    #[serde(flatten)]
    pub flags: VerificationFlags,
    pub latest_meeting: Option<MeetingSnapshot>,
    pub latest_recording: Option<RecordingSnapshot>,
}

/// Claim evidence as loaded from the store.
#[derive(Debug, Clone)]
pub(crate) struct ClaimEvidence {
    pub claim: Claim,
    /// Newest first.
    pub meetings: Vec<Meeting>,
    /// Grouped by meeting in `meetings` order, newest first within each.
    pub recordings: Vec<Recording>,
}

pub(crate) async fn load_evidence(pool: &SqlitePool, claim_id: i64) -> Result<ClaimEvidence> {
    let claim = claim::get_claim(pool, claim_id).await?;
    let meetings = meeting::list_meetings_for_claim(pool, claim_id).await?;

    let mut recordings = Vec::new();
    for m in &meetings {
        recordings.extend(recording::list_recordings_for_meeting(pool, m.id).await?);
    }

    Ok(ClaimEvidence {
        claim,
        meetings,
        recordings,
    })
}

/// Summarize a claim's verification state.
pub async fn summarize(pool: &SqlitePool, claim_id: i64) -> Result<ClaimSummary> {
    let evidence = load_evidence(pool, claim_id).await?;
    Ok(summary_from(evidence))
}

fn summary_from(evidence: ClaimEvidence) -> ClaimSummary {
    let flags = derive_flags(&evidence.meetings, &evidence.recordings);

    ClaimSummary {
        meetings_count: evidence.meetings.len(),
        recordings_count: evidence.recordings.len(),
        verification_status: flags.status(),
        flags,
        latest_meeting: evidence.meetings.first().map(|m| MeetingSnapshot {
            session_id: m.session_id.clone(),
            status: m.status,
            created_at: m.created_at.clone(),
        }),
        latest_recording: evidence.recordings.first().map(|r| RecordingSnapshot {
            id: r.id,
            storage_url: r.storage_url.clone(),
            duration_sec: r.duration_sec,
            created_at: r.created_at.clone(),
        }),
        claim: evidence.claim,
    }
}

impl VerificationService {
    /// See [`summarize`].
    pub async fn summarize(&self, claim_id: i64) -> Result<ClaimSummary> {
        summarize(self.pool(), claim_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VerificationConfig;
    use crate::error::VerificationError;
    use crate::lifecycle::MeetingRequest;
    use crate::linker::{RecordingAttachment, RecordingWebhook};
    use crate::testing::db_with_claim;
    use database::GeoSnapshot;

    fn meeting_with(status: MeetingStatus) -> Meeting {
        Meeting {
            id: 1,
            room_name: "room-a".to_string(),
            session_id: "sess-a".to_string(),
            claim_id: Some(1),
            patient_name: None,
            procedure: None,
            moderator_url: None,
            patient_url: None,
            status,
            created_at: "2025-03-01 10:00:00.000".to_string(),
        }
    }

    fn recording_with(geo: GeoSnapshot) -> Recording {
        Recording {
            id: 1,
            meeting_id: Some(1),
            storage_key: "a.mp4".to_string(),
            storage_url: None,
            mime_type: "video/mp4".to_string(),
            duration_sec: Some(120),
            latitude: geo.latitude,
            longitude: geo.longitude,
            geo_accuracy_m: geo.accuracy_m,
            created_at: "2025-03-01 10:05:00.000".to_string(),
        }
    }

    #[test]
    fn test_no_meetings_is_pending() {
        let flags = derive_flags(&[], &[]);
        assert_eq!(flags, VerificationFlags::default());
        assert_eq!(flags.status(), VerificationStatus::Pending);
    }

    #[test]
    fn test_completed_without_recording_is_pending() {
        let flags = derive_flags(&[meeting_with(MeetingStatus::Completed)], &[]);
        assert!(flags.has_completed_meeting);
        assert_eq!(flags.status(), VerificationStatus::Pending);
    }

    #[test]
    fn test_recording_without_completion_is_pending() {
        let flags = derive_flags(
            &[meeting_with(MeetingStatus::Active)],
            &[recording_with(GeoSnapshot::default())],
        );
        assert_eq!(flags.status(), VerificationStatus::Pending);
    }

    #[test]
    fn test_geolocation_needs_both_coordinates() {
        let half = GeoSnapshot {
            latitude: Some(41.88),
            longitude: None,
            accuracy_m: Some(5.0),
        };
        let full = GeoSnapshot {
            latitude: Some(41.88),
            longitude: Some(-87.63),
            accuracy_m: None,
        };
        let meetings = [meeting_with(MeetingStatus::Completed)];

        let flags = derive_flags(&meetings, &[recording_with(half)]);
        assert!(!flags.has_geolocation);
        assert_eq!(flags.status(), VerificationStatus::Verified);

        let flags = derive_flags(&meetings, &[recording_with(half), recording_with(full)]);
        assert!(flags.has_geolocation);
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&VerificationStatus::Verified).unwrap(),
            "\"VERIFIED\""
        );
    }

    #[tokio::test]
    async fn test_unknown_claim() {
        let (db, claim_id) = db_with_claim().await;
        let result = summarize(db.pool(), claim_id + 1).await;
        assert!(matches!(result, Err(VerificationError::NotFound { entity: "Claim", .. })));
    }

    #[tokio::test]
    async fn test_claim_without_meetings() {
        let (db, claim_id) = db_with_claim().await;
        let summary = summarize(db.pool(), claim_id).await.unwrap();
        assert_eq!(summary.verification_status, VerificationStatus::Pending);
        assert_eq!(summary.meetings_count, 0);
        assert_eq!(summary.recordings_count, 0);
        assert!(summary.latest_meeting.is_none());
        assert!(summary.latest_recording.is_none());
    }

    #[tokio::test]
    async fn test_end_to_end_verified() {
        let (db, claim_id) = db_with_claim().await;
        let service = VerificationService::new(db.pool().clone(), VerificationConfig::default());

        let created = service
            .create_meeting(MeetingRequest {
                claim_ref: Some("CLM-001".to_string()),
                patient_name: Some("Jane Roe".to_string()),
                procedure: None,
            })
            .await
            .unwrap();
        assert_eq!(created.meeting.status, MeetingStatus::Pending);
        service.mark_active(&created.meeting.session_id).await.unwrap();

        service
            .attach_recording(RecordingAttachment {
                room_name: created.meeting.room_name.clone(),
                storage_key: "recordings/a.mp4".to_string(),
                duration_sec: Some(120),
                geo: GeoSnapshot {
                    latitude: Some(41.88),
                    longitude: Some(-87.63),
                    accuracy_m: None,
                },
                ..Default::default()
            })
            .await
            .unwrap();

        let pending = service.summarize(claim_id).await.unwrap();
        assert_eq!(pending.verification_status, VerificationStatus::Pending);

        service
            .recording_webhook(RecordingWebhook {
                room_name: created.meeting.room_name.clone(),
                storage_key: "recordings/b.mp4".to_string(),
                duration_sec: Some(120),
                ..Default::default()
            })
            .await
            .unwrap();

        let summary = service.summarize(claim_id).await.unwrap();
        assert_eq!(summary.verification_status, VerificationStatus::Verified);
        assert_eq!(summary.meetings_count, 1);
        assert_eq!(summary.recordings_count, 2);
        assert!(summary.flags.has_geolocation);
        assert_eq!(
            summary.latest_meeting.as_ref().map(|m| m.status),
            Some(MeetingStatus::Completed)
        );
        assert_eq!(summary.latest_recording.map(|r| r.duration_sec), Some(Some(120)));

        let json = serde_json::to_value(&service.summarize(claim_id).await.unwrap()).unwrap();
        assert_eq!(json["verification_status"], "VERIFIED");
        assert_eq!(json["has_geolocation"], true);
        assert_eq!(json["claim"]["claim_number"], "CLM-001");
    }

    #[tokio::test]
    async fn test_located_webhook_alone_verifies_claim() {
        let (db, claim_id) = db_with_claim().await;
        let service = VerificationService::new(db.pool().clone(), VerificationConfig::default());
        let created = service
            .create_meeting(MeetingRequest {
                claim_ref: Some("CLM-001".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        service.mark_active(&created.meeting.session_id).await.unwrap();

        let outcome = service
            .recording_webhook(RecordingWebhook {
                room_name: created.meeting.room_name.clone(),
                storage_key: "recordings/call.mp4".to_string(),
                duration_sec: Some(120),
                latitude: Some(41.88),
                longitude: Some(-87.63),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(outcome.recording.latitude, Some(41.88));
        assert_eq!(outcome.recording.longitude, Some(-87.63));

        let summary = service.summarize(claim_id).await.unwrap();
        assert_eq!(summary.verification_status, VerificationStatus::Verified);
        assert_eq!(summary.meetings_count, 1);
        assert_eq!(summary.recordings_count, 1);
        assert!(summary.flags.has_geolocation);
    }

    #[tokio::test]
    async fn test_webhook_rejects_out_of_range_coordinates() {
        let (db, _) = db_with_claim().await;
        let service = VerificationService::new(db.pool().clone(), VerificationConfig::default());
        let created = service
            .create_meeting(MeetingRequest {
                claim_ref: Some("CLM-001".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let result = service
            .recording_webhook(RecordingWebhook {
                room_name: created.meeting.room_name,
                storage_key: "recordings/call.mp4".to_string(),
                latitude: Some(91.0),
                longitude: Some(-87.63),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(VerificationError::Validation(_))));
    }

    #[tokio::test]
    async fn test_geolocation_log_does_not_count() {
        let (db, claim_id) = db_with_claim().await;
        let service = VerificationService::new(db.pool().clone(), VerificationConfig::default());
        let created = service
            .create_meeting(MeetingRequest {
                claim_ref: Some("CLM-001".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        service
            .recording_webhook(RecordingWebhook {
                room_name: created.meeting.room_name,
                storage_key: "recordings/a.mp4".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        service
            .capture_geolocation(crate::linker::GeoCapture {
                claim_id,
                latitude: 41.88,
                longitude: -87.63,
                accuracy: None,
                source: None,
                metadata: None,
                timestamp: None,
            })
            .await
            .unwrap();

        let summary = service.summarize(claim_id).await.unwrap();
        assert_eq!(summary.verification_status, VerificationStatus::Verified);
        assert!(!summary.flags.has_geolocation);
    }
}
