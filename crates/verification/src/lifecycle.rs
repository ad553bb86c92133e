//! Session lifecycle: meeting creation, join links and status transitions.

use database::{claim, meeting, Claim, Meeting, MeetingStatus, NewMeeting};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{Result, VerificationError};
use crate::service::VerificationService;

/// Display name used on the moderator token.
pub const MODERATOR_NAME: &str = "Moderator";

const DEFAULT_PATIENT_NAME: &str = "Patient";
const DEFAULT_PROCEDURE: &str = "Medical Verification";

/// Input for [`VerificationService::create_meeting`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeetingRequest {
    /// Claim number the call verifies.
    pub claim_ref: Option<String>,
    pub patient_name: Option<String>,
    pub procedure: Option<String>,
}

/// A freshly created meeting with its join links.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedMeeting {
    pub meeting: Meeting,
    pub moderator_url: String,
    pub patient_url: String,
    #[serde(skip)]
    pub moderator_token: Option<String>,
    #[serde(skip)]
    pub patient_token: Option<String>,
    /// Whether the patient invitation SMS was accepted by the gateway.
    pub sms_sent: bool,
}

/// A recorded status move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub meeting_id: i64,
    pub from: MeetingStatus,
    pub to: MeetingStatus,
}

impl StatusChange {
    /// True when the move goes backwards in pending → active → completed.
    pub fn is_regression(&self) -> bool {
        self.to.rank() < self.from.rank()
    }
}

/// Result of a best-effort SMS send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmsOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub message: String,
}

/// A signed room token for a single participant.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub app_id: String,
    pub room_name: String,
}

impl VerificationService {
    /// Create a meeting, optionally tied to a claim, and invite the patient.
    ///
    /// The meeting row is committed before the SMS is attempted, and an SMS
    /// failure only clears `sms_sent`.
    #[instrument(skip(self, request), fields(claim_ref = ?request.claim_ref))]
    pub async fn create_meeting(&self, request: MeetingRequest) -> Result<CreatedMeeting> {
        let claim_ref = request
            .claim_ref
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());

        let claim = match claim_ref {
            Some(r) if self.config().is_demo_claim(r) => {
                debug!(claim_ref = %r, "Demo claim reference, skipping lookup");
                None
            }
            Some(r) => Some(claim::get_claim_by_number(self.pool(), r).await?),
            None => None,
        };

        let room_name = room_name_for(claim_ref);
        let patient_name = request
            .patient_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let moderator_token = self.try_issue_token(&room_name, MODERATOR_NAME, true);
        let patient_token =
            self.try_issue_token(&room_name, patient_name.unwrap_or(DEFAULT_PATIENT_NAME), false);

        let base_url = self.config().meeting_base_url();
        let moderator_url = join_url(&base_url, &room_name, moderator_token.as_deref());
        let patient_url = join_url(&base_url, &room_name, patient_token.as_deref());

        let new_meeting = NewMeeting {
            room_name,
            session_id: Uuid::new_v4().to_string(),
            claim_id: claim.as_ref().map(|c| c.id),
            patient_name: patient_name.map(str::to_string),
            procedure: request.procedure.clone(),
            moderator_url: Some(moderator_url.clone()),
            patient_url: Some(patient_url.clone()),
        };
        let meeting = meeting::create_meeting(self.pool(), &new_meeting).await?;

        info!(
            meeting_id = meeting.id,
            room_name = %meeting.room_name,
            session_id = %meeting.session_id,
            "Meeting created"
        );

        let sms_sent = match &claim {
            Some(claim) => {
                let body = invitation_text(
                    claim,
                    patient_name,
                    &patient_url,
                    request.procedure.as_deref(),
                );
                self.invite_patient(claim, &body).await
            }
            None => false,
        };

        Ok(CreatedMeeting {
            meeting,
            moderator_url,
            patient_url,
            moderator_token,
            patient_token,
            sms_sent,
        })
    }

    /// Look up a meeting by session id.
    pub async fn meeting_status(&self, session_id: &str) -> Result<Meeting> {
        Ok(meeting::get_meeting_by_session(self.pool(), session_id).await?)
    }

    /// Mark the session's meeting as started.
    pub async fn mark_active(&self, session_id: &str) -> Result<StatusChange> {
        let meeting = meeting::get_meeting_by_session(self.pool(), session_id).await?;
        self.transition(meeting.id, MeetingStatus::Active).await
    }

    /// Mark the session's meeting as finished.
    pub async fn mark_completed(&self, session_id: &str) -> Result<StatusChange> {
        let meeting = meeting::get_meeting_by_session(self.pool(), session_id).await?;
        self.transition(meeting.id, MeetingStatus::Completed).await
    }

    /// Move a meeting to `to`. Every status write goes through here.
    ///
    /// Any state may move to any other. Backward moves are logged at warn.
    pub async fn transition(&self, meeting_id: i64, to: MeetingStatus) -> Result<StatusChange> {
        let from = meeting::set_meeting_status(self.pool(), meeting_id, to).await?;
        let change = StatusChange {
            meeting_id,
            from,
            to,
        };

        if change.is_regression() {
            warn!(meeting_id, from = %from, to = %to, "Meeting status moved backwards");
        } else {
            info!(meeting_id, from = %from, to = %to, "Meeting status changed");
        }

        Ok(change)
    }

    /// Send a free-form SMS. Never fails; the outcome says what happened.
    #[instrument(skip(self, body))]
    pub async fn send_sms(&self, to: &str, body: &str) -> SmsOutcome {
        let Some(sms) = self.sms() else {
            return SmsOutcome {
                success: false,
                message_id: None,
                message: "SMS not configured".to_string(),
            };
        };

        match self.bounded("sms", sms.send_text(to, body)).await {
            Ok(message_id) => {
                info!(message_id = %message_id, "SMS sent");
                SmsOutcome {
                    success: true,
                    message_id: Some(message_id),
                    message: "SMS sent successfully".to_string(),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to send SMS");
                SmsOutcome {
                    success: false,
                    message_id: None,
                    message: e.to_string(),
                }
            }
        }
    }

    /// Issue a token for one participant of `room_name`.
    pub fn issue_token(
        &self,
        room_name: &str,
        participant_name: &str,
        is_moderator: bool,
    ) -> Result<IssuedToken> {
        if room_name.trim().is_empty() {
            return Err(VerificationError::Validation("room name is required".to_string()));
        }
        let issuer = self.token_issuer().ok_or_else(|| {
            VerificationError::ServiceUnavailable("token issuer not configured".to_string())
        })?;

        let token = issuer
            .issue_token(room_name, participant_name, is_moderator)
            .map_err(|e| VerificationError::ServiceUnavailable(e.to_string()))?;

        Ok(IssuedToken {
            token,
            app_id: issuer.app_id().to_string(),
            room_name: room_name.to_string(),
        })
    }

    fn try_issue_token(&self, room_name: &str, name: &str, is_moderator: bool) -> Option<String> {
        let issuer = self.token_issuer()?;
        match issuer.issue_token(room_name, name, is_moderator) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(room_name, is_moderator, error = %e, "Token issuance failed, continuing without");
                None
            }
        }
    }

    async fn invite_patient(&self, claim: &Claim, body: &str) -> bool {
        let mobile = claim.patient_mobile.trim();
        if mobile.is_empty() {
            return false;
        }
        let Some(sms) = self.sms() else {
            debug!(claim_id = claim.id, "SMS not configured, skipping invitation");
            return false;
        };

        match self.bounded("sms", sms.send_text(mobile, body)).await {
            Ok(message_id) => {
                info!(claim_id = claim.id, message_id = %message_id, "Invitation SMS sent");
                true
            }
            Err(e) => {
                warn!(claim_id = claim.id, error = %e, "Invitation SMS failed");
                false
            }
        }
    }
}

/// `claim-{slug}-{uuid}` for claim calls, `room-{uuid}` otherwise.
fn room_name_for(claim_ref: Option<&str>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    match claim_ref.map(slug).filter(|s| !s.is_empty()) {
        Some(slug) => format!("claim-{}-{}", slug, suffix),
        None => format!("room-{}", suffix),
    }
}

fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

fn join_url(base_url: &str, room_name: &str, token: Option<&str>) -> String {
    match token {
        Some(token) => format!("{}/{}?jwt={}", base_url, room_name, token),
        None => format!("{}/{}", base_url, room_name),
    }
}

fn invitation_text(
    claim: &Claim,
    patient_name: Option<&str>,
    patient_url: &str,
    procedure: Option<&str>,
) -> String {
    format!(
        "Video Verification\n\n\
         Hello {name},\n\n\
         Please join your video verification call for claim {claim}:\n\n\
         Meeting Link: {url}\n\n\
         Procedure: {procedure}\n\n\
         Please join as soon as possible. The call will be recorded for verification purposes.\n\n\
         If you have any issues, please contact support.",
        name = patient_name.unwrap_or(DEFAULT_PATIENT_NAME),
        claim = claim.claim_number,
        url = patient_url,
        procedure = procedure
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PROCEDURE),
    )
}
