//! Video session endpoints.

use axum::extract::{Path, State};
use axum::Json;
use database::MeetingStatus;
use serde::{Deserialize, Serialize};
use verification::{IssuedToken, MeetingRequest, SmsOutcome, StatusChange};

use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCallCreate {
    #[serde(default, alias = "claim_id")]
    pub claim_id: Option<String>,
    #[serde(default, alias = "patient_name")]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub procedure: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCallCreated {
    pub success: bool,
    pub session_id: String,
    pub room_name: String,
    /// Moderator join link.
    pub room_url: String,
    pub patient_url: String,
    pub sms_sent: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCallStatus {
    pub session_id: String,
    pub status: MeetingStatus,
    pub room_name: String,
    pub created_at: String,
    pub patient_name: Option<String>,
    pub procedure: Option<String>,
    pub patient_url: Option<String>,
    pub room_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCallTransition {
    pub message: String,
    pub session_id: String,
    pub previous_status: MeetingStatus,
    pub status: MeetingStatus,
}

impl VideoCallTransition {
    fn new(session_id: String, change: StatusChange, verb: &str) -> Self {
        Self {
            message: format!("Video call {}", verb),
            session_id,
            previous_status: change.from,
            status: change.to,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SmsRequest {
    pub phone_number: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub room_name: String,
    #[serde(default)]
    pub user_name: Option<String>,
    /// Defaults to a moderator token.
    #[serde(default)]
    pub moderator: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub app_id: String,
    pub room_name: String,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            app_id: issued.app_id,
            room_name: issued.room_name,
        }
    }
}

pub async fn create_video_call(
    State(state): State<AppState>,
    Json(body): Json<VideoCallCreate>,
) -> Result<Json<VideoCallCreated>> {
    let created = state
        .service
        .create_meeting(MeetingRequest {
            claim_ref: body.claim_id,
            patient_name: body.patient_name,
            procedure: body.procedure,
        })
        .await?;

    let message = if created.sms_sent {
        "Video call created and SMS sent to patient"
    } else {
        "Video call created"
    };

    Ok(Json(VideoCallCreated {
        success: true,
        session_id: created.meeting.session_id,
        room_name: created.meeting.room_name,
        room_url: created.moderator_url,
        patient_url: created.patient_url,
        sms_sent: created.sms_sent,
        message: message.to_string(),
    }))
}

pub async fn video_call_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<VideoCallStatus>> {
    let meeting = state.service.meeting_status(&session_id).await?;
    Ok(Json(VideoCallStatus {
        session_id: meeting.session_id,
        status: meeting.status,
        room_name: meeting.room_name,
        created_at: meeting.created_at,
        patient_name: meeting.patient_name,
        procedure: meeting.procedure,
        patient_url: meeting.patient_url,
        room_url: meeting.moderator_url,
    }))
}

pub async fn start_video_call(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<VideoCallTransition>> {
    let change = state.service.mark_active(&session_id).await?;
    Ok(Json(VideoCallTransition::new(session_id, change, "started")))
}

pub async fn complete_video_call(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<VideoCallTransition>> {
    let change = state.service.mark_completed(&session_id).await?;
    Ok(Json(VideoCallTransition::new(session_id, change, "completed")))
}

/// Free-form SMS. Always 200; `success` reports the gateway outcome.
pub async fn send_sms(
    State(state): State<AppState>,
    Json(body): Json<SmsRequest>,
) -> Json<SmsOutcome> {
    Json(state.service.send_sms(&body.phone_number, &body.message).await)
}

pub async fn issue_token(
    State(state): State<AppState>,
    Json(body): Json<TokenRequest>,
) -> Result<Json<TokenResponse>> {
    let name = body
        .user_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(verification::lifecycle::MODERATOR_NAME);
    let issued = state
        .service
        .issue_token(&body.room_name, name, body.moderator.unwrap_or(true))?;
    Ok(Json(issued.into()))
}
