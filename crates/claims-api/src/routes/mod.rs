//! HTTP routes.

mod claims;
mod forms;
mod geolocation;
mod health;
mod meetings;
mod recordings;
mod users;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Largest accepted recording upload.
pub const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        // Users and claims
        .route("/api/users", post(users::create_user))
        .route("/api/claims", post(claims::create_claim).get(claims::list_claims))
        .route(
            "/api/claims/:id",
            get(claims::get_claim)
                .put(claims::update_claim)
                .delete(claims::delete_claim),
        )
        // Video sessions
        .route("/api/meetings/video-call/create", post(meetings::create_video_call))
        .route(
            "/api/meetings/video-call/status/:session_id",
            get(meetings::video_call_status),
        )
        .route(
            "/api/meetings/video-call/start/:session_id",
            post(meetings::start_video_call),
        )
        .route(
            "/api/meetings/video-call/complete/:session_id",
            post(meetings::complete_video_call),
        )
        .route("/api/meetings/send-sms", post(meetings::send_sms))
        .route("/api/meetings/token", post(meetings::issue_token))
        // Recordings
        .route(
            "/api/recordings/upload",
            post(recordings::upload_recording).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/recordings/webhook", post(recordings::recording_webhook))
        .route(
            "/api/recordings/meeting/:meeting_id",
            get(recordings::recordings_for_meeting),
        )
        .route(
            "/api/recordings/:id",
            get(recordings::get_recording).delete(recordings::delete_recording),
        )
        // Geolocation log
        .route("/api/geolocation/capture", post(geolocation::capture))
        .route("/api/geolocation/claim/:claim_id", get(geolocation::list_for_claim))
        .route(
            "/api/geolocation/claim/:claim_id/latest",
            get(geolocation::latest_for_claim),
        )
        .route("/api/geolocation/:id", get(geolocation::get_geolocation))
        // Forms and reports
        .route("/api/forms", post(forms::create_form).get(forms::list_forms))
        .route("/api/forms/pdf", get(forms::submissions_pdf))
        .route("/api/forms/send-email", post(forms::send_submissions_email))
        .route("/api/forms/submit", post(forms::submit_session_form))
        .route("/api/forms/generate-report", post(forms::generate_report))
        .route("/api/forms/claim-summary/:claim_id", get(forms::claim_summary))
}
