//! Form submissions, claim summaries and report delivery.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use database::{FormSubmission, GeoSnapshot, NewFormSubmission};
use serde::{Deserialize, Serialize};
use verification::{ClaimSummary, PatientForm, ReportDelivery, SessionForm};

use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FormCreate {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub geo_accuracy_m: Option<f64>,
    #[serde(default)]
    pub claim_id: Option<i64>,
}

impl From<FormCreate> for NewFormSubmission {
    fn from(form: FormCreate) -> Self {
        Self {
            full_name: form.full_name,
            email: form.email,
            notes: form.notes,
            geo: GeoSnapshot {
                latitude: form.latitude,
                longitude: form.longitude,
                accuracy_m: form.geo_accuracy_m,
            },
            claim_id: form.claim_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FormCreated {
    pub ok: bool,
    pub id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct SendEmail {
    #[serde(default)]
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmailSent {
    pub ok: bool,
    pub recipient: String,
}

#[derive(Debug, Serialize)]
pub struct SessionFormSubmitted {
    pub success: bool,
    pub form_id: i64,
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub claim_id: i64,
    #[serde(default)]
    pub recipient_email: Option<String>,
    #[serde(default)]
    pub form_data: Option<PatientForm>,
}

#[derive(Debug, Serialize)]
pub struct ReportSent {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub delivery: ReportDelivery,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: ClaimSummary,
}

pub async fn create_form(
    State(state): State<AppState>,
    Json(body): Json<FormCreate>,
) -> Result<(StatusCode, Json<FormCreated>)> {
    let form = state.service.create_form(body.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(FormCreated {
            ok: true,
            id: form.id,
        }),
    ))
}

pub async fn list_forms(State(state): State<AppState>) -> Result<Json<Vec<FormSubmission>>> {
    Ok(Json(state.service.list_forms().await?))
}

pub async fn submissions_pdf(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let document = state.service.submissions_document().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "attachment; filename=submissions.pdf"),
        ],
        document,
    ))
}

/// Email the submissions PDF. The body, and its `to`, are optional.
pub async fn send_submissions_email(
    State(state): State<AppState>,
    body: Option<Json<SendEmail>>,
) -> Result<Json<EmailSent>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let recipient = state.service.email_submissions(body.to.as_deref()).await?;
    Ok(Json(EmailSent {
        ok: true,
        recipient,
    }))
}

pub async fn submit_session_form(
    State(state): State<AppState>,
    Json(body): Json<SessionForm>,
) -> Result<Json<SessionFormSubmitted>> {
    let session_id = body.session_id.clone();
    let form = state.service.submit_session_form(body).await?;
    Ok(Json(SessionFormSubmitted {
        success: true,
        form_id: form.id,
        session_id,
        message: "Form submitted successfully".to_string(),
    }))
}

pub async fn generate_report(
    State(state): State<AppState>,
    Json(body): Json<ReportRequest>,
) -> Result<Json<ReportSent>> {
    let delivery = state
        .service
        .generate_and_send_claim_report(
            body.claim_id,
            body.recipient_email.as_deref(),
            body.form_data,
        )
        .await?;

    Ok(Json(ReportSent {
        success: true,
        message: format!("Report sent to {}", delivery.recipient),
        delivery,
    }))
}

pub async fn claim_summary(
    State(state): State<AppState>,
    Path(claim_id): Path<i64>,
) -> Result<Json<SummaryResponse>> {
    let summary = state.service.summarize(claim_id).await?;
    Ok(Json(SummaryResponse {
        success: true,
        summary,
    }))
}
