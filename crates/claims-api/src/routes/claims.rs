//! Claim CRUD.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::validation::{validate_required, MAX_NAME_LENGTH};
use database::{claim, Claim, DatabaseError, NewClaim};
use serde::Deserialize;

use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClaimCreate {
    #[serde(flatten)]
    pub claim: NewClaim,
    /// Owner; defaults to the configured claim owner.
    #[serde(default)]
    pub user_id: Option<i64>,
}

pub async fn create_claim(
    State(state): State<AppState>,
    Json(body): Json<ClaimCreate>,
) -> Result<(StatusCode, Json<Claim>)> {
    let owner = body.user_id.unwrap_or(state.default_claim_owner_id);
    let created = claim::create_claim(state.db.pool(), owner, &body.claim).await?;
    tracing::info!(claim_id = created.id, claim_number = %created.claim_number, "Claim created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_claims(State(state): State<AppState>) -> Result<Json<Vec<Claim>>> {
    Ok(Json(claim::list_claims(state.db.pool()).await?))
}

pub async fn get_claim(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Claim>> {
    Ok(Json(claim::get_claim(state.db.pool(), id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ClaimUpdate {
    #[serde(flatten)]
    pub claim: NewClaim,
    /// Operator-controlled status; left unchanged when absent.
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn update_claim(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ClaimUpdate>,
) -> Result<Json<Claim>> {
    if let Some(status) = &body.status {
        validate_required("status", status, MAX_NAME_LENGTH).map_err(DatabaseError::from)?;
    }

    let pool = state.db.pool();
    let updated = claim::update_claim(pool, id, &body.claim).await?;
    let Some(status) = body.status else {
        return Ok(Json(updated));
    };

    claim::update_claim_status(pool, id, &status).await?;
    tracing::info!(claim_id = id, status = %status.trim(), "Claim status updated");
    Ok(Json(claim::get_claim(pool, id).await?))
}

pub async fn delete_claim(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    claim::delete_claim(state.db.pool(), id).await?;
    tracing::info!(claim_id = id, "Claim deleted");
    Ok(StatusCode::NO_CONTENT)
}
