//! Operator registration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use database::{user, User};
use serde::Deserialize;

use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
}

/// Register a user. The password hash is never returned.
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<UserCreate>,
) -> Result<(StatusCode, Json<User>)> {
    let user = user::create_user(state.db.pool(), &body.email, &body.password).await?;
    tracing::info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}
