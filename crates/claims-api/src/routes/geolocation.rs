//! Geolocation log endpoints.

use axum::extract::{Path, State};
use axum::Json;
use database::Geolocation;
use verification::{GeoCapture, GeolocationList};

use crate::error::Result;
use crate::state::AppState;

pub async fn capture(
    State(state): State<AppState>,
    Json(body): Json<GeoCapture>,
) -> Result<Json<Geolocation>> {
    Ok(Json(state.service.capture_geolocation(body).await?))
}

pub async fn list_for_claim(
    State(state): State<AppState>,
    Path(claim_id): Path<i64>,
) -> Result<Json<GeolocationList>> {
    Ok(Json(state.service.list_geolocations(claim_id).await?))
}

pub async fn latest_for_claim(
    State(state): State<AppState>,
    Path(claim_id): Path<i64>,
) -> Result<Json<Geolocation>> {
    Ok(Json(state.service.latest_geolocation(claim_id).await?))
}

pub async fn get_geolocation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Geolocation>> {
    Ok(Json(state.service.get_geolocation(id).await?))
}
