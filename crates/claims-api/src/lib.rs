//! HTTP API for claim verification.
//!
//! Thin axum handlers over [`verification::VerificationService`]; every
//! workflow rule lives in that crate. See [`routes::router`] for the
//! route table.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{Config, ConfigError};
pub use error::{ApiError, Result};
pub use state::AppState;

/// Build the application with CORS and request tracing.
///
/// An empty origin list, or one containing `*`, allows any origin.
pub fn app(state: AppState, cors_origins: &[String]) -> Router {
    routes::router()
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(allowed)
}
