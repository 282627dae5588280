//! Common routes: health probes and settings info.

use crate::handlers::health::health;
use crate::handlers::settings::info;
use crate::state::AppState;
use axum::{routing::get, Router};

/// GET /health, /health/ready, /health/live, /info.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(health))
        .route("/health/live", get(health))
        .route("/info", get(info))
        .with_state(state)
}
