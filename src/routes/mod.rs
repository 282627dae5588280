//! Routers per area, merged into the application router.

mod common;
mod games;

pub use common::common_routes;
pub use games::{game_routes, rulebook_routes};

use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

/// Request bodies above this size are rejected with 413.
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Full application: health, settings, games and rulebooks.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(game_routes(state.clone()))
        .merge(rulebook_routes(state))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
}
