//! Game and rulebook routes.

use crate::handlers::{games, rulebooks};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};

pub fn game_routes(state: AppState) -> Router {
    Router::new()
        .route("/games", get(games::list).post(games::create))
        .route("/games/", get(games::list).post(games::create))
        .route("/games/search", get(games::search))
        .route("/games/count", get(games::count))
        .route(
            "/games/:id",
            get(games::read).put(games::update).delete(games::delete),
        )
        .route("/games/:id/rulebooks", get(games::rulebooks))
        .with_state(state)
}

pub fn rulebook_routes(state: AppState) -> Router {
    Router::new()
        .route("/rulebooks", post(rulebooks::create))
        .route("/rulebooks/:id", get(rulebooks::read).delete(rulebooks::delete))
        .with_state(state)
}
