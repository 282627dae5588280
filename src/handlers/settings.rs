//! Service info handler.

use crate::settings::Settings;
use crate::state::AppState;
use axum::{extract::State, Json};

/// GET /info: the settings this process was started with (credentials redacted by `Settings`).
pub async fn info(State(state): State<AppState>) -> Json<Settings> {
    Json(state.settings.as_ref().clone())
}
