//! Rulebook (game document) handlers.

use crate::error::AppError;
use crate::extractors::{JsonBody, PathParam};
use crate::models::{NewRulebook, Rulebook, RulebookFields};
use crate::repo::Repository;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

/// POST /rulebooks. A `game_id` with no matching game is rejected by the foreign key.
pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RulebookFields>,
) -> Result<(StatusCode, Json<Rulebook>), AppError> {
    let new = NewRulebook::new(body)?;
    let rulebook = Repository::<Rulebook>::new(&state.pool).create(&new).await?;
    Ok((StatusCode::CREATED, Json(rulebook)))
}

pub async fn read(State(state): State<AppState>, PathParam(id): PathParam<i32>) -> Result<Json<Rulebook>, AppError> {
    let rulebook = Repository::<Rulebook>::new(&state.pool)
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("rulebook {}", id)))?;
    Ok(Json(rulebook))
}

pub async fn delete(State(state): State<AppState>, PathParam(id): PathParam<i32>) -> Result<StatusCode, AppError> {
    if Repository::<Rulebook>::new(&state.pool).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("rulebook {}", id)))
    }
}
