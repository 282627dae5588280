//! Game handlers: create, read, list, search, count, update, delete, and the rulebooks of one game.

use crate::error::AppError;
use crate::extractors::{JsonBody, Pagination, PathParam};
use crate::models::{Game, GameFields, NewGame, Rulebook};
use crate::repo::{Entity, Repository};
use crate::sql::TableMeta;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Coerce a query-string value to the JSON type of its column so the equality filter binds correctly.
/// Unknown columns are dropped; values that do not parse as the column type are rejected.
pub(crate) fn query_filters(meta: &TableMeta, params: HashMap<String, String>) -> Result<Vec<(String, Value)>, AppError> {
    let mut filters = Vec::new();
    for (k, s) in params {
        let Some(col) = meta.column(&k) else { continue };
        let bad = || AppError::BadRequest(format!("invalid value for {}: '{}'", k, s));
        let v = match col.pg_type {
            "int4" | "int8" => s.parse::<i64>().map(Value::from).map_err(|_| bad())?,
            "float8" => s.parse::<f64>().map(Value::from).map_err(|_| bad())?,
            "text" => Value::String(s.clone()),
            _ => return Err(AppError::BadRequest(format!("cannot filter on {}", k))),
        };
        filters.push((k, v));
    }
    filters.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(filters)
}

pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<GameFields>,
) -> Result<(StatusCode, Json<Game>), AppError> {
    let new = NewGame::new(body)?;
    let game = Repository::<Game>::new(&state.pool).create(&new).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

pub async fn list(State(state): State<AppState>, page: Pagination) -> Result<Json<Vec<Game>>, AppError> {
    let games = Repository::<Game>::new(&state.pool)
        .get_all(page.limit, page.offset)
        .await?;
    Ok(Json(games))
}

pub async fn read(State(state): State<AppState>, PathParam(id): PathParam<i32>) -> Result<Json<Game>, AppError> {
    let game = Repository::<Game>::new(&state.pool)
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("game {}", id)))?;
    Ok(Json(game))
}

pub async fn rulebooks(State(state): State<AppState>, PathParam(id): PathParam<i32>) -> Result<Json<Vec<Rulebook>>, AppError> {
    let loaded = Repository::<Game>::new(&state.pool)
        .get_with_relations(id, &["rulebooks"])
        .await?
        .ok_or_else(|| AppError::NotFound(format!("game {}", id)))?;
    Ok(Json(loaded.relation("rulebooks")?))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub field: Option<String>,
    pub q: String,
}

/// GET /games/search?q=...&field=name
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Game>>, AppError> {
    let field = params.field.as_deref().unwrap_or("name");
    let games = Repository::<Game>::new(&state.pool)
        .search_by_text(field, &params.q)
        .await?;
    Ok(Json(games))
}

/// GET /games/count?publisher=... ; equality filters, unknown keys ignored.
pub async fn count(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let filters = query_filters(&Game::META, params)?;
    let n = Repository::<Game>::new(&state.pool).count(&filters).await?;
    Ok(Json(serde_json::json!({ "count": n })))
}

/// PUT /games/:id replaces every caller-owned field.
pub async fn update(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(body): JsonBody<GameFields>,
) -> Result<Json<Game>, AppError> {
    let repo = Repository::<Game>::new(&state.pool);
    let current = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("game {}", id)))?;
    let replaced = current.replace(body)?;
    let game = repo
        .update(&replaced)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("game {}", id)))?;
    Ok(Json(game))
}

/// DELETE /games/:id. Fails with a foreign-key violation while rulebooks still reference the game.
pub async fn delete(State(state): State<AppState>, PathParam(id): PathParam<i32>) -> Result<StatusCode, AppError> {
    if Repository::<Game>::new(&state.pool).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("game {}", id)))
    }
}
