//! Extract `limit` / `offset` from the query string.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

/// Optional paging parameters; the repository applies defaults and caps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(p) = Query::<Pagination>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::BadRequest(format!("invalid paging parameters: {}", e)))?;
        Ok(p)
    }
}
