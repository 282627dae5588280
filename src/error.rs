//! Typed errors and HTTP mapping.

use crate::integrity::IntegrityViolation;
use crate::models::ValidationError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing setting: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Integrity(IntegrityViolation),
    #[error("bad request: {0}")]
    BadRequest(String),
    /// The request body or path could not be decoded. `field` names the offending body field when known.
    #[error("{message}")]
    Rejected {
        status: StatusCode,
        message: String,
        field: Option<String>,
    },
    #[error("database: {0}")]
    Db(sqlx::Error),
}

impl From<JsonRejection> for AppError {
    fn from(r: JsonRejection) -> Self {
        let message = r.body_text();
        let field = match r {
            JsonRejection::JsonDataError(_) => rejected_field(&message),
            _ => None,
        };
        AppError::Rejected {
            status: r.status(),
            message,
            field,
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(r: PathRejection) -> Self {
        AppError::Rejected {
            status: r.status(),
            message: r.body_text(),
            field: None,
        }
    }
}

/// Pull the field name out of a body deserialization message, e.g.
/// "...: min_players: invalid type: ..." or "...: missing field `name` at ...".
fn rejected_field(message: &str) -> Option<String> {
    let inner = message.split_once("target type: ").map_or(message, |(_, rest)| rest);
    if let Some(rest) = inner.strip_prefix("missing field `") {
        return rest.split('`').next().map(str::to_string);
    }
    let (path, _) = inner.split_once(": ")?;
    if path.is_empty() || path.contains(char::is_whitespace) {
        return None;
    }
    Some(path.to_string())
}

/// Constraint failures are split off so they can be classified; every other driver error stays opaque.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match IntegrityViolation::from_sqlx(&e) {
            Some(v) => AppError::Integrity(v),
            None => AppError::Db(e),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn new(code: &str, message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: message.into(),
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Config(e) => {
                tracing::error!(error = %e, "configuration error reached a handler");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("config_error", "Internal server error", None),
                )
            }
            AppError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody::new(
                    "validation_error",
                    e.to_string(),
                    Some(serde_json::json!({ "field": e.field })),
                ),
            ),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ErrorBody::new("not_found", format!("not found: {}", what), None),
            ),
            AppError::Integrity(v) => {
                tracing::warn!(kind = ?v.kind, constraint = ?v.constraint, "integrity violation: {}", v.message);
                (v.status(), v.body())
            }
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("bad_request", msg, None),
            ),
            AppError::Rejected { status, message, field } => {
                let code = match status {
                    StatusCode::UNPROCESSABLE_ENTITY => "validation_error",
                    StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
                    StatusCode::UNSUPPORTED_MEDIA_TYPE => "unsupported_media_type",
                    _ => "bad_request",
                };
                let details = field.map(|f| serde_json::json!({ "field": f }));
                (status, ErrorBody::new(code, message, details))
            }
            AppError::Db(e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("internal_error", "Internal server error", None),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
