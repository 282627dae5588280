//! Classification of database constraint violations into HTTP responses.
//! Uses the driver's SQLSTATE-derived error kind and constraint name, never the message text.

use crate::error::ErrorBody;
use axum::http::StatusCode;
use serde::Serialize;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Hint returned with check-constraint failures.
pub const CHECK_HINT: &str =
    "Validation error: Values must meet database constraints. Check that min_players > 0, complexity_rating is 1.0-5.0, etc.";
pub const UNIQUE_DETAIL: &str = "Resource already exists";
pub const INVALID_DETAIL: &str = "Invalid data provided";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Check,
    Unique,
    ForeignKey,
    NotNull,
    /// Any other SQLSTATE class 23 failure (e.g. exclusion constraints).
    Other,
}

/// A write rejected by a database constraint.
#[derive(Clone, Debug, Error)]
#[error("integrity violation ({kind:?}): {message}")]
pub struct IntegrityViolation {
    pub kind: ConstraintKind,
    pub constraint: Option<String>,
    pub message: String,
}

/// Map a driver error kind (plus SQLSTATE, for kinds the driver lumps into `Other`) to a constraint kind.
/// Returns None for errors that are not integrity violations.
pub fn classify(kind: ErrorKind, code: Option<&str>) -> Option<ConstraintKind> {
    match kind {
        ErrorKind::CheckViolation => Some(ConstraintKind::Check),
        ErrorKind::UniqueViolation => Some(ConstraintKind::Unique),
        ErrorKind::ForeignKeyViolation => Some(ConstraintKind::ForeignKey),
        ErrorKind::NotNullViolation => Some(ConstraintKind::NotNull),
        _ => match code {
            Some(c) if c.starts_with("23") => Some(ConstraintKind::Other),
            _ => None,
        },
    }
}

impl IntegrityViolation {
    pub fn from_sqlx(err: &sqlx::Error) -> Option<Self> {
        let sqlx::Error::Database(db) = err else {
            return None;
        };
        let code = db.code();
        let kind = classify(db.kind(), code.as_deref())?;
        Some(IntegrityViolation {
            kind,
            constraint: db.constraint().map(str::to_string),
            message: db.message().to_string(),
        })
    }

    pub fn status(&self) -> StatusCode {
        match self.kind {
            ConstraintKind::Check => StatusCode::UNPROCESSABLE_ENTITY,
            ConstraintKind::Unique => StatusCode::CONFLICT,
            ConstraintKind::ForeignKey | ConstraintKind::NotNull | ConstraintKind::Other => StatusCode::BAD_REQUEST,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let (code, detail) = match self.kind {
            ConstraintKind::Check => ("check_violation", CHECK_HINT),
            ConstraintKind::Unique => ("conflict", UNIQUE_DETAIL),
            _ => ("invalid_data", INVALID_DETAIL),
        };
        ErrorBody::new(
            code,
            detail,
            Some(serde_json::json!({
                "kind": self.kind,
                "constraint": self.constraint,
                "msg": self.message,
            })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use axum::response::IntoResponse;
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct FakeDbError {
        code: &'static str,
        constraint: Option<&'static str>,
        message: &'static str,
    }

    impl fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl StdError for FakeDbError {}

    impl sqlx::error::DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            self.message
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn kind(&self) -> ErrorKind {
            match self.code {
                "23505" => ErrorKind::UniqueViolation,
                "23503" => ErrorKind::ForeignKeyViolation,
                "23502" => ErrorKind::NotNullViolation,
                "23514" => ErrorKind::CheckViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn db_error(code: &'static str, constraint: Option<&'static str>, message: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError {
            code,
            constraint,
            message,
        }))
    }

    async fn response_json(err: sqlx::Error) -> (StatusCode, serde_json::Value) {
        let resp = AppError::from(err).into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn classify_structured_kinds() {
        assert_eq!(classify(ErrorKind::CheckViolation, Some("23514")), Some(ConstraintKind::Check));
        assert_eq!(classify(ErrorKind::UniqueViolation, Some("23505")), Some(ConstraintKind::Unique));
        assert_eq!(classify(ErrorKind::ForeignKeyViolation, Some("23503")), Some(ConstraintKind::ForeignKey));
        assert_eq!(classify(ErrorKind::NotNullViolation, Some("23502")), Some(ConstraintKind::NotNull));
        assert_eq!(classify(ErrorKind::Other, Some("23P01")), Some(ConstraintKind::Other));
        assert_eq!(classify(ErrorKind::Other, Some("42P01")), None);
        assert_eq!(classify(ErrorKind::Other, None), None);
    }

    #[test]
    fn message_text_is_not_used_for_classification() {
        let err = db_error(
            "42601",
            None,
            "syntax error near unique constraint check constraint",
        );
        assert!(IntegrityViolation::from_sqlx(&err).is_none());
        assert!(IntegrityViolation::from_sqlx(&sqlx::Error::RowNotFound).is_none());
    }

    #[tokio::test]
    async fn check_violation_is_422_with_hint() {
        let (status, body) = response_json(db_error(
            "23514",
            Some("games_min_players_check"),
            "new row for relation \"games\" violates check constraint \"games_min_players_check\"",
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"]["message"].as_str().unwrap().contains("min_players"));
        assert_eq!(body["error"]["details"]["constraint"], "games_min_players_check");
    }

    #[tokio::test]
    async fn unique_violation_is_409() {
        let (status, body) = response_json(db_error(
            "23505",
            Some("games_name_key"),
            "duplicate key value violates unique constraint \"games_name_key\"",
        ))
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"]["message"].as_str().unwrap().contains("already exists"));
    }

    #[tokio::test]
    async fn foreign_key_violation_is_400() {
        let (status, body) = response_json(db_error(
            "23503",
            Some("game_documents_game_id_fkey"),
            "insert or update on table \"game_documents\" violates foreign key constraint",
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], INVALID_DETAIL);
        assert_eq!(body["error"]["details"]["kind"], "foreign_key");
    }

    #[tokio::test]
    async fn unrelated_database_error_is_500_without_detail() {
        let (status, body) = response_json(db_error(
            "57P01",
            None,
            "terminating connection due to administrator command",
        ))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "Internal server error");
        assert!(body["error"].get("details").is_none());
    }
}
