//! Per-entity configuration consumed by the generic repository.

use crate::error::AppError;
use crate::models::ValidationError;
use crate::sql::{Relation, SqlValue, TableMeta};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::FromRow;

/// A persisted record type. Implementors describe their table and how to turn values into column bindings.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin + 'static {
    /// The unsaved, already-validated form accepted by `create`.
    type New: Send + Sync;

    const META: TableMeta;
    const RELATIONS: &'static [Relation] = &[];

    fn id(&self) -> i32;

    fn insert_values(new: &Self::New) -> Vec<(&'static str, SqlValue)>;

    /// Values written by a whole-row update.
    fn update_values(&self) -> Vec<(&'static str, SqlValue)>;

    /// Re-checked before every update.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn relation(name: &str) -> Option<&'static Relation> {
        Self::RELATIONS.iter().find(|r| r.name == name)
    }
}

/// An entity with named relations eager-loaded as JSON.
#[derive(Clone, Debug, Serialize)]
pub struct WithRelations<E> {
    #[serde(flatten)]
    pub entity: E,
    #[serde(flatten)]
    pub relations: serde_json::Map<String, serde_json::Value>,
}

impl<E> WithRelations<E> {
    /// Decode one loaded relation, e.g. `Vec<Rulebook>` for a to_many or `Option<Game>` for a to_one.
    pub fn relation<T: DeserializeOwned>(&self, name: &str) -> Result<T, AppError> {
        let raw = self
            .relations
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::BadRequest(format!("relation not loaded: {}", name)))?;
        serde_json::from_value(raw)
            .map_err(|e| AppError::Db(sqlx::Error::Decode(Box::new(e))))
    }
}
