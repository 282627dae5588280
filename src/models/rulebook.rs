use super::game::GAME_COLUMNS;
use super::ValidationError;
use crate::repo::Entity;
use crate::sql::{Column, IncludeDirection, Relation, SqlValue, TableMeta};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub(crate) const RULEBOOK_COLUMNS: &[Column] = &[
    Column::generated("id", "int4"),
    Column::data("game_id", "int4"),
    Column::data("document_type", "text"),
    Column::data("minio_bucket", "text"),
    Column::data("minio_object_path", "text"),
    Column::data("file_name", "text"),
    Column::data("file_size_bytes", "int8"),
    Column::data("mime_type", "text"),
    Column::generated("uploaded_at", "timestamptz"),
];

/// Caller-supplied document attributes. `game_id` must reference an existing game; the database enforces it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RulebookFields {
    pub game_id: i32,
    pub document_type: String,
    pub minio_bucket: String,
    pub minio_object_path: String,
    pub file_name: String,
    pub file_size_bytes: Option<i64>,
    pub mime_type: Option<String>,
}

impl RulebookFields {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(size) = self.file_size_bytes {
            if size < 0 {
                return Err(ValidationError::new("file_size_bytes", "must not be negative"));
            }
        }
        Ok(())
    }

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("game_id", self.game_id.into()),
            ("document_type", self.document_type.as_str().into()),
            ("minio_bucket", self.minio_bucket.as_str().into()),
            ("minio_object_path", self.minio_object_path.as_str().into()),
            ("file_name", self.file_name.as_str().into()),
            ("file_size_bytes", self.file_size_bytes.into()),
            ("mime_type", self.mime_type.clone().into()),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRulebook(RulebookFields);

impl NewRulebook {
    pub fn new(fields: RulebookFields) -> Result<Self, ValidationError> {
        fields.validate()?;
        Ok(NewRulebook(fields))
    }

    pub fn fields(&self) -> &RulebookFields {
        &self.0
    }
}

/// A stored game document (rulebook, errata, reference sheet). The blob itself lives in object storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Rulebook {
    pub id: i32,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub fields: RulebookFields,
    pub uploaded_at: DateTime<Utc>,
}

impl Entity for Rulebook {
    type New = NewRulebook;

    const META: TableMeta = TableMeta {
        table: "game_documents",
        pk: "id",
        columns: RULEBOOK_COLUMNS,
        updated_at: None,
    };

    const RELATIONS: &'static [Relation] = &[Relation {
        name: "game",
        direction: IncludeDirection::ToOne,
        table: "games",
        columns: GAME_COLUMNS,
        our_key: "game_id",
        their_key: "id",
    }];

    fn id(&self) -> i32 {
        self.id
    }

    fn insert_values(new: &NewRulebook) -> Vec<(&'static str, SqlValue)> {
        new.fields().values()
    }

    fn update_values(&self) -> Vec<(&'static str, SqlValue)> {
        self.fields.values()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.fields.validate()
    }
}
