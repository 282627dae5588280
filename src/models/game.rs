use super::ValidationError;
use crate::models::rulebook::RULEBOOK_COLUMNS;
use crate::repo::Entity;
use crate::sql::{Column, IncludeDirection, Relation, SqlValue, TableMeta};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub(crate) const GAME_COLUMNS: &[Column] = &[
    Column::generated("id", "int4"),
    Column::data("name", "text"),
    Column::data("description", "text"),
    Column::data("game_types", "text[]"),
    Column::data("game_mechanics", "text[]"),
    Column::data("min_players", "int4"),
    Column::data("max_players", "int4"),
    Column::data("min_playtime_minutes", "int4"),
    Column::data("max_playtime_minutes", "int4"),
    Column::data("min_age", "int4"),
    Column::data("complexity_rating", "float8"),
    Column::data("year_published", "int4"),
    Column::data("publisher", "text"),
    Column::data("designer", "text"),
    Column::data("minio_rulebook_path", "text"),
    Column::data("minio_image_path", "text"),
    Column::generated("created_at", "timestamptz"),
    Column::generated("updated_at", "timestamptz"),
];

/// Caller-supplied game attributes (everything except id and timestamps).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GameFields {
    pub name: String,
    pub description: Option<String>,
    pub game_types: Option<Vec<String>>,
    pub game_mechanics: Option<Vec<String>>,
    pub min_players: i32,
    pub max_players: i32,
    pub min_playtime_minutes: Option<i32>,
    pub max_playtime_minutes: Option<i32>,
    pub min_age: Option<i32>,
    pub complexity_rating: Option<f64>,
    pub year_published: Option<i32>,
    pub publisher: Option<String>,
    pub designer: Option<String>,
    /// Object-storage key of the rulebook; never dereferenced here.
    pub minio_rulebook_path: Option<String>,
    pub minio_image_path: Option<String>,
}

fn positive(field: &'static str, v: i32) -> Result<(), ValidationError> {
    if v <= 0 {
        return Err(ValidationError::new(field, "must be greater than 0"));
    }
    Ok(())
}

fn positive_if_set(field: &'static str, v: Option<i32>) -> Result<(), ValidationError> {
    match v {
        Some(n) if n <= 0 => Err(ValidationError::new(field, "must be greater than 0 if provided")),
        _ => Ok(()),
    }
}

impl GameFields {
    /// Field rules first, then cross-field ranges. Returns the first failure.
    pub fn validate(&self) -> Result<(), ValidationError> {
        positive("min_players", self.min_players)?;
        positive("max_players", self.max_players)?;
        positive_if_set("min_age", self.min_age)?;
        positive_if_set("min_playtime_minutes", self.min_playtime_minutes)?;
        positive_if_set("max_playtime_minutes", self.max_playtime_minutes)?;
        if let Some(c) = self.complexity_rating {
            if !(1.0..=5.0).contains(&c) {
                return Err(ValidationError::new(
                    "complexity_rating",
                    "must be between 1.0 and 5.0",
                ));
            }
        }

        if self.max_players < self.min_players {
            return Err(ValidationError::new(
                "max_players",
                format!(
                    "max_players ({}) must be greater than or equal to min_players ({})",
                    self.max_players, self.min_players
                ),
            ));
        }
        if let (Some(min), Some(max)) = (self.min_playtime_minutes, self.max_playtime_minutes) {
            if max < min {
                return Err(ValidationError::new(
                    "max_playtime_minutes",
                    format!(
                        "max_playtime_minutes ({}) must be greater than or equal to min_playtime_minutes ({})",
                        max, min
                    ),
                ));
            }
        }
        Ok(())
    }

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("name", self.name.as_str().into()),
            ("description", self.description.clone().into()),
            ("game_types", self.game_types.clone().into()),
            ("game_mechanics", self.game_mechanics.clone().into()),
            ("min_players", self.min_players.into()),
            ("max_players", self.max_players.into()),
            ("min_playtime_minutes", self.min_playtime_minutes.into()),
            ("max_playtime_minutes", self.max_playtime_minutes.into()),
            ("min_age", self.min_age.into()),
            ("complexity_rating", self.complexity_rating.into()),
            ("year_published", self.year_published.into()),
            ("publisher", self.publisher.clone().into()),
            ("designer", self.designer.clone().into()),
            ("minio_rulebook_path", self.minio_rulebook_path.clone().into()),
            ("minio_image_path", self.minio_image_path.clone().into()),
        ]
    }
}

/// An unsaved game that has passed validation. Only `NewGame::new` builds one.
#[derive(Clone, Debug, PartialEq)]
pub struct NewGame(GameFields);

impl NewGame {
    pub fn new(fields: GameFields) -> Result<Self, ValidationError> {
        fields.validate()?;
        Ok(NewGame(fields))
    }

    pub fn fields(&self) -> &GameFields {
        &self.0
    }
}

/// A persisted game row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Game {
    pub id: i32,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub fields: GameFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    /// Replace every caller-owned field, keeping identity and timestamps. Validates the result.
    pub fn replace(self, fields: GameFields) -> Result<Self, ValidationError> {
        fields.validate()?;
        Ok(Game { fields, ..self })
    }
}

impl Entity for Game {
    type New = NewGame;

    const META: TableMeta = TableMeta {
        table: "games",
        pk: "id",
        columns: GAME_COLUMNS,
        updated_at: Some("updated_at"),
    };

    const RELATIONS: &'static [Relation] = &[Relation {
        name: "rulebooks",
        direction: IncludeDirection::ToMany,
        table: "game_documents",
        columns: RULEBOOK_COLUMNS,
        our_key: "id",
        their_key: "game_id",
    }];

    fn id(&self) -> i32 {
        self.id
    }

    fn insert_values(new: &NewGame) -> Vec<(&'static str, SqlValue)> {
        new.fields().values()
    }

    fn update_values(&self) -> Vec<(&'static str, SqlValue)> {
        self.fields.values()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.fields.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chess() -> GameFields {
        GameFields {
            name: "Chess".into(),
            description: None,
            game_types: None,
            game_mechanics: None,
            min_players: 2,
            max_players: 2,
            min_playtime_minutes: None,
            max_playtime_minutes: None,
            min_age: None,
            complexity_rating: None,
            year_published: None,
            publisher: None,
            designer: None,
            minio_rulebook_path: None,
            minio_image_path: None,
        }
    }

    fn field_of(fields: GameFields) -> &'static str {
        NewGame::new(fields).unwrap_err().field
    }

    #[test]
    fn minimal_game_is_valid() {
        assert!(NewGame::new(chess()).is_ok());
    }

    #[test]
    fn player_counts_must_be_positive() {
        assert_eq!(field_of(GameFields { min_players: 0, ..chess() }), "min_players");
        assert_eq!(field_of(GameFields { max_players: -1, ..chess() }), "max_players");
    }

    #[test]
    fn max_players_below_min_is_rejected() {
        let err = NewGame::new(GameFields { min_players: 4, max_players: 2, ..chess() }).unwrap_err();
        assert_eq!(err.field, "max_players");
        assert!(err.reason.contains("min_players (4)"));
        assert!(NewGame::new(GameFields { min_players: 2, max_players: 6, ..chess() }).is_ok());
    }

    #[test]
    fn field_rules_run_before_cross_field_rules() {
        let err = NewGame::new(GameFields { min_players: 5, max_players: 0, ..chess() }).unwrap_err();
        assert_eq!(err.field, "max_players");
        assert_eq!(err.reason, "must be greater than 0");
    }

    #[test]
    fn optional_counts_must_be_positive_when_present() {
        assert_eq!(field_of(GameFields { min_age: Some(0), ..chess() }), "min_age");
        assert_eq!(field_of(GameFields { min_playtime_minutes: Some(-5), ..chess() }), "min_playtime_minutes");
        assert_eq!(field_of(GameFields { max_playtime_minutes: Some(0), ..chess() }), "max_playtime_minutes");
    }

    #[test]
    fn playtime_range() {
        let inverted = GameFields {
            min_playtime_minutes: Some(60),
            max_playtime_minutes: Some(30),
            ..chess()
        };
        assert_eq!(field_of(inverted), "max_playtime_minutes");
        let only_max = GameFields {
            max_playtime_minutes: Some(30),
            ..chess()
        };
        assert!(NewGame::new(only_max).is_ok());
    }

    #[test]
    fn complexity_bounds_are_inclusive() {
        for ok in [1.0, 2.75, 5.0] {
            assert!(NewGame::new(GameFields { complexity_rating: Some(ok), ..chess() }).is_ok(), "{}", ok);
        }
        for bad in [0.99, 5.01, -1.0, f64::NAN] {
            assert_eq!(field_of(GameFields { complexity_rating: Some(bad), ..chess() }), "complexity_rating");
        }
    }

    #[test]
    fn replace_validates_and_keeps_identity() {
        let now = Utc::now();
        let game = Game {
            id: 7,
            fields: chess(),
            created_at: now,
            updated_at: now,
        };
        let renamed = game
            .clone()
            .replace(GameFields { name: "Shogi".into(), ..chess() })
            .unwrap();
        assert_eq!(renamed.id, 7);
        assert_eq!(renamed.fields.name, "Shogi");
        assert!(game.replace(GameFields { max_players: 1, ..chess() }).is_err());
    }

    #[test]
    fn body_deserializes_with_optional_fields_missing() {
        let fields: GameFields = serde_json::from_str(r#"{"name":"Go","min_players":2,"max_players":2}"#).unwrap();
        assert_eq!(fields.name, "Go");
        assert!(fields.game_types.is_none());
    }

    #[test]
    fn serialized_game_is_flat() {
        let now = Utc::now();
        let game = Game {
            id: 1,
            fields: chess(),
            created_at: now,
            updated_at: now,
        };
        let v = serde_json::to_value(&game).unwrap();
        assert_eq!(v["id"], 1);
        assert_eq!(v["name"], "Chess");
        assert!(v.get("fields").is_none());
    }
}
