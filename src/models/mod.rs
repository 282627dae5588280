//! Catalog entities and their construction-time validation.

mod game;
mod rulebook;

pub use game::{Game, GameFields, NewGame};
pub use rulebook::{NewRulebook, Rulebook, RulebookFields};

use thiserror::Error;

/// A field or cross-field rule that a value failed. `field` names the offending field.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError {
            field,
            reason: reason.into(),
        }
    }
}
