//! HTTP handlers for games, rulebooks, health and settings.

pub mod games;
pub mod health;
pub mod rulebooks;
pub mod settings;
