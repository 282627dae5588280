//! Process settings read from the environment (optionally seeded from `.env`).
//! Built once at startup and handed to the pool factory and app state.

use crate::error::ConfigError;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Clone, Debug, Serialize)]
pub struct Settings {
    pub app_name: String,
    pub debug: bool,
    pub bind_addr: String,
    pub postgres_user: String,
    /// Never echoed by `/info`.
    #[serde(skip_serializing)]
    pub postgres_password: String,
    pub postgres_host: String,
    pub postgres_port: u16,
    pub postgres_db: String,
    pub pool_size: u32,
    pub max_overflow: u32,
    pub acquire_timeout_secs: u64,
}

impl Settings {
    /// Read settings from the process environment. Loads `.env` first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars().collect())
    }

    /// Build settings from a key/value map. Keys are matched case-insensitively.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.to_ascii_uppercase(), v))
            .collect();
        let get = |key: &str| vars.get(key).map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        Ok(Settings {
            app_name: get("APP_NAME").unwrap_or_else(|| "Game Rule API".into()),
            debug: parse_or(get("DEBUG"), "DEBUG", false)?,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8000".into()),
            postgres_user: required("POSTGRES_USER")?,
            postgres_password: required("POSTGRES_PASSWORD")?,
            postgres_host: get("POSTGRES_HOST").unwrap_or_else(|| "localhost".into()),
            postgres_port: parse_or(get("POSTGRES_PORT"), "POSTGRES_PORT", 5432)?,
            postgres_db: required("POSTGRES_DB")?,
            pool_size: parse_or(get("DB_POOL_SIZE"), "DB_POOL_SIZE", 20)?,
            max_overflow: parse_or(get("DB_MAX_OVERFLOW"), "DB_MAX_OVERFLOW", 10)?,
            acquire_timeout_secs: parse_or(get("DB_ACQUIRE_TIMEOUT_SECS"), "DB_ACQUIRE_TIMEOUT_SECS", 30)?,
        })
    }

    /// Upper bound on pooled connections: the base pool plus the overflow allowance.
    pub fn max_connections(&self) -> u32 {
        self.pool_size.saturating_add(self.max_overflow).max(1)
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(s) => s.parse().map_err(|_| ConfigError::Invalid { key, value: s }),
    }
}
