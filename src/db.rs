//! Connection pool construction and catalog DDL.

use crate::error::AppError;
use crate::settings::Settings;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::time::Duration;

/// Statements applied in order by `ensure_schema`. Each is idempotent.
const SCHEMA_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS games (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        game_types TEXT[],
        game_mechanics TEXT[],
        min_players INTEGER NOT NULL,
        max_players INTEGER NOT NULL,
        min_playtime_minutes INTEGER,
        max_playtime_minutes INTEGER,
        min_age INTEGER,
        complexity_rating DOUBLE PRECISION,
        year_published INTEGER,
        publisher TEXT,
        designer TEXT,
        minio_rulebook_path TEXT,
        minio_image_path TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT games_name_key UNIQUE (name),
        CONSTRAINT games_min_players_check CHECK (min_players > 0),
        CONSTRAINT games_max_players_check CHECK (max_players > 0),
        CONSTRAINT games_player_range_check CHECK (max_players >= min_players),
        CONSTRAINT games_playtime_check CHECK (
            (min_playtime_minutes IS NULL OR min_playtime_minutes > 0)
            AND (max_playtime_minutes IS NULL OR max_playtime_minutes > 0)
            AND (min_playtime_minutes IS NULL OR max_playtime_minutes IS NULL
                 OR max_playtime_minutes >= min_playtime_minutes)
        ),
        CONSTRAINT games_min_age_check CHECK (min_age IS NULL OR min_age > 0),
        CONSTRAINT games_complexity_check CHECK (
            complexity_rating IS NULL OR complexity_rating BETWEEN 1.0 AND 5.0
        )
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS game_documents (
        id SERIAL PRIMARY KEY,
        game_id INTEGER NOT NULL,
        document_type TEXT NOT NULL,
        minio_bucket TEXT NOT NULL,
        minio_object_path TEXT NOT NULL,
        file_name TEXT NOT NULL,
        file_size_bytes BIGINT,
        mime_type TEXT,
        uploaded_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT game_documents_game_id_fkey FOREIGN KEY (game_id)
            REFERENCES games (id) ON DELETE RESTRICT,
        CONSTRAINT game_documents_file_size_check CHECK (file_size_bytes IS NULL OR file_size_bytes >= 0)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS game_documents_game_id_idx ON game_documents (game_id)",
];

/// Connection options for the catalog database, built from the credential parts so that
/// reserved characters in the password or database name need no escaping.
pub fn connect_options(settings: &Settings) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&settings.postgres_host)
        .port(settings.postgres_port)
        .username(&settings.postgres_user)
        .password(&settings.postgres_password)
        .database(&settings.postgres_db)
}

/// Same server and credentials, pointed at the `postgres` maintenance database.
fn admin_connect_options(settings: &Settings) -> PgConnectOptions {
    connect_options(settings).database("postgres")
}

/// Build the shared pool. Connections are acquired per repository call and returned on drop.
pub async fn connect(settings: &Settings) -> Result<PgPool, AppError> {
    let pool = pool_options(settings).connect_with(connect_options(settings)).await?;
    tracing::info!(
        host = %settings.postgres_host,
        db = %settings.postgres_db,
        max_connections = settings.max_connections(),
        "database pool ready"
    );
    Ok(pool)
}

/// Same pool configuration, but no connection is opened until first use.
pub fn connect_lazy(settings: &Settings) -> PgPool {
    pool_options(settings).connect_lazy_with(connect_options(settings))
}

fn pool_options(settings: &Settings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.max_connections())
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .test_before_acquire(true)
}

/// Create the catalog tables if they do not exist.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    for ddl in SCHEMA_DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}

/// Ensure the configured database exists; create it if not. Connects to the default
/// `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(settings: &Settings) -> Result<(), AppError> {
    let db_name = settings.postgres_db.as_str();
    if db_name == "postgres" {
        return Ok(());
    }
    let mut conn: sqlx::PgConnection = admin_connect_options(settings).connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(db = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
