//! Game rules API server: reads settings from the environment, prepares the database, serves HTTP.
//!
//! Run from repo root: `cargo run -p game-rules-server`

use game_rules_api::{app, connect, ensure_database_exists, ensure_schema, AppState, Settings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                let level = if settings.debug { "debug" } else { "info" };
                tracing_subscriber::EnvFilter::new(format!("game_rules_api={level},game_rules_server={level}"))
            }),
        )
        .init();

    ensure_database_exists(&settings).await?;
    let pool = connect(&settings).await?;
    ensure_schema(&pool).await?;

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!(app = %settings.app_name, "listening on {}", listener.local_addr()?);
    let state = AppState::new(pool, settings);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
