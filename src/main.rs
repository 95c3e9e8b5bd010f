mod app;
mod auth;
mod blogs;
mod config;
mod db;
mod error;
mod images;
mod projects;
mod state;
mod storage;
#[cfg(test)]
mod testing;
mod validation;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "folio=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    tracing::info!(
        environment = ?config.environment,
        token_ttl_secs = config.jwt.ttl.as_secs(),
        "configuration loaded"
    );

    let state = AppState::init(config).await?;
    app::serve(app::build_app(state)).await
}
