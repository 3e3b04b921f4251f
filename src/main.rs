use std::sync::Arc;

mod app;
mod auth;
mod config;
mod db;
mod error;
mod extract;
mod leads;
mod seed;
mod state;
#[cfg(test)]
mod testing;
mod validation;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "leadgrid=debug,axum=info,tower_http=info".to_string());
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

    let config = Arc::new(AppConfig::from_env()?);
    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;
    tracing::info!("database ready");

    let app_state = AppState::from_pool(config.clone(), pool);

    if config.seed_data {
        seed::seed(&app_state).await?;
    }

    let app = app::build_app(app_state)?;
    app::serve(app, config.listen_addr).await
}
