mod accounts;
mod app;
mod auth;
mod config;
mod error;
mod extract;
mod mail;
mod password_reset;
mod posts;
mod response;
mod state;
mod tokens;
mod users;

use crate::{app::build_app, config::AppConfig, state::AppState};

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "blogd=debug,axum=info,tower_http=info".to_string());
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
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let app_state = AppState::init(config).await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;
    tracing::info!("migrations applied");

    let pruned = app_state.sessions.prune_expired().await?;
    tracing::info!(pruned, "expired sessions removed");

    if let Some(admin) = &app_state.config.admin {
        users::seed::ensure_admin(&app_state.db, &app_state.hasher, admin).await?;
    }

    app::serve(build_app(app_state)).await
}
