use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod ai;
mod auth;
mod config;
mod db;
mod http;

use ai::llm::LlmClient;
use auth::jwt::TokenIssuer;
use config::AppConfig;
use db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("💬 Starting chat API server...");

    // Load config
    let config = AppConfig::from_env()?;
    tracing::info!("Config loaded. Model: {}", config.hf_model);

    // Initialize database
    let db = Database::connect(&config.database_url).await?;
    db.run_migrations().await?;
    tracing::info!("Database connected and migrations applied.");

    // Inference client and token issuer
    let llm = LlmClient::new(&config);
    let tokens = TokenIssuer::new(
        &config.jwt_secret,
        config.access_token_ttl_minutes,
        config.refresh_token_ttl_days,
    );

    // Build shared application state
    let state = Arc::new(http::AppState {
        config: config.clone(),
        db: Arc::new(db),
        llm: Arc::new(llm),
        tokens,
    });

    let app = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
