use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use ecom_api::app::{app, AppState};
use ecom_api::auth::TokenIssuer;
use ecom_api::config::config;
use ecom_api::database::{DatabaseManager, PgStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")))
        .init();

    let config = config();
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting ecom-api in {:?} mode", config.environment);

    let pool = DatabaseManager::connect_lazy(&config.database).context("failed to configure database pool")?;
    let storage = Arc::new(PgStorage::new(pool));
    let tokens = TokenIssuer::new(config.security.jwt_secret.clone(), config.security.jwt_expiry_secs);

    let router = app(AppState::new(storage, tokens), config.server.enable_cors);

    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on {}:{}", config.server.public_host, config.server.port);

    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
