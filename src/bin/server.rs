use anyhow::{Context, Result};
use std::sync::Arc;
use token_watch::api::{AppState, build_router};
use token_watch::config::Config;
use token_watch::reconciler::TokenRegistry;
use token_watch::repository::Database;
use token_watch::rpc::RpcClient;
use token_watch::signal::shutdown_signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting token API server");

    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("Token configuration: {}", config.token_config_path);

    let db = Database::new(&config.database_url)?;
    info!("Database initialized");

    let client = RpcClient::new(&config.rpc_url, config.rpc_timeout)?;
    info!("RPC client configured for {}", client.url());

    let registry = TokenRegistry::new(Arc::new(client), db).with_retries(config.refresh_retries);
    let app = build_router(AppState::new(registry, &config.token_config_path));

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server_addr))?;
    info!("Listening on {}", config.server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
