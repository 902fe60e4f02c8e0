use anyhow::Result;
use std::sync::Arc;
use token_watch::config::MonitorConfig;
use token_watch::monitor::BalanceMonitor;
use token_watch::notifier::{NotificationSink, TelegramNotifier};
use token_watch::rpc::RpcClient;
use token_watch::signal::shutdown_signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Balance Monitor Bot");

    let config = match MonitorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            return Err(e);
        }
    };
    info!("Monitoring account: {}", config.account_address);

    let client = RpcClient::new(&config.rpc_url, config.rpc_timeout)?;
    info!("Connected to RPC at {}", client.url());

    let notifier = TelegramNotifier::new(&config.telegram_bot_token, config.telegram_chat_id);
    let sink = NotificationSink::new(Arc::new(notifier));

    let mut monitor = BalanceMonitor::new(
        Arc::new(client),
        sink,
        config.account_address,
        config.polling_interval,
        config.native_symbol,
    );

    if let Err(e) = monitor.start().await {
        error!("Initialization failed: {}", e);
        return Err(e.into());
    }
    info!("Initialization complete");

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_token.cancel();
    });

    monitor.run(cancel).await?;
    info!("Balance monitor stopped");

    Ok(())
}
