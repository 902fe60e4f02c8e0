use alloy_primitives::Address;
use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_RPC_URL: &str = "https://eth.llamarpc.com";
const DEFAULT_MONITOR_RPC_URL: &str = "https://rpc.darwinia.network";
const DEFAULT_ACCOUNT_ADDRESS: &str = "0x3E8436e87Abb49efe1A958EE73fbB7A12B419aAB";
const DEFAULT_POLLING_INTERVAL_MS: u64 = 60_000;
const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub database_url: String,
    pub token_config_path: String,
    pub rpc_timeout: Duration,
    pub refresh_retries: usize,
    pub server_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let rpc_url = var("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

        let database_url =
            var("DATABASE_URL").unwrap_or_else(|| "sqlite:./tokens.db".to_string());

        let token_config_path =
            var("TOKEN_CONFIG_PATH").unwrap_or_else(|| "config/tokens.yaml".to_string());

        let refresh_retries = match var("REFRESH_RETRIES") {
            Some(value) => value
                .parse()
                .context("REFRESH_RETRIES must be a non-negative integer")?,
            None => 2,
        };

        let server_addr = var("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());

        Ok(Config {
            rpc_url,
            database_url,
            token_config_path,
            rpc_timeout: rpc_timeout(&var)?,
            refresh_retries,
            server_addr,
        })
    }
}

/// Settings for the balance monitor bot. Every failure here is fatal at startup.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub rpc_url: String,
    pub account_address: Address,
    pub polling_interval: Duration,
    pub telegram_bot_token: String,
    pub telegram_chat_id: i64,
    pub native_symbol: String,
    pub rpc_timeout: Duration,
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = var("TELEGRAM_BOT_TOKEN")
            .filter(|token| !token.is_empty())
            .context("TELEGRAM_BOT_TOKEN must be set in .env")?;

        let chat_id_str = var("TELEGRAM_CHAT_ID")
            .filter(|id| !id.is_empty())
            .context("TELEGRAM_CHAT_ID must be set in .env")?;

        let telegram_chat_id = chat_id_str
            .parse()
            .with_context(|| format!("Invalid TELEGRAM_CHAT_ID: {chat_id_str}"))?;

        let rpc_url = var("RPC_URL").unwrap_or_else(|| DEFAULT_MONITOR_RPC_URL.to_string());

        let address_str =
            var("ACCOUNT_ADDRESS").unwrap_or_else(|| DEFAULT_ACCOUNT_ADDRESS.to_string());
        let account_address = parse_account_address(&address_str)
            .with_context(|| format!("Invalid ACCOUNT_ADDRESS: {address_str}"))?;

        let polling_interval_ms: u64 = match var("POLLING_INTERVAL") {
            Some(value) => value
                .parse()
                .context("POLLING_INTERVAL must be a number of milliseconds")?,
            None => DEFAULT_POLLING_INTERVAL_MS,
        };

        if polling_interval_ms == 0 {
            anyhow::bail!("POLLING_INTERVAL must be greater than zero");
        }

        let native_symbol = var("NATIVE_SYMBOL").unwrap_or_else(|| "RING".to_string());

        Ok(MonitorConfig {
            rpc_url,
            account_address,
            polling_interval: Duration::from_millis(polling_interval_ms),
            telegram_bot_token,
            telegram_chat_id,
            native_symbol,
            rpc_timeout: rpc_timeout(&var)?,
        })
    }
}

/// Mixed-case input must carry a valid EIP-55 checksum; single-case hex is taken as is.
pub fn parse_account_address(input: &str) -> Result<Address> {
    let input = input.trim();
    let hex = input.strip_prefix("0x").unwrap_or(input);
    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());

    if has_lower && has_upper {
        Address::parse_checksummed(input, None).context("address checksum does not match")
    } else {
        Address::from_str(input).context("not a 20-byte hex address")
    }
}

fn rpc_timeout(var: &impl Fn(&str) -> Option<String>) -> Result<Duration> {
    let secs = match var("RPC_TIMEOUT_SECS") {
        Some(value) => value
            .parse()
            .context("RPC_TIMEOUT_SECS must be a number of seconds")?,
        None => DEFAULT_RPC_TIMEOUT_SECS,
    };

    if secs == 0 {
        anyhow::bail!("RPC_TIMEOUT_SECS must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
