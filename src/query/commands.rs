use crate::query::formatters::{
    OutputFormat, format_refresh_summary, format_token, format_tokens,
};
use crate::reconciler::TokenRegistry;
use crate::token_config::load_token_configs;
use alloy_primitives::Address;
use anyhow::Result;
use std::path::Path;
use std::str::FromStr;

pub async fn cmd_list(registry: &TokenRegistry, format: &OutputFormat) -> Result<()> {
    let tokens = registry.list_all().await?;
    let output = format_tokens(&tokens, format);
    println!("{output}");

    Ok(())
}

pub async fn cmd_show(registry: &TokenRegistry, address: &str, format: &OutputFormat) -> Result<()> {
    let parsed = Address::from_str(address)
        .map_err(|_| anyhow::anyhow!("Invalid address format: {}", address))?;

    match registry.get_by_address(parsed).await? {
        Some(token) => println!("{}", format_token(&token, format)),
        None => anyhow::bail!("Token {} not found; run `query refresh` first", address),
    }

    Ok(())
}

pub async fn cmd_refresh(
    registry: &TokenRegistry,
    token_config_path: &Path,
    format: &OutputFormat,
) -> Result<()> {
    let configs = load_token_configs(token_config_path)?;
    let summary = registry.refresh_all(&configs).await?;
    let output = format_refresh_summary(&summary, format);
    println!("{output}");

    if summary.succeeded.is_empty() {
        anyhow::bail!("No token could be refreshed");
    }

    Ok(())
}
