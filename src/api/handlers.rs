use super::error::ApiError;
use super::state::AppState;
use crate::token_config::{ConfigError, TokenConfig, parse_token_configs};
use alloy_primitives::Address;
use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Value, json};
use std::str::FromStr;
use tracing::error;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /api/tokens
pub async fn list_tokens(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let tokens = state.registry.list_all().await.map_err(|e| {
        error!("Error fetching tokens: {:#}", e);
        ApiError::Internal("Failed to fetch tokens".to_string())
    })?;

    Ok(Json(json!({ "tokens": tokens })))
}

/// GET /api/tokens/:address
pub async fn get_token(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let parsed = Address::from_str(&address)
        .map_err(|_| ApiError::BadRequest(format!("Invalid address format: {address}")))?;

    let token = state.registry.get_by_address(parsed).await.map_err(|e| {
        error!("Error fetching token with address {}: {:#}", address, e);
        ApiError::Internal("Failed to fetch token".to_string())
    })?;

    match token {
        Some(token) => Ok(Json(json!({ "token": token }))),
        None => Err(ApiError::NotFound(format!("Token {address} not found"))),
    }
}

/// POST /api/tokens/refresh
pub async fn refresh_tokens(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let configs = load_configs(&state).await.map_err(|e| {
        error!("Error loading token configuration: {}", e);
        ApiError::Internal(format!(
            "Failed to load token configuration or configuration is empty: {e}"
        ))
    })?;

    let summary = state.registry.refresh_all(&configs).await.map_err(|e| {
        error!("Error refreshing token data: {}", e);
        ApiError::Internal(format!("Failed to refresh token data: {e}"))
    })?;

    Ok(Json(json!({
        "message": "Token data refreshed",
        "tokens": summary.succeeded,
        "failed": summary.failed,
    })))
}

async fn load_configs(state: &AppState) -> Result<Vec<TokenConfig>, ConfigError> {
    let path = state.token_config_path.as_path();
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
    parse_token_configs(&contents)
}
