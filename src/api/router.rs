use super::handlers;
use super::prices;
use super::state::AppState;
use axum::Router;
use axum::routing::{get, post};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/tokens", get(handlers::list_tokens))
        .route("/api/tokens/refresh", post(handlers::refresh_tokens))
        .route("/api/tokens/:address", get(handlers::get_token))
        .route("/api/prices", get(prices::list_prices))
        .with_state(state)
}
