use crate::reconciler::TokenRegistry;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TokenRegistry>,
    pub token_config_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(registry: TokenRegistry, token_config_path: impl Into<PathBuf>) -> Self {
        Self {
            registry: Arc::new(registry),
            token_config_path: Arc::new(token_config_path.into()),
        }
    }
}
