use crate::fetcher::{FetchError, TokenFetcher, TokenInfo};
use crate::repository::{Database, Token, TokenRepository};
use crate::rpc::ChainReader;
use crate::token_config::{ConfigError, TokenConfig, validate_token_configs};
use alloy_primitives::Address;
use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshFailure {
    pub address: String,
    pub error: String,
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Refreshed(Token),
    Failed(RefreshFailure),
}

#[derive(Debug, Default, Serialize)]
pub struct RefreshSummary {
    pub succeeded: Vec<Token>,
    pub failed: Vec<RefreshFailure>,
}

impl RefreshSummary {
    pub fn failed_addresses(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.address.as_str()).collect()
    }
}

impl FromIterator<RefreshOutcome> for RefreshSummary {
    fn from_iter<I: IntoIterator<Item = RefreshOutcome>>(outcomes: I) -> Self {
        let mut summary = RefreshSummary::default();
        for outcome in outcomes {
            match outcome {
                RefreshOutcome::Refreshed(token) => summary.succeeded.push(token),
                RefreshOutcome::Failed(failure) => summary.failed.push(failure),
            }
        }
        summary
    }
}

/// Owns the `tokens` table: the only writer, plus the read paths over it.
pub struct TokenRegistry {
    fetcher: TokenFetcher,
    db: Database,
    retries: usize,
}

impl TokenRegistry {
    pub fn new(reader: Arc<dyn ChainReader>, db: Database) -> Self {
        Self {
            fetcher: TokenFetcher::new(reader),
            db,
            retries: 0,
        }
    }

    /// Retry transient fetch failures up to `retries` extra times per token.
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    /// Fetches and upserts every configured token. A failing token is logged and
    /// reported in the summary without affecting the others.
    pub async fn refresh_all(&self, configs: &[TokenConfig]) -> Result<RefreshSummary, ConfigError> {
        validate_token_configs(configs)?;

        info!("Refreshing {} configured tokens", configs.len());
        let outcomes = join_all(configs.iter().map(|config| self.refresh_one(config))).await;
        let summary: RefreshSummary = outcomes.into_iter().collect();

        info!(
            "Token refresh finished: {} succeeded, {} failed",
            summary.succeeded.len(),
            summary.failed.len()
        );
        if !summary.failed.is_empty() {
            warn!("Tokens not refreshed: {}", summary.failed_addresses().join(", "));
        }
        Ok(summary)
    }

    async fn refresh_one(&self, config: &TokenConfig) -> RefreshOutcome {
        match self.try_refresh(config).await {
            Ok(token) => RefreshOutcome::Refreshed(token),
            Err(e) => {
                warn!("Error refreshing token {}: {:#}", config.address, e);
                RefreshOutcome::Failed(RefreshFailure {
                    address: config.address.clone(),
                    error: format!("{e:#}"),
                })
            }
        }
    }

    async fn try_refresh(&self, config: &TokenConfig) -> Result<Token> {
        let info = self.fetch_with_retry(&config.address).await?;
        let logo_url = Some(config.logo_url.clone()).filter(|url| !url.is_empty());
        self.save(info, logo_url).await
    }

    async fn fetch_with_retry(&self, address: &str) -> Result<TokenInfo, FetchError> {
        let strategy = ExponentialBackoff::from_millis(100)
            .factor(2)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.retries);

        RetryIf::start(
            strategy,
            || self.fetcher.fetch(address),
            |e: &FetchError| {
                if e.is_transient() {
                    warn!("Transient error fetching {}, retrying: {}", address, e);
                    true
                } else {
                    false
                }
            },
        )
        .await
    }

    async fn save(&self, info: TokenInfo, logo_url: Option<String>) -> Result<Token> {
        self.db
            .run(move |conn| {
                TokenRepository::new(conn).upsert(&info, logo_url.as_deref(), Utc::now())
            })
            .await
    }

    pub async fn list_all(&self) -> Result<Vec<Token>> {
        self.db
            .run(|conn| TokenRepository::new(conn).list_all())
            .await
    }

    pub async fn get_by_address(&self, address: Address) -> Result<Option<Token>> {
        self.db
            .run(move |conn| TokenRepository::new(conn).get_by_address(&address))
            .await
    }
}
