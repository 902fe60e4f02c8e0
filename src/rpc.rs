use crate::erc20::{decimalsCall, nameCall, symbolCall, totalSupplyCall};
use alloy::network::TransactionBuilder;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use alloy::transports::TransportError;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use std::future::IntoFuture;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid RPC URL: {url}")]
    InvalidUrl { url: String },

    #[error("RPC transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("request timeout after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("failed to decode contract response: {0}")]
    Decode(#[from] alloy::sol_types::Error),
}

impl RpcError {
    /// Whether repeating the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RpcError::Transport(e) => !matches!(e, alloy::transports::RpcError::ErrorResp(_)),
            RpcError::Timeout(_) => true,
            RpcError::InvalidUrl { .. } | RpcError::Decode(_) => false,
        }
    }
}

/// The read-only chain calls the rest of the crate depends on.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn name(&self, token: Address) -> Result<String, RpcError>;
    async fn symbol(&self, token: Address) -> Result<String, RpcError>;
    async fn decimals(&self, token: Address) -> Result<u8, RpcError>;
    async fn total_supply(&self, token: Address) -> Result<U256, RpcError>;
    async fn native_balance(&self, account: Address) -> Result<U256, RpcError>;
}

/// Process-wide JSON-RPC client. Cloning shares the underlying provider.
#[derive(Clone)]
pub struct RpcClient {
    provider: DynProvider,
    url: String,
    request_timeout: Duration,
}

impl RpcClient {
    pub fn new(rpc_url: &str, request_timeout: Duration) -> Result<Self, RpcError> {
        let parsed_url = rpc_url.parse().map_err(|_| RpcError::InvalidUrl {
            url: rpc_url.to_string(),
        })?;
        let provider = ProviderBuilder::new().connect_http(parsed_url).erased();

        Ok(RpcClient {
            provider,
            url: rpc_url.to_string(),
            request_timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn with_timeout<F, T>(&self, request: F) -> Result<T, RpcError>
    where
        F: IntoFuture<Output = Result<T, TransportError>>,
    {
        match timeout(self.request_timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!("RPC error on {}: {}", self.url, e);
                Err(RpcError::Transport(e))
            }
            Err(_) => {
                warn!(
                    "Request timeout after {} seconds on {}",
                    self.request_timeout.as_secs(),
                    self.url
                );
                Err(RpcError::Timeout(self.request_timeout))
            }
        }
    }

    pub async fn call_contract<C>(&self, address: Address, call: C) -> Result<C::Return, RpcError>
    where
        C: SolCall + Send,
    {
        debug!("eth_call {} on {:?}", C::SIGNATURE, address);
        let tx = TransactionRequest::default()
            .with_to(address)
            .with_input(call.abi_encode());

        let output = self.with_timeout(self.provider.call(tx)).await?;
        Ok(C::abi_decode_returns(&output)?)
    }
}

#[async_trait]
impl ChainReader for RpcClient {
    async fn name(&self, token: Address) -> Result<String, RpcError> {
        self.call_contract(token, nameCall {}).await
    }

    async fn symbol(&self, token: Address) -> Result<String, RpcError> {
        self.call_contract(token, symbolCall {}).await
    }

    async fn decimals(&self, token: Address) -> Result<u8, RpcError> {
        self.call_contract(token, decimalsCall {}).await
    }

    async fn total_supply(&self, token: Address) -> Result<U256, RpcError> {
        self.call_contract(token, totalSupplyCall {}).await
    }

    async fn native_balance(&self, account: Address) -> Result<U256, RpcError> {
        self.with_timeout(self.provider.get_balance(account)).await
    }
}
