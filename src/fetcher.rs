use crate::rpc::{ChainReader, RpcError};
use alloy_primitives::{Address, U256};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// On-chain facts about an ERC-20 contract, as read in a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to fetch token info for {address}: invalid address ({reason})")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to fetch token info for {address}: {source}")]
    Rpc {
        address: String,
        #[source]
        source: RpcError,
    },
}

impl FetchError {
    pub fn address(&self) -> &str {
        match self {
            FetchError::InvalidAddress { address, .. } | FetchError::Rpc { address, .. } => address,
        }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::InvalidAddress { .. } => false,
            FetchError::Rpc { source, .. } => source.is_transient(),
        }
    }
}

pub struct TokenFetcher<R: ?Sized = dyn ChainReader> {
    reader: Arc<R>,
}

impl<R: ?Sized> Clone for TokenFetcher<R> {
    fn clone(&self) -> Self {
        Self {
            reader: Arc::clone(&self.reader),
        }
    }
}

impl<R: ChainReader + ?Sized> TokenFetcher<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self { reader }
    }

    /// Reads name, symbol, decimals and total supply concurrently.
    /// Either all four succeed or the whole fetch fails.
    pub async fn fetch(&self, address: &str) -> Result<TokenInfo, FetchError> {
        let token = Address::from_str(address.trim()).map_err(|e| FetchError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

        debug!("Fetching token metadata for {:?}", token);

        let (name, symbol, decimals, total_supply) = futures::try_join!(
            self.reader.name(token),
            self.reader.symbol(token),
            self.reader.decimals(token),
            self.reader.total_supply(token),
        )
        .map_err(|source| FetchError::Rpc {
            address: address.to_string(),
            source,
        })?;

        info!(
            "Fetched {} ({}) at {}: decimals={}, total_supply={}",
            name, symbol, token, decimals, total_supply
        );

        Ok(TokenInfo {
            address: token,
            name,
            symbol,
            decimals,
            total_supply,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-memory chain used by fetcher, registry and monitor tests.
    #[derive(Default)]
    pub(crate) struct FakeChain {
        pub tokens: Mutex<HashMap<Address, TokenInfo>>,
        pub failing: Mutex<HashSet<Address>>,
        pub failing_symbol: Mutex<HashSet<Address>>,
        pub flaky: Mutex<HashMap<Address, usize>>,
        pub balances: Mutex<Vec<Result<U256, ()>>>,
        pub calls: AtomicUsize,
    }

    impl FakeChain {
        pub fn with_token(
            self,
            address: &str,
            name: &str,
            symbol: &str,
            decimals: u8,
            supply: &str,
        ) -> Self {
            let address = Address::from_str(address).unwrap();
            self.tokens.lock().unwrap().insert(
                address,
                TokenInfo {
                    address,
                    name: name.to_string(),
                    symbol: symbol.to_string(),
                    decimals,
                    total_supply: U256::from_str(supply).unwrap(),
                },
            );
            self
        }

        pub fn fail_token(&self, address: &str) {
            self.failing
                .lock()
                .unwrap()
                .insert(Address::from_str(address).unwrap());
        }

        /// The next `times` reads against `address` fail with a timeout.
        pub fn flake_token(&self, address: &str, times: usize) {
            self.flaky
                .lock()
                .unwrap()
                .insert(Address::from_str(address).unwrap(), times);
        }

        pub fn heal_token(&self, address: &str) {
            self.failing
                .lock()
                .unwrap()
                .remove(&Address::from_str(address).unwrap());
        }

        /// Balance results are served in order; the last one repeats.
        pub fn push_balance(&self, balance: Result<u64, ()>) {
            self.balances.lock().unwrap().push(balance.map(U256::from));
        }

        fn lookup(&self, token: Address) -> Result<TokenInfo, RpcError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.lock().unwrap().contains(&token) {
                return Err(RpcError::Timeout(Duration::from_secs(1)));
            }
            if let Some(remaining) = self.flaky.lock().unwrap().get_mut(&token) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(RpcError::Timeout(Duration::from_secs(1)));
                }
            }
            self.tokens
                .lock()
                .unwrap()
                .get(&token)
                .cloned()
                .ok_or_else(|| RpcError::Decode(alloy::sol_types::Error::Overrun))
        }
    }

    #[async_trait]
    impl ChainReader for FakeChain {
        async fn name(&self, token: Address) -> Result<String, RpcError> {
            self.lookup(token).map(|t| t.name)
        }

        async fn symbol(&self, token: Address) -> Result<String, RpcError> {
            if self.failing_symbol.lock().unwrap().contains(&token) {
                self.calls.fetch_add(1, Ordering::SeqCst);
                return Err(RpcError::Timeout(Duration::from_secs(1)));
            }
            self.lookup(token).map(|t| t.symbol)
        }

        async fn decimals(&self, token: Address) -> Result<u8, RpcError> {
            self.lookup(token).map(|t| t.decimals)
        }

        async fn total_supply(&self, token: Address) -> Result<U256, RpcError> {
            self.lookup(token).map(|t| t.total_supply)
        }

        async fn native_balance(&self, _account: Address) -> Result<U256, RpcError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut balances = self.balances.lock().unwrap();
            let next = if balances.len() > 1 {
                balances.remove(0)
            } else {
                balances.first().cloned().unwrap_or(Err(()))
            };
            next.map_err(|_| RpcError::Timeout(Duration::from_secs(1)))
        }
    }

    pub(crate) const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";
    pub(crate) const DAI: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";
    pub(crate) const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

    #[tokio::test]
    async fn fetches_all_four_fields() {
        let chain = FakeChain::default().with_token(
            WETH,
            "Wrapped Ether",
            "WETH",
            18,
            "1000000000000000000000",
        );
        let fetcher = TokenFetcher::new(Arc::new(chain));

        let info = fetcher.fetch(WETH).await.unwrap();
        assert_eq!(info.name, "Wrapped Ether");
        assert_eq!(info.symbol, "WETH");
        assert_eq!(info.decimals, 18);
        assert_eq!(info.total_supply.to_string(), "1000000000000000000000");
    }

    #[tokio::test]
    async fn one_failed_read_fails_the_whole_fetch() {
        let chain = FakeChain::default().with_token(WETH, "Wrapped Ether", "WETH", 18, "1");
        chain
            .failing_symbol
            .lock()
            .unwrap()
            .insert(Address::from_str(WETH).unwrap());
        let fetcher = TokenFetcher::new(Arc::new(chain));

        let err = fetcher.fetch(WETH).await.unwrap_err();
        assert_eq!(err.address(), WETH);
        assert!(err.is_transient());
        assert!(matches!(err, FetchError::Rpc { .. }));
    }

    #[tokio::test]
    async fn malformed_address_is_wrapped() {
        let fetcher = TokenFetcher::new(Arc::new(FakeChain::default()));

        let err = fetcher.fetch("0xnot-an-address").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidAddress { .. }));
        assert_eq!(err.address(), "0xnot-an-address");
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn address_case_does_not_matter() {
        let chain = FakeChain::default().with_token(DAI, "Dai Stablecoin", "DAI", 18, "5");
        let fetcher = TokenFetcher::new(Arc::new(chain));

        let info = fetcher.fetch(&DAI.to_lowercase()).await.unwrap();
        assert_eq!(info.address, Address::from_str(DAI).unwrap());
    }
}
