pub mod api;
pub mod config;
pub mod erc20;
pub mod fetcher;
pub mod monitor;
pub mod notifier;
pub mod query;
pub mod reconciler;
pub mod repository;
pub mod rpc;
pub mod signal;
pub mod token_config;
pub mod units;
