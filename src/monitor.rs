use crate::notifier::NotificationSink;
use crate::rpc::{ChainReader, RpcError};
use crate::units::format_native;
use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const SHUTDOWN_MESSAGE: &str = "⚠️ Balance Monitor Bot is shutting down";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceObservation {
    pub address: Address,
    pub amount: U256,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increased,
    Decreased,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Increased => f.write_str("increased"),
            Direction::Decreased => f.write_str("decreased"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub previous: U256,
    pub current: U256,
    pub direction: Direction,
    /// Absolute difference between `previous` and `current`.
    pub delta: U256,
}

impl BalanceChange {
    /// `None` when the balances are equal.
    pub fn between(previous: U256, current: U256) -> Option<Self> {
        let (direction, delta) = if current > previous {
            (Direction::Increased, current - previous)
        } else if current < previous {
            (Direction::Decreased, previous - current)
        } else {
            return None;
        };

        Some(BalanceChange {
            previous,
            current,
            direction,
            delta,
        })
    }

    pub fn message(&self, address: &Address, symbol: &str) -> String {
        format!(
            "🚨 Alert: The account {} balance has {} by {} {}\n\n\
             Previous balance: {} {}\n\
             Current balance: {} {}",
            address,
            self.direction,
            format_native(self.delta),
            symbol,
            format_native(self.previous),
            symbol,
            format_native(self.current),
            symbol,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    NotStarted,
    FetchFailed,
    Unchanged,
    Changed(BalanceChange),
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("failed to read initial balance for {address}: {source}")]
    InitialBalance {
        address: Address,
        #[source]
        source: RpcError,
    },
}

enum MonitorState {
    Uninitialized,
    Monitoring(BalanceObservation),
}

/// Polls one account's native balance and notifies on every change.
pub struct BalanceMonitor {
    reader: Arc<dyn ChainReader>,
    sink: NotificationSink,
    address: Address,
    interval: Duration,
    symbol: String,
    state: MonitorState,
}

impl BalanceMonitor {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        sink: NotificationSink,
        address: Address,
        interval: Duration,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            sink,
            address,
            interval,
            symbol: symbol.into(),
            state: MonitorState::Uninitialized,
        }
    }

    pub fn observation(&self) -> Option<&BalanceObservation> {
        match &self.state {
            MonitorState::Uninitialized => None,
            MonitorState::Monitoring(observation) => Some(observation),
        }
    }

    fn observe(&mut self, amount: U256) {
        self.state = MonitorState::Monitoring(BalanceObservation {
            address: self.address,
            amount,
            observed_at: Utc::now(),
        });
    }

    /// Records the baseline balance and announces the monitor. A failed read here
    /// leaves nothing to compare against, so it is returned to the caller.
    pub async fn start(&mut self) -> Result<U256, MonitorError> {
        let balance = self
            .reader
            .native_balance(self.address)
            .await
            .map_err(|source| MonitorError::InitialBalance {
                address: self.address,
                source,
            })?;

        self.observe(balance);
        info!(
            "Initial balance recorded for {}: {} {}",
            self.address,
            format_native(balance),
            self.symbol
        );

        let message = format!(
            "🔄 Balance Monitor Bot started\n\n\
             Monitoring account: {}\n\
             Current balance: {} {}\n\
             Polling interval: {} seconds",
            self.address,
            format_native(balance),
            self.symbol,
            self.interval.as_millis() as f64 / 1000.0,
        );
        self.sink.send(&message).await;

        Ok(balance)
    }

    /// One poll: fetch, compare with the last observation, notify on change.
    pub async fn tick(&mut self) -> TickOutcome {
        let previous = match &self.state {
            MonitorState::Uninitialized => return TickOutcome::NotStarted,
            MonitorState::Monitoring(observation) => observation.amount,
        };

        let current = match self.reader.native_balance(self.address).await {
            Ok(balance) => balance,
            Err(e) => {
                error!("Error checking balance for {}: {}", self.address, e);
                return TickOutcome::FetchFailed;
            }
        };

        info!(
            "Current balance for {}: {} {}",
            self.address,
            format_native(current),
            self.symbol
        );

        match BalanceChange::between(previous, current) {
            None => {
                debug!("No balance change detected");
                TickOutcome::Unchanged
            }
            Some(change) => {
                self.sink
                    .send(&change.message(&self.address, &self.symbol))
                    .await;
                self.observe(current);
                TickOutcome::Changed(change)
            }
        }
    }

    pub async fn shutdown(&self) {
        info!("Bot shutting down...");
        self.sink.send(SHUTDOWN_MESSAGE).await;
    }

    /// Polls every interval until `cancel` fires, then sends the shutdown notice.
    /// Ticks never overlap; a poll in progress finishes before cancellation is seen.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), MonitorError> {
        if self.observation().is_none() {
            self.start().await?;
        }

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "Balance checking scheduled every {} seconds",
            self.interval.as_millis() as f64 / 1000.0
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }
}
