//! Gas settings oracles.
//!
//! Two variants: a fixed [StaticGasOracle] and an [RpcGasOracle] that
//! refreshes from the node every 30 seconds, caching a 1.2x bumped fee cap
//! so short price spikes between refreshes do not strand transactions.
//! `get()` always serves from the cache and never blocks on RPC.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use async_trait::async_trait;
use custodia_chain::{ChainClient, ChainError, GasSettings};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Cache refresh cadence of the RPC oracle.
const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Default gas limit applied to contract-execution transactions.
pub const DEFAULT_GAS_LIMIT: u64 = 250_000;

/// Fallback fee cap of the static oracle: 15 gwei.
pub const DEFAULT_FEE_CAP: u128 = 15_000_000_000;

/// Fallback tip cap of the static oracle: 1 gwei.
pub const DEFAULT_TIP_CAP: u128 = 1_000_000_000;

/// Supplies the gas settings every signed transaction is built with.
#[async_trait]
pub trait GasOracle: Send + Sync + std::fmt::Debug {
    /// Returns the current settings from cache; never blocks on RPC.
    fn get(&self) -> GasSettings;

    /// Starts background refresh. No-op by default.
    async fn start(&self) -> Result<(), ChainError> {
        Ok(())
    }

    /// Stops background refresh. No-op by default.
    fn stop(&self) {}
}

/// An oracle returning one fixed settings tuple.
#[derive(Debug, Clone)]
pub struct StaticGasOracle {
    settings: GasSettings,
}

impl StaticGasOracle {
    /// Creates an oracle pinned to `settings`.
    pub const fn new(settings: GasSettings) -> Self {
        Self { settings }
    }
}

impl Default for StaticGasOracle {
    fn default() -> Self {
        Self::new(GasSettings {
            fee_cap: DEFAULT_FEE_CAP,
            tip_cap: DEFAULT_TIP_CAP,
            gas_limit: DEFAULT_GAS_LIMIT,
        })
    }
}

#[async_trait]
impl GasOracle for StaticGasOracle {
    fn get(&self) -> GasSettings {
        self.settings
    }
}

/// An oracle tracking the node's fee market.
///
/// Caches `fee_cap = gas_price * 1.2`, the raw suggested tip and a fixed
/// gas limit; a background task refreshes the cache every 30 seconds.
#[derive(Debug)]
pub struct RpcGasOracle {
    client: ChainClient,
    sender: watch::Sender<GasSettings>,
    receiver: watch::Receiver<GasSettings>,
    cancel: CancellationToken,
}

impl RpcGasOracle {
    /// Creates an oracle over the shared chain client.
    pub fn new(client: ChainClient) -> Self {
        let (sender, receiver) = watch::channel(GasSettings {
            fee_cap: DEFAULT_FEE_CAP,
            tip_cap: DEFAULT_TIP_CAP,
            gas_limit: DEFAULT_GAS_LIMIT,
        });
        Self { client, sender, receiver, cancel: CancellationToken::new() }
    }

    async fn refresh(
        client: &ChainClient,
        sender: &watch::Sender<GasSettings>,
    ) -> Result<(), ChainError> {
        let gas_price = client.gas_price().await?;
        let tip_cap = client.max_priority_fee().await?;
        // Pay 20% over the quoted price to ride out fluctuations between
        // cache refreshes.
        let settings = GasSettings {
            fee_cap: gas_price * 120 / 100,
            tip_cap,
            gas_limit: DEFAULT_GAS_LIMIT,
        };
        sender.send_replace(settings);
        debug!(
            target: "gas",
            fee_cap = settings.fee_cap,
            tip_cap = settings.tip_cap,
            "updated rpc gas price"
        );
        Ok(())
    }
}

#[async_trait]
impl GasOracle for RpcGasOracle {
    fn get(&self) -> GasSettings {
        *self.receiver.borrow()
    }

    async fn start(&self) -> Result<(), ChainError> {
        // Fail fast if the endpoint cannot serve an initial quote.
        Self::refresh(&self.client, &self.sender).await?;

        let client = self.client.clone();
        let sender = self.sender.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(REFRESH_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!(target: "gas", "stopping rpc gas oracle updater");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(e) = Self::refresh(&client, &sender).await {
                            error!(target: "gas", "failed to update rpc gas price: {e}");
                        }
                    }
                }
            }
        });
        Ok(())
    }

    fn stop(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_oracle_returns_fixed_settings() {
        let oracle = StaticGasOracle::default();
        let settings = oracle.get();
        assert_eq!(settings.fee_cap, DEFAULT_FEE_CAP);
        assert_eq!(settings.tip_cap, DEFAULT_TIP_CAP);
        assert_eq!(settings.gas_limit, DEFAULT_GAS_LIMIT);
        assert_eq!(oracle.get(), settings);
    }

    #[tokio::test]
    async fn rpc_oracle_serves_cache_before_first_refresh() {
        let client =
            ChainClient::new_http("http://localhost:8545".parse().unwrap(), 44787);
        let oracle = RpcGasOracle::new(client);
        // Never started, so get() must serve the seeded defaults without RPC.
        assert_eq!(oracle.get().gas_limit, DEFAULT_GAS_LIMIT);
        oracle.stop();
    }
}
