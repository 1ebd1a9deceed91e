use crate::core::{SwapError, SwapResult};
use alloy::primitives::TxHash;
use log::{debug, info, warn};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Transaction status monitoring configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Maximum time to wait for a receipt (seconds)
    pub confirmation_timeout_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_secs: crate::core::DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }
}

/// Waits for broadcast transactions to be mined.
///
/// A transaction is never rebroadcast here: once it has a hash, the only
/// outcomes are confirmed, reverted or reported as pending.
#[derive(Debug, Clone)]
pub struct TransactionMonitor {
    config: MonitorConfig,
}

impl TransactionMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self { config }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.confirmation_timeout_secs)
    }

    /// Wait for `receipt` under the confirmation timeout.
    ///
    /// Timing out, or losing the receipt watch, yields `TransactionPending`
    /// since the transaction may still land.
    pub async fn wait_for<T, F>(&self, hash: TxHash, label: &str, receipt: F) -> SwapResult<T>
    where
        F: Future<Output = SwapResult<T>>,
    {
        let start = Instant::now();
        debug!("Waiting up to {}s for {} {}", self.config.confirmation_timeout_secs, label, hash);

        match timeout(self.timeout(), receipt).await {
            Ok(Ok(value)) => {
                info!("{} confirmed in {:.1}s: {}", label, start.elapsed().as_secs_f64(), hash);
                Ok(value)
            }
            Ok(Err(SwapError::NetworkError(e))) => {
                warn!("Lost track of {} {}: {}", label, hash, e);
                Err(SwapError::TransactionPending(hash))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                warn!(
                    "{} {} not confirmed after {}s",
                    label, hash, self.config.confirmation_timeout_secs
                );
                Err(SwapError::TransactionPending(hash))
            }
        }
    }
}
