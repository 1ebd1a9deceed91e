use crate::core::{Config, SwapError, SwapResult};
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Bounded retry policy for read-only RPC calls
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first call
    pub max_retries: u32,
    /// Base delay between retries (milliseconds)
    pub base_delay_ms: u64,
    /// Maximum delay between retries (milliseconds)
    pub max_delay_ms: u64,
    /// Exponential backoff multiplier
    pub backoff_multiplier: f64,
    /// Per-attempt timeout (seconds)
    pub attempt_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
            attempt_timeout_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            attempt_timeout_secs: config.timeout_secs,
            ..Self::default()
        }
    }

    fn delay_for(&self, attempt: u32) -> u64 {
        let delay =
            self.base_delay_ms as f64 * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        (delay as u64).min(self.max_delay_ms)
    }
}

/// Run a read-only call, retrying retryable failures with exponential backoff.
///
/// Never use this for anything that broadcasts a transaction.
pub async fn retry_read<T, F, Fut>(config: &RetryConfig, label: &str, mut op: F) -> SwapResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SwapResult<T>>,
{
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = config.delay_for(attempt);
            debug!(
                "Retrying {} in {}ms (attempt {}/{})",
                label, delay, attempt, config.max_retries
            );
            sleep(Duration::from_millis(delay)).await;
        }

        let result = match timeout(Duration::from_secs(config.attempt_timeout_secs), op()).await {
            Ok(result) => result,
            Err(_) => Err(SwapError::Timeout(config.attempt_timeout_secs)),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                warn!("{} failed: {}", label, e);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
