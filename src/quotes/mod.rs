pub mod infinity_quoter;
pub mod stable_quoter;
pub mod v2_quoter;
pub mod v3_quoter;

use crate::core::{Config, Currency, Pool, RetryConfig, SwapError, SwapResult};
use alloy::primitives::U256;
use alloy::providers::DynProvider;
use log::debug;

pub use infinity_quoter::InfinityQuoter;
pub use stable_quoter::StableQuoter;
pub use v2_quoter::V2Quoter;
pub use v3_quoter::V3Quoter;

/// Per-pool exact-input quoting capability.
///
/// `Ok(None)` means the pool cannot fill the amount; `Err` is reserved for
/// failures that should abort the attempt.
#[async_trait::async_trait]
pub trait PoolQuoter: Send + Sync {
    async fn quote_exact_input(
        &self,
        pool: &Pool,
        currency_in: &Currency,
        amount_in: U256,
    ) -> SwapResult<Option<U256>>;
}

/// Main quote engine that delegates to the protocol's own on-chain quoter
pub struct QuoteEngine {
    v2: V2Quoter,
    v3: V3Quoter,
    stable: StableQuoter,
    infinity: InfinityQuoter,
}

impl QuoteEngine {
    pub fn new(provider: DynProvider, config: &Config) -> Self {
        let retry = RetryConfig::from_config(config);
        let contracts = &config.contracts;
        Self {
            v2: V2Quoter::new(provider.clone(), contracts.v2_router, retry.clone()),
            v3: V3Quoter::new(provider.clone(), contracts.v3_quoter, retry.clone()),
            stable: StableQuoter::new(provider.clone(), retry.clone()),
            infinity: InfinityQuoter::new(
                provider,
                contracts.infinity_cl_quoter,
                contracts.infinity_bin_quoter,
                retry,
            ),
        }
    }
}

#[async_trait::async_trait]
impl PoolQuoter for QuoteEngine {
    async fn quote_exact_input(
        &self,
        pool: &Pool,
        currency_in: &Currency,
        amount_in: U256,
    ) -> SwapResult<Option<U256>> {
        let currency_out = pool.other(currency_in).ok_or_else(|| {
            SwapError::InvalidArgument(format!("{} does not trade {}", pool, currency_in))
        })?;

        let quote = match pool {
            Pool::V2(p) => self.v2.quote(p, currency_in, currency_out, amount_in).await?,
            Pool::V3(p) => self.v3.quote(p, currency_in, currency_out, amount_in).await?,
            Pool::Stable(p) => self.stable.quote(p, currency_in, amount_in).await?,
            Pool::InfinityCl(p) => self.infinity.quote_cl(p, currency_in, amount_in).await?,
            Pool::InfinityBin(p) => self.infinity.quote_bin(p, currency_in, amount_in).await?,
        };

        debug!(
            "Quote {} {} -> {:?} {} via {}",
            amount_in,
            currency_in,
            quote,
            currency_out,
            pool.kind()
        );
        Ok(quote)
    }
}

/// A node error response (revert) means the pool cannot fill; anything else on
/// the transport is a network failure.
pub(crate) fn revert_as_none<T>(result: Result<T, alloy::contract::Error>) -> SwapResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(alloy::contract::Error::TransportError(e)) => {
            if e.as_error_resp().is_some() {
                debug!("Quoter reverted: {}", e);
                Ok(None)
            } else {
                Err(SwapError::NetworkError(e.to_string()))
            }
        }
        Err(e) => {
            debug!("Quoter returned unusable data: {}", e);
            Ok(None)
        }
    }
}
