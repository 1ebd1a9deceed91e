use crate::core::{abi::IStableSwap, retry_read, Currency, RetryConfig, SwapResult, StablePool};
use crate::quotes::revert_as_none;
use alloy::primitives::{Address, U256};
use alloy::providers::DynProvider;

/// Quotes StableSwap pools with the pool's own `get_dy`
pub struct StableQuoter {
    provider: DynProvider,
    retry: RetryConfig,
}

impl StableQuoter {
    pub fn new(provider: DynProvider, retry: RetryConfig) -> Self {
        Self { provider, retry }
    }

    async fn get_dy(&self, pool: Address, i: U256, j: U256, dx: U256) -> SwapResult<Option<U256>> {
        let swap = IStableSwap::new(pool, self.provider.clone());
        revert_as_none(swap.get_dy(i, j, dx).call().await)
    }

    pub async fn quote(
        &self,
        pool: &StablePool,
        currency_in: &Currency,
        amount_in: U256,
    ) -> SwapResult<Option<U256>> {
        // currency0 is coin 0 of the swap contract
        let (i, j) = if pool.currency0.same_wrapped(currency_in) {
            (U256::ZERO, U256::from(1))
        } else {
            (U256::from(1), U256::ZERO)
        };
        let address = pool.address;
        retry_read(&self.retry, "stable get_dy", move || {
            self.get_dy(address, i, j, amount_in)
        })
        .await
    }
}
