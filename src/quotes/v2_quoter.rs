use crate::core::{abi::IPancakeV2Router, retry_read, Currency, RetryConfig, SwapResult, V2Pool};
use crate::quotes::revert_as_none;
use alloy::primitives::{Address, U256};
use alloy::providers::DynProvider;

/// Quotes V2 pairs through the router's `getAmountsOut`
pub struct V2Quoter {
    provider: DynProvider,
    router: Address,
    retry: RetryConfig,
}

impl V2Quoter {
    pub fn new(provider: DynProvider, router: Address, retry: RetryConfig) -> Self {
        Self {
            provider,
            router,
            retry,
        }
    }

    async fn get_amounts_out(&self, amount_in: U256, path: Vec<Address>) -> SwapResult<Option<U256>> {
        let router = IPancakeV2Router::new(self.router, self.provider.clone());
        let amounts = revert_as_none(router.getAmountsOut(amount_in, path).call().await)?;
        Ok(amounts.and_then(|amounts| amounts.last().copied()))
    }

    pub async fn quote(
        &self,
        _pool: &V2Pool,
        currency_in: &Currency,
        currency_out: &Currency,
        amount_in: U256,
    ) -> SwapResult<Option<U256>> {
        let path = vec![currency_in.wrapped_address(), currency_out.wrapped_address()];
        retry_read(&self.retry, "v2 getAmountsOut", move || {
            self.get_amounts_out(amount_in, path.clone())
        })
        .await
    }
}
