use crate::core::{
    abi::{IInfinityQuoter, PoolKey},
    retry_read, Currency, InfinityBinPool, InfinityClPool, InfinityPoolKey, RetryConfig,
    SwapResult,
};
use crate::quotes::revert_as_none;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::DynProvider;

/// Quotes Infinity CL and Bin pools through their dedicated quoters
pub struct InfinityQuoter {
    provider: DynProvider,
    cl_quoter: Address,
    bin_quoter: Address,
    retry: RetryConfig,
}

impl InfinityQuoter {
    pub fn new(provider: DynProvider, cl_quoter: Address, bin_quoter: Address, retry: RetryConfig) -> Self {
        Self {
            provider,
            cl_quoter,
            bin_quoter,
            retry,
        }
    }

    async fn quote_single(
        &self,
        quoter: Address,
        pool_key: PoolKey,
        zero_for_one: bool,
        exact_amount: u128,
    ) -> SwapResult<Option<U256>> {
        let quoter = IInfinityQuoter::new(quoter, self.provider.clone());
        let params = IInfinityQuoter::QuoteExactSingleParams {
            poolKey: pool_key,
            zeroForOne: zero_for_one,
            exactAmount: exact_amount,
            hookData: Bytes::new(),
        };
        let quote = revert_as_none(quoter.quoteExactInputSingle(params).call().await)?;
        Ok(quote.map(|q| q.amountOut))
    }

    async fn quote_key(
        &self,
        quoter: Address,
        key: &InfinityPoolKey,
        currency_in: &Currency,
        amount_in: U256,
    ) -> SwapResult<Option<U256>> {
        // Infinity amounts are uint128
        let Ok(exact_amount) = u128::try_from(amount_in) else {
            return Ok(None);
        };
        let zero_for_one = key.currency0.same_wrapped(currency_in);
        let pool_key = key.to_abi();
        retry_read(&self.retry, "infinity quoteExactInputSingle", move || {
            self.quote_single(quoter, pool_key.clone(), zero_for_one, exact_amount)
        })
        .await
    }

    pub async fn quote_cl(
        &self,
        pool: &InfinityClPool,
        currency_in: &Currency,
        amount_in: U256,
    ) -> SwapResult<Option<U256>> {
        self.quote_key(self.cl_quoter, &pool.key, currency_in, amount_in)
            .await
    }

    pub async fn quote_bin(
        &self,
        pool: &InfinityBinPool,
        currency_in: &Currency,
        amount_in: U256,
    ) -> SwapResult<Option<U256>> {
        self.quote_key(self.bin_quoter, &pool.key, currency_in, amount_in)
            .await
    }
}
