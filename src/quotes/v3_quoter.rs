use crate::core::{
    abi::IQuoterV2::{self, QuoteExactInputSingleParams},
    retry_read, Currency, RetryConfig, SwapResult, V3Pool,
};
use crate::quotes::revert_as_none;
use alloy::primitives::{
    aliases::{U160, U24},
    Address, U256,
};
use alloy::providers::DynProvider;

/// Quotes V3 pools through QuoterV2 `quoteExactInputSingle`
pub struct V3Quoter {
    provider: DynProvider,
    quoter: Address,
    retry: RetryConfig,
}

impl V3Quoter {
    pub fn new(provider: DynProvider, quoter: Address, retry: RetryConfig) -> Self {
        Self {
            provider,
            quoter,
            retry,
        }
    }

    async fn quote_single(
        &self,
        token_in: Address,
        token_out: Address,
        fee: u32,
        amount_in: U256,
    ) -> SwapResult<Option<U256>> {
        let quoter = IQuoterV2::new(self.quoter, self.provider.clone());
        let params = QuoteExactInputSingleParams {
            tokenIn: token_in,
            tokenOut: token_out,
            amountIn: amount_in,
            fee: U24::from(fee),
            sqrtPriceLimitX96: U160::ZERO,
        };
        let quote = revert_as_none(quoter.quoteExactInputSingle(params).call().await)?;
        Ok(quote.map(|q| q.amountOut))
    }

    pub async fn quote(
        &self,
        pool: &V3Pool,
        currency_in: &Currency,
        currency_out: &Currency,
        amount_in: U256,
    ) -> SwapResult<Option<U256>> {
        let token_in = currency_in.wrapped_address();
        let token_out = currency_out.wrapped_address();
        let fee = pool.fee;
        retry_read(&self.retry, "v3 quoteExactInputSingle", move || {
            self.quote_single(token_in, token_out, fee, amount_in)
        })
        .await
    }
}
