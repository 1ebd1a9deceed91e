use crate::core::{
    abi::{IPancakeV3Factory, IPancakeV3Pool},
    retry_read, Currency, RetryConfig, SwapResult, V3_FEE_TIERS,
};
use crate::discovery::pool_finder::{DiscoveredPool, PoolFinder};
use alloy::primitives::{aliases::U24, Address, U256};
use alloy::providers::DynProvider;
use futures::future::join_all;
use log::debug;

struct V3State {
    token0: Address,
    tick_spacing: i32,
    sqrt_price_x96: U256,
    tick: i32,
    liquidity: u128,
}

/// PancakeSwap V3 pools, one per (pair, fee tier)
pub struct V3PoolFinder {
    provider: DynProvider,
    factory: Address,
    retry: RetryConfig,
}

impl V3PoolFinder {
    pub fn new(provider: DynProvider, factory: Address, retry: RetryConfig) -> Self {
        Self {
            provider,
            factory,
            retry,
        }
    }

    async fn get_pool(&self, token_a: Address, token_b: Address, fee: u32) -> SwapResult<Address> {
        let factory = IPancakeV3Factory::new(self.factory, self.provider.clone());
        Ok(factory
            .getPool(token_a, token_b, U24::from(fee))
            .call()
            .await?)
    }

    async fn read_state(&self, address: Address) -> SwapResult<V3State> {
        let pool = IPancakeV3Pool::new(address, self.provider.clone());
        let slot0 = pool.slot0().call().await?;
        let liquidity = pool.liquidity().call().await?;
        let token0 = pool.token0().call().await?;
        let tick_spacing = pool.tickSpacing().call().await?;

        Ok(V3State {
            token0,
            tick_spacing: tick_spacing.as_i32(),
            sqrt_price_x96: U256::from(slot0.sqrtPriceX96),
            tick: slot0.tick.as_i32(),
            liquidity,
        })
    }

    async fn find_pool(
        &self,
        token_a: Address,
        token_b: Address,
        fee: u32,
    ) -> SwapResult<Option<DiscoveredPool>> {
        let address =
            retry_read(&self.retry, "v3 getPool", move || self.get_pool(token_a, token_b, fee)).await?;
        if address == Address::ZERO {
            return Ok(None);
        }

        let state = retry_read(&self.retry, "v3 slot0", move || self.read_state(address)).await?;
        if state.liquidity == 0 || state.sqrt_price_x96.is_zero() {
            debug!("V3 pool {} has no liquidity", address);
            return Ok(None);
        }

        let token1 = if state.token0 == token_a { token_b } else { token_a };
        Ok(Some(DiscoveredPool::V3 {
            address,
            token0: state.token0,
            token1,
            fee,
            tick_spacing: state.tick_spacing,
            sqrt_price_x96: state.sqrt_price_x96,
            tick: state.tick,
            liquidity: state.liquidity,
        }))
    }
}

#[async_trait::async_trait]
impl PoolFinder for V3PoolFinder {
    fn name(&self) -> &'static str {
        "v3"
    }

    async fn find_pools(&self, pairs: &[(Currency, Currency)]) -> SwapResult<Vec<DiscoveredPool>> {
        debug!(
            "Searching for V3 pools across {} candidates and {} fee tiers",
            pairs.len(),
            V3_FEE_TIERS.len()
        );

        let lookups = pairs.iter().flat_map(|(a, b)| {
            let (token_a, token_b) = (a.wrapped_address(), b.wrapped_address());
            V3_FEE_TIERS
                .iter()
                .map(move |fee| self.find_pool(token_a, token_b, *fee))
        });

        let mut pools = Vec::new();
        for result in join_all(lookups).await {
            if let Some(pool) = result? {
                pools.push(pool);
            }
        }
        Ok(pools)
    }
}
