use crate::core::{
    abi::{IPancakeV2Factory, IPancakeV2Pair},
    retry_read, Currency, RetryConfig, SwapResult,
};
use crate::discovery::pool_finder::{DiscoveredPool, PoolFinder};
use alloy::primitives::{Address, U256};
use alloy::providers::DynProvider;
use futures::future::join_all;
use log::debug;

/// PancakeSwap V2 constant-product pairs, one per token pair
pub struct V2PoolFinder {
    provider: DynProvider,
    factory: Address,
    retry: RetryConfig,
}

impl V2PoolFinder {
    pub fn new(provider: DynProvider, factory: Address, retry: RetryConfig) -> Self {
        Self {
            provider,
            factory,
            retry,
        }
    }

    async fn get_pair(&self, token_a: Address, token_b: Address) -> SwapResult<Address> {
        let factory = IPancakeV2Factory::new(self.factory, self.provider.clone());
        Ok(factory.getPair(token_a, token_b).call().await?)
    }

    async fn read_pair(&self, address: Address) -> SwapResult<(Address, U256, U256)> {
        let pair = IPancakeV2Pair::new(address, self.provider.clone());
        let token0 = pair.token0().call().await?;
        let reserves = pair.getReserves().call().await?;
        Ok((
            token0,
            U256::from(reserves.reserve0),
            U256::from(reserves.reserve1),
        ))
    }

    async fn find_pair(&self, token_a: Address, token_b: Address) -> SwapResult<Option<DiscoveredPool>> {
        let address = retry_read(&self.retry, "v2 getPair", move || self.get_pair(token_a, token_b)).await?;
        if address == Address::ZERO {
            return Ok(None);
        }

        let (token0, reserve0, reserve1) =
            retry_read(&self.retry, "v2 getReserves", move || self.read_pair(address)).await?;

        if reserve0.is_zero() || reserve1.is_zero() {
            debug!("V2 pair {} has no liquidity", address);
            return Ok(None);
        }

        let token1 = if token0 == token_a { token_b } else { token_a };
        Ok(Some(DiscoveredPool::V2 {
            address,
            token0,
            token1,
            reserve0,
            reserve1,
        }))
    }
}

#[async_trait::async_trait]
impl PoolFinder for V2PoolFinder {
    fn name(&self) -> &'static str {
        "v2"
    }

    async fn find_pools(&self, pairs: &[(Currency, Currency)]) -> SwapResult<Vec<DiscoveredPool>> {
        debug!("Searching for V2 pairs across {} candidates", pairs.len());

        let lookups = pairs
            .iter()
            .map(|(a, b)| self.find_pair(a.wrapped_address(), b.wrapped_address()));

        let mut pools = Vec::new();
        for result in join_all(lookups).await {
            if let Some(pool) = result? {
                pools.push(pool);
            }
        }
        Ok(pools)
    }
}
