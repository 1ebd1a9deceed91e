use crate::core::{
    abi::{IStableSwap, IStableSwapFactory},
    retry_read, Currency, RetryConfig, SwapResult,
};
use crate::discovery::pool_finder::{DiscoveredPool, PoolFinder};
use alloy::primitives::{Address, U256};
use alloy::providers::DynProvider;
use futures::future::join_all;
use log::debug;

struct StableState {
    coin0: Address,
    coin1: Address,
    balance0: U256,
    balance1: U256,
    amplifier: U256,
    fee: U256,
}

/// PancakeSwap two-coin StableSwap pools registered in the stable factory
pub struct StablePoolFinder {
    provider: DynProvider,
    factory: Address,
    retry: RetryConfig,
}

impl StablePoolFinder {
    pub fn new(provider: DynProvider, factory: Address, retry: RetryConfig) -> Self {
        Self {
            provider,
            factory,
            retry,
        }
    }

    async fn get_swap_contract(&self, token_a: Address, token_b: Address) -> SwapResult<Address> {
        let factory = IStableSwapFactory::new(self.factory, self.provider.clone());
        let info = factory.getPairInfo(token_a, token_b).call().await?;
        Ok(info.swapContract)
    }

    async fn read_state(&self, address: Address) -> SwapResult<StableState> {
        let pool = IStableSwap::new(address, self.provider.clone());
        Ok(StableState {
            coin0: pool.coins(U256::ZERO).call().await?,
            coin1: pool.coins(U256::from(1)).call().await?,
            balance0: pool.balances(U256::ZERO).call().await?,
            balance1: pool.balances(U256::from(1)).call().await?,
            amplifier: pool.A().call().await?,
            fee: pool.fee().call().await?,
        })
    }

    async fn find_pool(&self, token_a: Address, token_b: Address) -> SwapResult<Option<DiscoveredPool>> {
        let address = retry_read(&self.retry, "stable getPairInfo", move || {
            self.get_swap_contract(token_a, token_b)
        })
        .await?;
        if address == Address::ZERO {
            return Ok(None);
        }

        let state = retry_read(&self.retry, "stable balances", move || self.read_state(address)).await?;
        if state.balance0.is_zero() || state.balance1.is_zero() {
            debug!("Stable pool {} has no liquidity", address);
            return Ok(None);
        }

        Ok(Some(DiscoveredPool::Stable {
            address,
            token0: state.coin0,
            token1: state.coin1,
            balance0: state.balance0,
            balance1: state.balance1,
            amplifier: state.amplifier,
            fee: state.fee,
        }))
    }
}

#[async_trait::async_trait]
impl PoolFinder for StablePoolFinder {
    fn name(&self) -> &'static str {
        "stable"
    }

    async fn find_pools(&self, pairs: &[(Currency, Currency)]) -> SwapResult<Vec<DiscoveredPool>> {
        debug!("Searching for Stable pools across {} candidates", pairs.len());

        let lookups = pairs
            .iter()
            .map(|(a, b)| self.find_pool(a.wrapped_address(), b.wrapped_address()));

        let mut pools = Vec::new();
        for result in join_all(lookups).await {
            if let Some(pool) = result? {
                pools.push(pool);
            }
        }
        Ok(pools)
    }
}
