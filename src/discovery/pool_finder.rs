use crate::core::{Currency, SwapResult};
use alloy::primitives::{Address, B256, U256};
use futures::future::join_all;
use log::{debug, info};
use std::collections::HashSet;

/// Infinity pool key exactly as the pool manager reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPoolKey {
    pub currency0: Address,
    pub currency1: Address,
    pub hooks: Address,
    pub pool_manager: Address,
    pub fee: u32,
    pub parameters: B256,
}

/// A pool in the shape its protocol backend returned it: raw addresses, raw state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveredPool {
    V2 {
        address: Address,
        token0: Address,
        token1: Address,
        reserve0: U256,
        reserve1: U256,
    },
    V3 {
        address: Address,
        token0: Address,
        token1: Address,
        fee: u32,
        tick_spacing: i32,
        sqrt_price_x96: U256,
        tick: i32,
        liquidity: u128,
    },
    Stable {
        address: Address,
        /// Coin 0 of the swap contract
        token0: Address,
        token1: Address,
        balance0: U256,
        balance1: U256,
        amplifier: U256,
        fee: U256,
    },
    InfinityCl {
        id: B256,
        key: RawPoolKey,
        sqrt_price_x96: U256,
        tick: i32,
        liquidity: u128,
        lp_fee: u32,
        protocol_fee: u32,
    },
    InfinityBin {
        id: B256,
        key: RawPoolKey,
        active_id: u32,
        lp_fee: u32,
        protocol_fee: u32,
    },
    /// A pool a backend knows about but no adapter exists for.
    Other { kind: String, id: String },
}

impl DiscoveredPool {
    pub fn identifier(&self) -> String {
        match self {
            DiscoveredPool::V2 { address, .. }
            | DiscoveredPool::V3 { address, .. }
            | DiscoveredPool::Stable { address, .. } => address.to_string(),
            DiscoveredPool::InfinityCl { id, .. } | DiscoveredPool::InfinityBin { id, .. } => {
                id.to_string()
            }
            DiscoveredPool::Other { id, .. } => id.clone(),
        }
    }
}

/// Trait for protocol-specific discovery
#[async_trait::async_trait]
pub trait PoolFinder: Send + Sync {
    fn name(&self) -> &'static str;

    /// Pools trading any of `pairs`. Pairs with no pool are skipped, not errors.
    async fn find_pools(&self, pairs: &[(Currency, Currency)]) -> SwapResult<Vec<DiscoveredPool>>;
}

/// Runs every backend concurrently and merges their results
pub struct PoolDiscoveryService {
    finders: Vec<Box<dyn PoolFinder>>,
}

impl PoolDiscoveryService {
    pub fn new(finders: Vec<Box<dyn PoolFinder>>) -> Self {
        Self { finders }
    }

    pub fn finder_names(&self) -> Vec<&'static str> {
        self.finders.iter().map(|f| f.name()).collect()
    }

    /// Discover pools from all backends in parallel.
    ///
    /// Results keep backend order so downstream search stays deterministic; the
    /// first backend error aborts discovery.
    pub async fn discover_all(
        &self,
        pairs: &[(Currency, Currency)],
    ) -> SwapResult<Vec<DiscoveredPool>> {
        info!(
            "Discovering pools for {} candidate pairs across {} backends",
            pairs.len(),
            self.finders.len()
        );

        let futures = self.finders.iter().map(|finder| finder.find_pools(pairs));
        let results = join_all(futures).await;

        let mut seen = HashSet::new();
        let mut all_pools = Vec::new();
        for (finder, result) in self.finders.iter().zip(results) {
            let pools = result?;
            debug!("Found {} pools from {} finder", pools.len(), finder.name());
            for pool in pools {
                if seen.insert(pool.identifier()) {
                    all_pools.push(pool);
                }
            }
        }

        info!("Found {} pools in total", all_pools.len());
        Ok(all_pools)
    }
}
