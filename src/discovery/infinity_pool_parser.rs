use crate::core::{
    abi::{IBinPoolManager, ICLPoolManager},
    retry_read, Currency, RetryConfig, SwapError, SwapResult,
};
use crate::discovery::pool_finder::{DiscoveredPool, PoolFinder, RawPoolKey};
use crate::discovery::pool_registry::{PoolIdEntry, PoolIdRegistry};
use alloy::primitives::{Address, B256, U256};
use alloy::providers::DynProvider;
use futures::future::join_all;
use log::{debug, warn};
use std::str::FromStr;

struct ClState {
    key: RawPoolKey,
    sqrt_price_x96: U256,
    tick: i32,
    liquidity: u128,
    lp_fee: u32,
    protocol_fee: u32,
}

struct BinState {
    key: RawPoolKey,
    active_id: u32,
    lp_fee: u32,
    protocol_fee: u32,
}

/// Infinity CL and Bin pools listed in the pool-id registry
pub struct InfinityPoolFinder {
    provider: DynProvider,
    cl_pool_manager: Address,
    bin_pool_manager: Address,
    registry: PoolIdRegistry,
    retry: RetryConfig,
}

impl InfinityPoolFinder {
    pub fn new(
        provider: DynProvider,
        cl_pool_manager: Address,
        bin_pool_manager: Address,
        registry: PoolIdRegistry,
        retry: RetryConfig,
    ) -> Self {
        Self {
            provider,
            cl_pool_manager,
            bin_pool_manager,
            registry,
            retry,
        }
    }

    async fn read_cl(&self, id: B256) -> SwapResult<ClState> {
        let manager = ICLPoolManager::new(self.cl_pool_manager, self.provider.clone());
        let key = manager.poolIdToPoolKey(id).call().await?;
        let slot0 = manager.getSlot0(id).call().await?;
        let liquidity = manager.getLiquidity(id).call().await?;

        Ok(ClState {
            key: RawPoolKey {
                currency0: key.currency0,
                currency1: key.currency1,
                hooks: key.hooks,
                pool_manager: key.poolManager,
                fee: key.fee.to::<u32>(),
                parameters: key.parameters,
            },
            sqrt_price_x96: U256::from(slot0.sqrtPriceX96),
            tick: slot0.tick.as_i32(),
            liquidity,
            lp_fee: slot0.lpFee.to::<u32>(),
            protocol_fee: slot0.protocolFee.to::<u32>(),
        })
    }

    async fn read_bin(&self, id: B256) -> SwapResult<BinState> {
        let manager = IBinPoolManager::new(self.bin_pool_manager, self.provider.clone());
        let key = manager.poolIdToPoolKey(id).call().await?;
        let slot0 = manager.getSlot0(id).call().await?;

        Ok(BinState {
            key: RawPoolKey {
                currency0: key.currency0,
                currency1: key.currency1,
                hooks: key.hooks,
                pool_manager: key.poolManager,
                fee: key.fee.to::<u32>(),
                parameters: key.parameters,
            },
            active_id: slot0.activeId.to::<u32>(),
            lp_fee: slot0.lpFee.to::<u32>(),
            protocol_fee: slot0.protocolFee.to::<u32>(),
        })
    }

    async fn resolve_entry(&self, entry: PoolIdEntry) -> SwapResult<Option<DiscoveredPool>> {
        match entry.kind.to_uppercase().as_str() {
            "CL" => {
                let id = parse_pool_id(&entry.id)?;
                let state = retry_read(&self.retry, "infinity cl getSlot0", move || self.read_cl(id)).await?;
                if is_unregistered(&state.key) || state.liquidity == 0 {
                    debug!("Infinity CL pool {} is empty or unknown to the manager", id);
                    return Ok(None);
                }
                Ok(Some(DiscoveredPool::InfinityCl {
                    id,
                    key: state.key,
                    sqrt_price_x96: state.sqrt_price_x96,
                    tick: state.tick,
                    liquidity: state.liquidity,
                    lp_fee: state.lp_fee,
                    protocol_fee: state.protocol_fee,
                }))
            }
            "BIN" => {
                let id = parse_pool_id(&entry.id)?;
                let state = retry_read(&self.retry, "infinity bin getSlot0", move || self.read_bin(id)).await?;
                if is_unregistered(&state.key) {
                    debug!("Infinity Bin pool {} is unknown to the manager", id);
                    return Ok(None);
                }
                Ok(Some(DiscoveredPool::InfinityBin {
                    id,
                    key: state.key,
                    active_id: state.active_id,
                    lp_fee: state.lp_fee,
                    protocol_fee: state.protocol_fee,
                }))
            }
            _ => {
                warn!("Pool {} has unrecognised type '{}'", entry.id, entry.kind);
                Ok(Some(DiscoveredPool::Other {
                    kind: entry.kind,
                    id: entry.id,
                }))
            }
        }
    }
}

fn parse_pool_id(id: &str) -> SwapResult<B256> {
    B256::from_str(id).map_err(|e| SwapError::ConfigError(format!("Bad pool id {}: {}", id, e)))
}

fn is_unregistered(key: &RawPoolKey) -> bool {
    key.pool_manager == Address::ZERO
}

#[async_trait::async_trait]
impl PoolFinder for InfinityPoolFinder {
    fn name(&self) -> &'static str {
        "infinity"
    }

    async fn find_pools(&self, pairs: &[(Currency, Currency)]) -> SwapResult<Vec<DiscoveredPool>> {
        let mut entries: Vec<PoolIdEntry> = Vec::new();
        for (a, b) in pairs {
            for entry in self.registry.lookup_currencies(a, b) {
                if !entries.contains(&entry) {
                    entries.push(entry);
                }
            }
        }
        debug!("Reading {} registered Infinity pools", entries.len());

        let reads = entries.into_iter().map(|entry| self.resolve_entry(entry));

        let mut pools = Vec::new();
        for result in join_all(reads).await {
            if let Some(pool) = result? {
                pools.push(pool);
            }
        }
        Ok(pools)
    }
}
