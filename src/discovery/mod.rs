pub mod infinity_pool_parser;
pub mod normalizer;
pub mod pool_finder;
pub mod pool_registry;
pub mod stable_pool_parser;
pub mod v2_pool_parser;
pub mod v3_pool_parser;

use crate::core::{Config, Currency, RetryConfig, SwapError, SwapResult, TokenRegistry};
use alloy::providers::DynProvider;
use log::info;

pub use infinity_pool_parser::InfinityPoolFinder;
pub use normalizer::PoolNormalizer;
pub use pool_finder::{DiscoveredPool, PoolDiscoveryService, PoolFinder, RawPoolKey};
pub use pool_registry::{PoolIdEntry, PoolIdRegistry};
pub use stable_pool_parser::StablePoolFinder;
pub use v2_pool_parser::V2PoolFinder;
pub use v3_pool_parser::V3PoolFinder;

/// Main interface for pool discovery
pub struct PoolDiscovery {
    service: PoolDiscoveryService,
    bases: Vec<Currency>,
}

impl PoolDiscovery {
    pub fn new(finders: Vec<Box<dyn PoolFinder>>, bases: Vec<Currency>) -> Self {
        Self {
            service: PoolDiscoveryService::new(finders),
            bases,
        }
    }

    /// Every on-chain backend against one provider.
    pub fn on_chain(
        provider: DynProvider,
        config: &Config,
        tokens: &TokenRegistry,
        registry: PoolIdRegistry,
    ) -> Self {
        let retry = RetryConfig::from_config(config);
        let contracts = &config.contracts;

        let finders: Vec<Box<dyn PoolFinder>> = vec![
            Box::new(V2PoolFinder::new(
                provider.clone(),
                contracts.v2_factory,
                retry.clone(),
            )),
            Box::new(V3PoolFinder::new(
                provider.clone(),
                contracts.v3_factory,
                retry.clone(),
            )),
            Box::new(StablePoolFinder::new(
                provider.clone(),
                contracts.stable_factory,
                retry.clone(),
            )),
            Box::new(InfinityPoolFinder::new(
                provider,
                contracts.infinity_cl_pool_manager,
                contracts.infinity_bin_pool_manager,
                registry,
                retry,
            )),
        ];

        Self::new(finders, tokens.routing_bases())
    }

    /// Unordered pairs among `{from, to}` and the routing bases.
    ///
    /// Currencies sharing a wrapped form collapse to the first occurrence, so a
    /// pair never links a currency with its own wrapped token.
    pub fn candidate_pairs(&self, from: &Currency, to: &Currency) -> Vec<(Currency, Currency)> {
        let mut nodes: Vec<Currency> = Vec::new();
        for currency in [from, to].into_iter().chain(self.bases.iter()) {
            if !nodes.iter().any(|known| known.same_wrapped(currency)) {
                nodes.push(currency.clone());
            }
        }

        let mut pairs = Vec::new();
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                pairs.push((nodes[i].clone(), nodes[j].clone()));
            }
        }
        pairs
    }

    /// Discover all pools that could sit on a route between `from` and `to`.
    ///
    /// Fails with `PoolNotFound` when no backend knows a single pool for any
    /// candidate pair.
    pub async fn discover(&self, from: &Currency, to: &Currency) -> SwapResult<Vec<DiscoveredPool>> {
        let pairs = self.candidate_pairs(from, to);
        info!(
            "Discovering pools for {}/{} via {:?}",
            from,
            to,
            self.service.finder_names()
        );
        let pools = self.service.discover_all(&pairs).await?;
        if pools.is_empty() {
            return Err(SwapError::PoolNotFound(format!("no pool for pair {}/{}", from, to)));
        }
        Ok(pools)
    }
}
