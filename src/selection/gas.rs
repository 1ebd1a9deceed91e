use crate::core::{Currency, Pool, SwapResult, ROUTE_BASE_GAS};
use crate::quotes::PoolQuoter;
use crate::selection::graph::PoolPath;
use alloy::primitives::U256;
use log::debug;

/// Current gas price in wei, read on demand.
#[async_trait::async_trait]
pub trait GasPriceOracle: Send + Sync {
    async fn gas_price(&self) -> SwapResult<u128>;
}

/// Gas units for executing `path`: a fixed route overhead plus a per-hop cost by pool kind.
pub fn route_gas_units(pools: &[Pool], path: &PoolPath) -> u64 {
    path.pools
        .iter()
        .map(|&index| pools[index].kind().hop_gas())
        .fold(ROUTE_BASE_GAS, |total, hop| total.saturating_add(hop))
}

/// Prices gas units in the quote currency for one search.
#[derive(Debug, Clone)]
pub struct GasModel {
    gas_price_wei: U256,
    /// Quote-currency output for one whole native unit (1e18 wei)
    native_price: U256,
}

impl GasModel {
    const NATIVE_UNIT: u64 = 1_000_000_000_000_000_000;

    pub fn new(gas_price_wei: u128, native_price: U256) -> Self {
        Self {
            gas_price_wei: U256::from(gas_price_wei),
            native_price,
        }
    }

    /// Build the model by quoting one native unit through the best direct
    /// wrapped-native/quote pool. Quote currencies without such a pool price gas at zero.
    pub async fn price(
        gas_price_wei: u128,
        quote_currency: &Currency,
        pools: &[Pool],
        quoter: &dyn PoolQuoter,
    ) -> SwapResult<Self> {
        let native = Currency::native(quote_currency.chain_id());
        let one = U256::from(Self::NATIVE_UNIT);

        if quote_currency.same_wrapped(&native) {
            return Ok(Self::new(gas_price_wei, one));
        }

        let mut best: Option<U256> = None;
        for pool in pools {
            if !(pool.involves(&native) && pool.involves(quote_currency)) {
                continue;
            }
            let currency_in = pool.matching(&native).cloned().unwrap_or_else(|| native.clone());
            if let Some(out) = quoter.quote_exact_input(pool, &currency_in, one).await? {
                if best.map_or(true, |current| out > current) {
                    best = Some(out);
                }
            }
        }

        match best {
            Some(price) => {
                debug!("1 native = {} {} (raw) for gas pricing", price, quote_currency);
                Ok(Self::new(gas_price_wei, price))
            }
            None => {
                debug!("No native/{} pool, gas is not priced", quote_currency);
                Ok(Self::new(gas_price_wei, U256::ZERO))
            }
        }
    }

    pub fn cost_wei(&self, units: u64) -> U256 {
        self.gas_price_wei.saturating_mul(U256::from(units))
    }

    /// Cost of `units` gas in raw quote-currency units.
    pub fn cost_in_quote(&self, units: u64) -> U256 {
        self.cost_wei(units).saturating_mul(self.native_price) / U256::from(Self::NATIVE_UNIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_in_quote() {
        // 1 gwei, 1 native = 600 quote units (scaled 1e18)
        let model = GasModel::new(1_000_000_000, U256::from(600u64) * U256::from(GasModel::NATIVE_UNIT));
        assert_eq!(model.cost_wei(100_000), U256::from(100_000_000_000_000u64));
        assert_eq!(
            model.cost_in_quote(100_000),
            U256::from(60_000_000_000_000_000u64)
        );

        let free = GasModel::new(1_000_000_000, U256::ZERO);
        assert!(free.cost_in_quote(1_000_000).is_zero());
    }
}
