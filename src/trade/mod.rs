use crate::core::{Currency, CurrencyAmount, Percent, Pool, PoolKind, SwapError, SwapResult, TradeType};
use crate::selection::BestTrade;
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which encoding path a route needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteType {
    InfinityCl,
    InfinityBin,
    Mixed,
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteType::InfinityCl => write!(f, "InfinityCL"),
            RouteType::InfinityBin => write!(f, "InfinityBIN"),
            RouteType::Mixed => write!(f, "MIXED"),
        }
    }
}

/// Classify one route by the conjunction of its own pools' kinds.
pub fn classify_route(pools: &[Pool]) -> RouteType {
    if pools.is_empty() {
        return RouteType::Mixed;
    }
    if pools.iter().all(|p| p.kind() == PoolKind::InfinityCl) {
        RouteType::InfinityCl
    } else if pools.iter().all(|p| p.kind() == PoolKind::InfinityBin) {
        RouteType::InfinityBin
    } else {
        RouteType::Mixed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub route_type: RouteType,
    pub pools: Vec<Pool>,
    /// `pools.len() + 1` currencies from input to output
    pub path: Vec<Currency>,
    pub percent: u32,
    pub input_amount: CurrencyAmount,
    pub output_amount: CurrencyAmount,
}

impl Route {
    pub fn new(
        pools: Vec<Pool>,
        path: Vec<Currency>,
        percent: u32,
        input_amount: CurrencyAmount,
        output_amount: CurrencyAmount,
    ) -> SwapResult<Self> {
        let route = Self {
            route_type: classify_route(&pools),
            pools,
            path,
            percent,
            input_amount,
            output_amount,
        };
        route.validate()?;
        Ok(route)
    }

    pub fn input_currency(&self) -> &Currency {
        &self.input_amount.currency
    }

    pub fn output_currency(&self) -> &Currency {
        &self.output_amount.currency
    }

    /// Check the path is contiguous and the tag agrees with the pools.
    pub fn validate(&self) -> SwapResult<()> {
        if self.pools.is_empty() {
            return Err(SwapError::InvalidRoute("route has no pools".to_string()));
        }
        if self.path.len() != self.pools.len() + 1 {
            return Err(SwapError::InvalidRoute(format!(
                "{} pools but {} path currencies",
                self.pools.len(),
                self.path.len()
            )));
        }
        for (i, pool) in self.pools.iter().enumerate() {
            let (from, to) = (&self.path[i], &self.path[i + 1]);
            if !pool.involves(from) || !pool.involves(to) || from.same_wrapped(to) {
                return Err(SwapError::InvalidRoute(format!(
                    "hop {} ({}) does not link {} to {}",
                    i, pool, from, to
                )));
            }
        }
        let expected = classify_route(&self.pools);
        if expected != self.route_type {
            return Err(SwapError::InvalidRoute(format!(
                "route tagged {} but its pools classify as {}",
                self.route_type, expected
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbols: Vec<&str> = self.path.iter().map(|c| c.symbol()).collect();
        write!(f, "[{}] {}% {}", self.route_type, self.percent, symbols.join(" -> "))
    }
}

/// A best-trade result annotated for encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    pub trade_type: TradeType,
    pub routes: Vec<Route>,
    pub input_amount: CurrencyAmount,
    pub output_amount: CurrencyAmount,
    pub gas_estimate: u64,
    pub gas_cost_in_quote: U256,
}

impl Trade {
    pub fn input_currency(&self) -> &Currency {
        &self.input_amount.currency
    }

    pub fn output_currency(&self) -> &Currency {
        &self.output_amount.currency
    }

    pub fn is_native_input(&self) -> bool {
        self.input_currency().is_native()
    }

    /// Aggregate output guaranteed under `slippage`.
    pub fn minimum_amount_out(&self, slippage: &Percent) -> U256 {
        slippage.minimum_amount_out(self.output_amount.raw)
    }

    pub fn hops(&self) -> usize {
        self.routes.iter().map(|r| r.pools.len()).sum()
    }
}

/// Turn a raw search result into a [`Trade`], classifying each route on its own pools.
pub fn build_trade(best: BestTrade) -> SwapResult<Trade> {
    if best.routes.is_empty() {
        return Err(SwapError::InvalidRoute("trade has no routes".to_string()));
    }

    let input_currency = best.input.currency.clone();
    let output_currency = best.output.currency.clone();

    let mut allocated = U256::ZERO;
    let mut routes = Vec::with_capacity(best.routes.len());
    for split in best.routes {
        allocated = allocated
            .checked_add(split.input_amount)
            .ok_or(SwapError::MathOverflow)?;
        routes.push(Route::new(
            split.pools,
            split.path,
            split.percent,
            CurrencyAmount::from_raw(input_currency.clone(), split.input_amount),
            CurrencyAmount::from_raw(output_currency.clone(), split.output_amount),
        )?);
    }

    if allocated != best.input.raw {
        return Err(SwapError::InvalidRoute(format!(
            "route inputs sum to {} but the trade specifies {}",
            allocated, best.input.raw
        )));
    }

    Ok(Trade {
        trade_type: best.trade_type,
        routes,
        input_amount: best.input,
        output_amount: best.output,
        gas_estimate: best.gas_units,
        gas_cost_in_quote: best.gas_cost_in_quote,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        InfinityBinPool, InfinityClPool, InfinityPoolKey, TokenRegistry, V2Pool, V3Pool,
        INFINITY_BIN_POOL_MANAGER_ADDRESS, INFINITY_CL_POOL_MANAGER_ADDRESS,
    };
    use crate::selection::RouteSplit;
    use alloy::primitives::{Address, B256};

    fn currency(symbol: &str) -> Currency {
        TokenRegistry::bsc().resolve(symbol).unwrap()
    }

    fn key(byte: u8, a: &str, b: &str, manager: Address) -> InfinityPoolKey {
        InfinityPoolKey {
            id: B256::repeat_byte(byte),
            currency0: currency(a),
            currency1: currency(b),
            hooks: Address::ZERO,
            pool_manager: manager,
            fee: 500,
            parameters: B256::ZERO,
        }
    }

    fn cl(byte: u8, a: &str, b: &str) -> Pool {
        Pool::InfinityCl(InfinityClPool {
            key: key(byte, a, b, INFINITY_CL_POOL_MANAGER_ADDRESS),
            tick_spacing: 10,
            sqrt_price_x96: U256::from(1) << 96,
            tick: 0,
            liquidity: 1,
            lp_fee: 500,
            protocol_fee: 0,
        })
    }

    fn bin(byte: u8, a: &str, b: &str) -> Pool {
        Pool::InfinityBin(InfinityBinPool {
            key: key(byte, a, b, INFINITY_BIN_POOL_MANAGER_ADDRESS),
            bin_step: 10,
            active_id: 8_388_608,
            lp_fee: 500,
            protocol_fee: 0,
        })
    }

    fn v2(byte: u8, a: &str, b: &str) -> Pool {
        Pool::V2(V2Pool {
            address: Address::repeat_byte(byte),
            currency0: currency(a),
            currency1: currency(b),
            reserve0: U256::from(1),
            reserve1: U256::from(1),
            fee_bps: 25,
        })
    }

    fn v3(byte: u8, a: &str, b: &str) -> Pool {
        Pool::V3(V3Pool {
            address: Address::repeat_byte(byte),
            currency0: currency(a),
            currency1: currency(b),
            fee: 500,
            tick_spacing: 10,
            sqrt_price_x96: U256::from(1) << 96,
            tick: 0,
            liquidity: 1,
        })
    }

    fn split(pools: Vec<Pool>, path: &[&str], percent: u32, amount_in: u64) -> RouteSplit {
        RouteSplit {
            pools,
            path: path.iter().map(|s| currency(s)).collect(),
            percent,
            input_amount: U256::from(amount_in),
            output_amount: U256::from(amount_in),
            gas_units: 0,
        }
    }

    fn best(routes: Vec<RouteSplit>, total: u64) -> BestTrade {
        BestTrade {
            trade_type: TradeType::ExactInput,
            input: CurrencyAmount::from_raw(currency("BNB"), U256::from(total)),
            output: CurrencyAmount::from_raw(currency("KGEN"), U256::from(total)),
            routes,
            gas_units: 0,
            gas_cost_in_quote: U256::ZERO,
        }
    }

    #[test]
    fn test_classification_is_conjunctive() {
        assert_eq!(classify_route(&[cl(1, "BNB", "KGEN")]), RouteType::InfinityCl);
        assert_eq!(
            classify_route(&[cl(1, "BNB", "USDT"), cl(2, "USDT", "KGEN")]),
            RouteType::InfinityCl
        );
        assert_eq!(classify_route(&[bin(1, "BNB", "KGEN")]), RouteType::InfinityBin);
        assert_eq!(
            classify_route(&[cl(1, "BNB", "USDT"), bin(2, "USDT", "KGEN")]),
            RouteType::Mixed
        );
        assert_eq!(
            classify_route(&[cl(1, "BNB", "USDT"), v3(2, "USDT", "KGEN")]),
            RouteType::Mixed
        );
        // a lone non-Infinity pool is never tagged Infinity
        assert_eq!(classify_route(&[v2(1, "WBNB", "KGEN")]), RouteType::Mixed);
        assert_eq!(classify_route(&[v3(1, "WBNB", "KGEN")]), RouteType::Mixed);
    }

    #[test]
    fn test_each_route_classified_independently() {
        let trade = build_trade(best(
            vec![
                split(vec![cl(1, "BNB", "KGEN")], &["BNB", "KGEN"], 50, 50),
                split(
                    vec![v2(2, "WBNB", "USDT"), v3(3, "USDT", "KGEN")],
                    &["BNB", "USDT", "KGEN"],
                    50,
                    50,
                ),
            ],
            100,
        ))
        .unwrap();

        assert_eq!(trade.routes[0].route_type, RouteType::InfinityCl);
        assert_eq!(trade.routes[1].route_type, RouteType::Mixed);
        assert!(trade.is_native_input());
        assert_eq!(trade.hops(), 3);
    }

    #[test]
    fn test_split_amounts_must_sum_to_total() {
        let result = build_trade(best(
            vec![split(vec![cl(1, "BNB", "KGEN")], &["BNB", "KGEN"], 100, 99)],
            100,
        ));
        assert!(matches!(result, Err(SwapError::InvalidRoute(_))));
    }

    #[test]
    fn test_mislabelled_route_rejected() {
        let mut route = Route::new(
            vec![v2(1, "WBNB", "KGEN")],
            vec![currency("WBNB"), currency("KGEN")],
            100,
            CurrencyAmount::from_raw(currency("WBNB"), U256::from(1)),
            CurrencyAmount::from_raw(currency("KGEN"), U256::from(1)),
        )
        .unwrap();
        route.route_type = RouteType::InfinityCl;
        assert!(matches!(route.validate(), Err(SwapError::InvalidRoute(_))));
    }

    #[test]
    fn test_broken_path_rejected() {
        let result = Route::new(
            vec![v2(1, "WBNB", "USDT")],
            vec![currency("WBNB"), currency("KGEN")],
            100,
            CurrencyAmount::from_raw(currency("WBNB"), U256::from(1)),
            CurrencyAmount::from_raw(currency("KGEN"), U256::from(1)),
        );
        assert!(matches!(result, Err(SwapError::InvalidRoute(_))));
    }
}
