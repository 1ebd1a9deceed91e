pub mod gas;
pub mod graph;

use crate::core::{
    Config, Currency, CurrencyAmount, Pool, SwapError, SwapResult, TradeType, QUOTE_CONCURRENCY,
};
use crate::quotes::PoolQuoter;
use alloy::primitives::U256;
use futures::future::join_all;
use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub use gas::{route_gas_units, GasModel, GasPriceOracle};
pub use graph::{distributions, enumerate_paths, PoolPath};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub max_hops: usize,
    pub max_splits: usize,
    /// Best single paths kept as split candidates
    pub max_paths: usize,
    /// Split granularity in percent; must divide 100
    pub distribution_percent: u32,
}

impl SearchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_hops: config.max_hops,
            max_splits: config.max_splits,
            max_paths: config.max_paths,
            distribution_percent: config.distribution_percent,
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// One leg of the selected trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSplit {
    pub pools: Vec<Pool>,
    /// Currencies along the route; ends are the trade's own currencies and
    /// intermediates are in the form the preceding pool pays out.
    pub path: Vec<Currency>,
    pub percent: u32,
    pub input_amount: U256,
    pub output_amount: U256,
    pub gas_units: u64,
}

/// Raw search result before route classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestTrade {
    pub trade_type: TradeType,
    pub input: CurrencyAmount,
    pub output: CurrencyAmount,
    pub routes: Vec<RouteSplit>,
    pub gas_units: u64,
    pub gas_cost_in_quote: U256,
}

/// Combinations whose quotes are fetched together.
const COMBINATION_BATCH: usize = 64;

/// Per-search state shared by every candidate evaluation.
struct SearchContext<'a> {
    pools: &'a [Pool],
    /// Surviving paths, best single-path quote first
    paths: Vec<PoolPath>,
    path_gas: Vec<u64>,
    gas_model: GasModel,
    currency_in: &'a Currency,
    quote_currency: &'a Currency,
}

/// Quotes by (kept path index, input amount); `None` when the path cannot fill.
type QuoteCache = HashMap<(usize, U256), Option<U256>>;

impl SearchContext<'_> {
    /// Score one split of `total` over `combination` from cached quotes.
    fn evaluate(
        &self,
        cache: &QuoteCache,
        combination: &[usize],
        split: &[u32],
        total: U256,
    ) -> SwapResult<Option<Candidate>> {
        let amounts = leg_amounts(total, split)?;
        let mut legs = Vec::with_capacity(combination.len());
        let mut output = U256::ZERO;
        let mut gas_units = 0u64;
        let mut hops = 0;

        for ((&path_index, &percent), amount_in) in combination.iter().zip(split).zip(amounts) {
            if amount_in.is_zero() {
                return Ok(None);
            }
            let quoted = cache.get(&(path_index, amount_in)).copied().flatten();
            let Some(amount_out) = quoted.filter(|out| !out.is_zero()) else {
                return Ok(None);
            };

            output = output.checked_add(amount_out).ok_or(SwapError::MathOverflow)?;
            gas_units = gas_units.saturating_add(self.path_gas[path_index]);
            hops += self.paths[path_index].hops();
            legs.push((path_index, percent, amount_in, amount_out));
        }

        Ok(Some(Candidate {
            legs,
            output,
            gas_cost: self.gas_model.cost_in_quote(gas_units),
            hops,
        }))
    }
}

/// Input per leg: `total * percent / 100`, the last leg taking the remainder.
fn leg_amounts(total: U256, split: &[u32]) -> SwapResult<Vec<U256>> {
    let mut amounts = Vec::with_capacity(split.len());
    let mut allocated = U256::ZERO;
    for (position, &percent) in split.iter().enumerate() {
        let amount = if position + 1 == split.len() {
            total.checked_sub(allocated).ok_or(SwapError::MathOverflow)?
        } else {
            total
                .checked_mul(U256::from(percent))
                .ok_or(SwapError::MathOverflow)?
                / U256::from(100u32)
        };
        allocated += amount;
        amounts.push(amount);
    }
    Ok(amounts)
}

#[derive(Debug, Clone)]
struct Candidate {
    legs: Vec<(usize, u32, U256, U256)>, // (path index, percent, in, out)
    output: U256,
    gas_cost: U256,
    hops: usize,
}

impl Candidate {
    /// Strictly better by net output, then fewer hops.
    fn beats(&self, other: &Candidate) -> bool {
        let ours = self.output.saturating_add(other.gas_cost);
        let theirs = other.output.saturating_add(self.gas_cost);
        if ours != theirs {
            return ours > theirs;
        }
        self.hops < other.hops
    }
}

/// Best-trade search over a normalized pool snapshot.
pub struct TradeSearch {
    quoter: Arc<dyn PoolQuoter>,
    options: SearchOptions,
}

impl TradeSearch {
    pub fn new(quoter: Arc<dyn PoolQuoter>, options: SearchOptions) -> Self {
        Self { quoter, options }
    }

    /// Find the trade with the highest output net of gas.
    ///
    /// Identical pools, quotes and gas price always select the same trade.
    pub async fn find_best_trade(
        &self,
        amount: &CurrencyAmount,
        quote_currency: &Currency,
        trade_type: TradeType,
        pools: &[Pool],
        gas_oracle: &dyn GasPriceOracle,
    ) -> SwapResult<BestTrade> {
        if trade_type != TradeType::ExactInput {
            return Err(SwapError::UnsupportedTradeType(trade_type.to_string()));
        }
        if amount.is_zero() {
            return Err(SwapError::InvalidAmount("amount must be greater than zero".to_string()));
        }

        let currency_in = &amount.currency;
        let no_route = || SwapError::NoRouteFound(currency_in.to_string(), quote_currency.to_string());

        let paths = enumerate_paths(pools, currency_in, quote_currency, self.options.max_hops);
        if paths.is_empty() {
            return Err(no_route());
        }
        info!(
            "Found {} paths from {} to {} over {} pools",
            paths.len(),
            currency_in,
            quote_currency,
            pools.len()
        );

        let gas_price = gas_oracle.gas_price().await?;
        let gas_model = GasModel::price(gas_price, quote_currency, pools, self.quoter.as_ref()).await?;
        let path_gas: Vec<u64> = paths.iter().map(|p| route_gas_units(pools, p)).collect();

        // every path at the full amount, then only the best few go on to splits
        let requests: Vec<(usize, U256)> = (0..paths.len()).map(|i| (i, amount.raw)).collect();
        let full = self.quote_all(pools, &paths, currency_in, &requests).await?;
        let mut ranked: Vec<(usize, U256)> = full
            .into_iter()
            .enumerate()
            .filter_map(|(index, out)| out.filter(|o| !o.is_zero()).map(|o| (index, o)))
            .collect();
        let net = |&(index, out): &(usize, U256)| out.saturating_sub(gas_model.cost_in_quote(path_gas[index]));
        ranked.sort_by(|a, b| {
            net(b)
                .cmp(&net(a))
                .then(b.1.cmp(&a.1))
                .then(paths[a.0].hops().cmp(&paths[b.0].hops()))
                .then(a.0.cmp(&b.0))
        });
        ranked.truncate(self.options.max_paths.max(1));
        if ranked.is_empty() {
            return Err(no_route());
        }
        debug!(
            "Keeping {} of {} paths for split search",
            ranked.len(),
            paths.len()
        );

        let ctx = SearchContext {
            pools,
            paths: ranked.iter().map(|&(index, _)| paths[index].clone()).collect(),
            path_gas: ranked.iter().map(|&(index, _)| path_gas[index]).collect(),
            gas_model,
            currency_in,
            quote_currency,
        };
        let mut cache: QuoteCache = ranked
            .iter()
            .enumerate()
            .map(|(kept, &(_, out))| ((kept, amount.raw), Some(out)))
            .collect();

        let step = self.options.distribution_percent.max(1);
        let max_parts = self
            .options
            .max_splits
            .max(1)
            .min(ctx.paths.len())
            .min((100 / step) as usize);

        let mut best: Option<Candidate> = None;
        for parts in 1..=max_parts {
            let splits = distributions(parts, if parts == 1 { 100 } else { step });
            let mut combinations = graph::disjoint_combinations(&ctx.paths, parts);
            loop {
                let batch: Vec<Vec<usize>> = combinations.by_ref().take(COMBINATION_BATCH).collect();
                if batch.is_empty() {
                    break;
                }
                self.prefetch(&ctx, &mut cache, &batch, &splits, amount.raw).await?;

                for combination in &batch {
                    for split in &splits {
                        let Some(candidate) = ctx.evaluate(&cache, combination, split, amount.raw)? else {
                            continue;
                        };
                        if best.as_ref().map_or(true, |current| candidate.beats(current)) {
                            best = Some(candidate);
                        }
                    }
                }
            }
        }

        let best = best.ok_or_else(no_route)?;
        self.materialize(&ctx, amount, trade_type, best)
    }

    /// Quote every (path, amount) leg of `batch` not yet in the cache.
    async fn prefetch(
        &self,
        ctx: &SearchContext<'_>,
        cache: &mut QuoteCache,
        batch: &[Vec<usize>],
        splits: &[Vec<u32>],
        total: U256,
    ) -> SwapResult<()> {
        let mut seen = HashSet::new();
        let mut missing = Vec::new();
        for combination in batch {
            for split in splits {
                for (&path_index, amount_in) in combination.iter().zip(leg_amounts(total, split)?) {
                    let key = (path_index, amount_in);
                    if !amount_in.is_zero() && !cache.contains_key(&key) && seen.insert(key) {
                        missing.push(key);
                    }
                }
            }
        }
        if missing.is_empty() {
            return Ok(());
        }

        let quotes = self.quote_all(ctx.pools, &ctx.paths, ctx.currency_in, &missing).await?;
        cache.extend(missing.into_iter().zip(quotes));
        Ok(())
    }

    /// Quote each request, `QUOTE_CONCURRENCY` at a time; results keep request order.
    async fn quote_all(
        &self,
        pools: &[Pool],
        paths: &[PoolPath],
        start: &Currency,
        requests: &[(usize, U256)],
    ) -> SwapResult<Vec<Option<U256>>> {
        let mut quotes = Vec::with_capacity(requests.len());
        for chunk in requests.chunks(QUOTE_CONCURRENCY) {
            let futures = chunk
                .iter()
                .map(|&(index, amount_in)| self.quote_path(pools, &paths[index], amount_in, start));
            for result in join_all(futures).await {
                quotes.push(result?);
            }
        }
        Ok(quotes)
    }

    /// Chain quotes hop by hop; `None` as soon as a pool cannot fill.
    async fn quote_path(
        &self,
        pools: &[Pool],
        path: &PoolPath,
        amount_in: U256,
        start: &Currency,
    ) -> SwapResult<Option<U256>> {
        let mut currency = start.clone();
        let mut amount = amount_in;
        for &index in &path.pools {
            let pool = &pools[index];
            let Some(out) = self.quoter.quote_exact_input(pool, &currency, amount).await? else {
                debug!("{} cannot fill {} {}", pool, amount, currency);
                return Ok(None);
            };
            let Some(next) = pool.other(&currency) else {
                return Ok(None);
            };
            currency = next.clone();
            amount = out;
        }
        Ok(Some(amount))
    }

    fn materialize(
        &self,
        ctx: &SearchContext<'_>,
        amount: &CurrencyAmount,
        trade_type: TradeType,
        best: Candidate,
    ) -> SwapResult<BestTrade> {
        let mut routes = Vec::with_capacity(best.legs.len());
        let mut gas_units = 0u64;

        for (path_index, percent, input_amount, output_amount) in best.legs {
            let path = &ctx.paths[path_index];
            let route_pools: Vec<Pool> = path.pools.iter().map(|&i| ctx.pools[i].clone()).collect();

            let mut currencies = vec![amount.currency.clone()];
            let mut current = amount.currency.clone();
            for pool in &route_pools {
                let next = pool.other(&current).cloned().ok_or_else(|| {
                    SwapError::InvalidRoute(format!("{} does not continue from {}", pool, current))
                })?;
                currencies.push(next.clone());
                current = next;
            }
            // the route ends in the currency the caller asked for
            if let Some(last) = currencies.last_mut() {
                *last = ctx.quote_currency.clone();
            }

            gas_units = gas_units.saturating_add(ctx.path_gas[path_index]);
            routes.push(RouteSplit {
                pools: route_pools,
                path: currencies,
                percent,
                input_amount,
                output_amount,
                gas_units: ctx.path_gas[path_index],
            });
        }

        info!(
            "Best trade: {} route(s), output {} (raw), gas {} units",
            routes.len(),
            best.output,
            gas_units
        );

        Ok(BestTrade {
            trade_type,
            input: amount.clone(),
            output: CurrencyAmount::from_raw(ctx.quote_currency.clone(), best.output),
            routes,
            gas_units,
            gas_cost_in_quote: ctx.gas_model.cost_in_quote(gas_units),
        })
    }
}
