//! Universal Router `execute` call construction.
//!
//! Everything here is pure: the same trade and options always give the same
//! bytes, and nothing touches the network.

use crate::authorization::SignedPermit;
use crate::core::abi::{IUniversalRouter, InfinityExactInputParams, PathKey};
use crate::core::{
    Clock, Currency, Percent, Pool, PoolKind, SwapError, SwapResult, TradeType, ADDRESS_THIS,
    CONTRACT_BALANCE, MSG_SENDER, OPEN_DELTA,
};
use crate::trade::{Route, Trade};
use crate::transaction::planner::{encode_v3_path, ActionsPlanner, InfinityAction, RoutePlanner};
use alloy::primitives::aliases::U24;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use log::debug;

/// Portion of the output paid to a third party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeOptions {
    pub fee: Percent,
    pub recipient: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOptions {
    pub slippage_tolerance: Percent,
    /// Unix seconds
    pub deadline: u64,
    pub input_token_permit: Option<SignedPermit>,
    pub fee: Option<FeeOptions>,
}

/// Options for one swap: `base` slippage widened by any fee, deadline `deadline_secs` from now.
pub fn swap_options(
    base_slippage: Percent,
    deadline_secs: u64,
    clock: &dyn Clock,
    fee: Option<FeeOptions>,
    permit: Option<SignedPermit>,
) -> SwapOptions {
    let slippage_tolerance = match &fee {
        Some(fee) => base_slippage.add(&fee.fee),
        None => base_slippage,
    };
    SwapOptions {
        slippage_tolerance,
        deadline: clock.now_millis() / 1000 + deadline_secs,
        input_token_permit: permit,
        fee,
    }
}

/// Final transaction shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParameters {
    pub to: Address,
    pub calldata: Bytes,
    pub value: U256,
}

/// Consecutive pools of one kind that a single router command can swap through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Section {
    kind: PoolKind,
    /// pools[start..end], path[start..=end]
    start: usize,
    end: usize,
}

pub struct SwapRouter {
    router: Address,
}

impl SwapRouter {
    pub fn new(router: Address) -> Self {
        Self { router }
    }

    pub fn swap_call_parameters(&self, trade: &Trade, options: &SwapOptions) -> SwapResult<MethodParameters> {
        if trade.trade_type != TradeType::ExactInput {
            return Err(SwapError::UnsupportedTradeType(trade.trade_type.to_string()));
        }
        if trade.routes.is_empty() {
            return Err(SwapError::InvalidRoute("trade has no routes".to_string()));
        }
        let input = trade.input_currency();
        let output = trade.output_currency();
        if input.same_wrapped(output) {
            return Err(SwapError::InvalidArgument(format!(
                "{} and {} are the same asset",
                input, output
            )));
        }

        let mut ends = Vec::with_capacity(trade.routes.len());
        for route in &trade.routes {
            route.validate()?;
            if route.path.first() != Some(input) || !route.output_currency().same_wrapped(output) {
                return Err(SwapError::InvalidRoute(format!(
                    "route {} does not connect {} to {}",
                    route, input, output
                )));
            }
            ends.push(final_form(route)?);
        }

        let mut planner = RoutePlanner::new();

        if let Some(permit) = &options.input_token_permit {
            if input.is_native() {
                return Err(SwapError::InvalidArgument(
                    "permit supplied for a native input".to_string(),
                ));
            }
            planner.permit2_permit(&permit.permit, Bytes::from(permit.signature_bytes()));
        }

        let min_out = trade.minimum_amount_out(&options.slippage_tolerance);
        let route_to_router = trade.routes.len() > 1
            || options.fee.is_some()
            || ends.iter().any(|end| end.is_native() != output.is_native());

        for route in &trade.routes {
            let (recipient, route_min) = if route_to_router {
                (ADDRESS_THIS, U256::ZERO)
            } else {
                (MSG_SENDER, min_out)
            };
            encode_route(&mut planner, route, recipient, route_min)?;
        }

        if route_to_router {
            finish(&mut planner, output, &ends, options.fee.as_ref(), min_out)?;
        }

        let value = if input.is_native() {
            trade.input_amount.raw
        } else {
            U256::ZERO
        };

        debug!(
            "Planned {} commands {:02x?}, min out {}, value {}",
            planner.len(),
            planner.commands,
            min_out,
            value
        );

        let calldata = IUniversalRouter::executeCall {
            commands: Bytes::from(planner.commands),
            inputs: planner.inputs,
            deadline: U256::from(options.deadline),
        }
        .abi_encode();

        Ok(MethodParameters {
            to: self.router,
            calldata: Bytes::from(calldata),
            value,
        })
    }
}

/// Form (native or wrapped) the route's last pool pays out in.
fn final_form(route: &Route) -> SwapResult<Currency> {
    let (Some(pool), Some(currency)) = (route.pools.last(), route.path.last()) else {
        return Err(SwapError::InvalidRoute("empty route".to_string()));
    };
    side(pool, currency)
}

fn side(pool: &Pool, currency: &Currency) -> SwapResult<Currency> {
    pool.matching(currency)
        .cloned()
        .ok_or_else(|| SwapError::InvalidRoute(format!("{} does not trade {}", pool, currency)))
}

/// Split a route where the pool kind changes or adjacent pools disagree on
/// the native/wrapped form of the currency they share.
fn sections(route: &Route) -> SwapResult<Vec<Section>> {
    let mut result: Vec<Section> = Vec::new();
    for (i, pool) in route.pools.iter().enumerate() {
        if let Some(current) = result.last_mut() {
            let previous = &route.pools[i - 1];
            let joint = &route.path[i];
            if current.kind == pool.kind() && side(previous, joint)?.address() == side(pool, joint)?.address() {
                current.end = i + 1;
                continue;
            }
        }
        result.push(Section {
            kind: pool.kind(),
            start: i,
            end: i + 1,
        });
    }
    Ok(result)
}

fn encode_route(planner: &mut RoutePlanner, route: &Route, recipient: Address, route_min: U256) -> SwapResult<()> {
    let sections = sections(route)?;
    let last = sections.len() - 1;

    let mut held = route.input_currency().clone();
    // native input arrives as msg.value, tokens stay with the user until pulled
    let mut in_router = held.is_native();

    for (index, section) in sections.iter().enumerate() {
        let first = index == 0;
        let required = side(&route.pools[section.start], &route.path[section.start])?;

        if required.address() != held.address() {
            if !in_router {
                planner.permit2_transfer_from(held.address(), ADDRESS_THIS, route.input_amount.raw);
                in_router = true;
            }
            if required.is_native() {
                planner.unwrap_weth(ADDRESS_THIS, U256::ZERO);
            } else {
                let amount = if first { route.input_amount.raw } else { CONTRACT_BALANCE };
                planner.wrap_eth(ADDRESS_THIS, amount);
            }
        }

        let amount_in = if first { route.input_amount.raw } else { CONTRACT_BALANCE };
        let (to, min) = if index == last {
            (recipient, route_min)
        } else {
            (ADDRESS_THIS, U256::ZERO)
        };
        encode_section(planner, route, section, amount_in, min, to, !in_router)?;

        held = side(&route.pools[section.end - 1], &route.path[section.end])?;
        in_router = true;
    }
    Ok(())
}

fn encode_section(
    planner: &mut RoutePlanner,
    route: &Route,
    section: &Section,
    amount_in: U256,
    min: U256,
    to: Address,
    payer_is_user: bool,
) -> SwapResult<()> {
    let pools = &route.pools[section.start..section.end];
    let path = &route.path[section.start..=section.end];
    let tokens: Vec<Address> = path.iter().map(|c| c.wrapped_address()).collect();

    match section.kind {
        PoolKind::V2 => planner.v2_swap_exact_in(to, amount_in, min, tokens, payer_is_user),
        PoolKind::V3 => {
            let fees = pools
                .iter()
                .map(|pool| match pool {
                    Pool::V3(p) => Ok(p.fee),
                    other => Err(SwapError::InvalidRoute(format!("{} in a V3 section", other))),
                })
                .collect::<SwapResult<Vec<u32>>>()?;
            planner.v3_swap_exact_in(to, amount_in, min, encode_v3_path(&tokens, &fees), payer_is_user)
        }
        PoolKind::Stable => {
            // two-coin pools only
            let flags = vec![U256::from(2); pools.len()];
            planner.stable_swap_exact_in(to, amount_in, min, tokens, flags, payer_is_user)
        }
        PoolKind::InfinityCl | PoolKind::InfinityBin => {
            let action = if section.kind == PoolKind::InfinityCl {
                InfinityAction::ClSwapExactIn
            } else {
                InfinityAction::BinSwapExactIn
            };
            encode_infinity(planner, action, pools, path, amount_in, min, to, payer_is_user)?
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn encode_infinity(
    planner: &mut RoutePlanner,
    action: InfinityAction,
    pools: &[Pool],
    path: &[Currency],
    amount_in: U256,
    min: U256,
    to: Address,
    payer_is_user: bool,
) -> SwapResult<()> {
    let currency_in = side(&pools[0], &path[0])?.address();
    let currency_out = side(&pools[pools.len() - 1], &path[path.len() - 1])?.address();

    let mut keys = Vec::with_capacity(pools.len());
    for (i, pool) in pools.iter().enumerate() {
        let key = pool
            .infinity_key()
            .ok_or_else(|| SwapError::InvalidRoute(format!("{} in an Infinity section", pool)))?;
        keys.push(PathKey {
            intermediateCurrency: side(pool, &path[i + 1])?.address(),
            fee: U24::from(key.fee),
            hooks: key.hooks,
            poolManager: key.pool_manager,
            hookData: Bytes::new(),
            parameters: key.parameters,
        });
    }

    let amount_out_minimum = u128::try_from(min).map_err(|_| SwapError::MathOverflow)?;
    let mut actions = ActionsPlanner::new();

    if amount_in == CONTRACT_BALANCE {
        // pay in everything the router holds, then swap the open credit
        actions.settle(currency_in, CONTRACT_BALANCE, false);
        actions.swap_exact_in(
            action,
            &InfinityExactInputParams {
                currencyIn: currency_in,
                path: keys,
                amountIn: 0,
                amountOutMinimum: amount_out_minimum,
            },
        );
    } else {
        let amount = u128::try_from(amount_in).map_err(|_| SwapError::MathOverflow)?;
        actions.swap_exact_in(
            action,
            &InfinityExactInputParams {
                currencyIn: currency_in,
                path: keys,
                amountIn: amount,
                amountOutMinimum: amount_out_minimum,
            },
        );
        actions.settle(currency_in, OPEN_DELTA, payer_is_user);
    }
    actions.take(currency_out, to, OPEN_DELTA);

    planner.infi_swap(actions);
    Ok(())
}

/// Collect route outputs held by the router and pay them to the sender.
fn finish(
    planner: &mut RoutePlanner,
    output: &Currency,
    ends: &[Currency],
    fee: Option<&FeeOptions>,
    min_out: U256,
) -> SwapResult<()> {
    let bips = match fee {
        Some(fee) => match fee.fee.to_bps() {
            Some(bips) if bips <= 10_000 => Some((U256::from(bips), fee.recipient)),
            _ => {
                return Err(SwapError::InvalidArgument(format!(
                    "fee {} is not a valid portion",
                    fee.fee
                )))
            }
        },
        None => None,
    };

    if output.is_native() && ends.iter().all(|end| !end.is_native()) {
        let wrapped = output.wrapped_address();
        if let Some((bips, recipient)) = bips {
            planner.pay_portion(wrapped, recipient, bips);
        }
        planner.unwrap_weth(MSG_SENDER, min_out);
        return Ok(());
    }

    if ends.iter().any(|end| end.is_native() != output.is_native()) {
        if output.is_native() {
            planner.unwrap_weth(ADDRESS_THIS, U256::ZERO);
        } else {
            planner.wrap_eth(ADDRESS_THIS, CONTRACT_BALANCE);
        }
    }
    if let Some((bips, recipient)) = bips {
        planner.pay_portion(output.address(), recipient, bips);
    }
    planner.sweep(output.address(), MSG_SENDER, min_out);
    Ok(())
}
