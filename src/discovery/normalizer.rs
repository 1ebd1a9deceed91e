use crate::core::{
    Currency, InfinityBinPool, InfinityClPool, InfinityPoolKey, Pool, StablePool, SwapError,
    SwapResult, TokenRegistry, V2Pool, V3Pool, V2_FEE_BPS,
};
use crate::discovery::pool_finder::{DiscoveredPool, RawPoolKey};
use alloy::primitives::{Address, B256, U256};
use log::debug;

/// Maps protocol-native pool records onto the canonical [`Pool`] variants.
pub struct PoolNormalizer {
    tokens: TokenRegistry,
}

impl PoolNormalizer {
    pub fn new(tokens: TokenRegistry) -> Self {
        Self { tokens }
    }

    pub fn normalize_all(&self, pools: Vec<DiscoveredPool>) -> SwapResult<Vec<Pool>> {
        let normalized = pools
            .into_iter()
            .map(|pool| self.normalize(pool))
            .collect::<SwapResult<Vec<_>>>()?;
        debug!("Normalized {} pools", normalized.len());
        Ok(normalized)
    }

    pub fn normalize(&self, pool: DiscoveredPool) -> SwapResult<Pool> {
        match pool {
            DiscoveredPool::V2 {
                address,
                token0,
                token1,
                reserve0,
                reserve1,
            } => {
                let (currency0, currency1) = self.currencies(token0, token1)?;
                Ok(Pool::V2(V2Pool {
                    address,
                    currency0,
                    currency1,
                    reserve0,
                    reserve1,
                    fee_bps: V2_FEE_BPS,
                }))
            }
            DiscoveredPool::V3 {
                address,
                token0,
                token1,
                fee,
                tick_spacing,
                sqrt_price_x96,
                tick,
                liquidity,
            } => {
                let (currency0, currency1) = self.currencies(token0, token1)?;
                Ok(Pool::V3(V3Pool {
                    address,
                    currency0,
                    currency1,
                    fee,
                    tick_spacing,
                    sqrt_price_x96,
                    tick,
                    liquidity,
                }))
            }
            DiscoveredPool::Stable {
                address,
                token0,
                token1,
                balance0,
                balance1,
                amplifier,
                fee,
            } => {
                let (currency0, currency1) = self.currencies(token0, token1)?;
                Ok(Pool::Stable(StablePool {
                    address,
                    currency0,
                    currency1,
                    balance0,
                    balance1,
                    amplifier,
                    fee,
                }))
            }
            DiscoveredPool::InfinityCl {
                id,
                key,
                sqrt_price_x96,
                tick,
                liquidity,
                lp_fee,
                protocol_fee,
            } => {
                let tick_spacing = decode_tick_spacing(key.parameters);
                Ok(Pool::InfinityCl(InfinityClPool {
                    key: self.pool_key(id, key)?,
                    tick_spacing,
                    sqrt_price_x96,
                    tick,
                    liquidity,
                    lp_fee,
                    protocol_fee,
                }))
            }
            DiscoveredPool::InfinityBin {
                id,
                key,
                active_id,
                lp_fee,
                protocol_fee,
            } => {
                let bin_step = decode_bin_step(key.parameters);
                Ok(Pool::InfinityBin(InfinityBinPool {
                    key: self.pool_key(id, key)?,
                    bin_step,
                    active_id,
                    lp_fee,
                    protocol_fee,
                }))
            }
            DiscoveredPool::Other { kind, id } => Err(SwapError::UnsupportedPoolKind { kind, id }),
        }
    }

    fn currency(&self, address: Address) -> SwapResult<Currency> {
        self.tokens
            .by_address(address)
            .ok_or_else(|| SwapError::TokenNotFound(address.to_string()))
    }

    fn currencies(&self, token0: Address, token1: Address) -> SwapResult<(Currency, Currency)> {
        if token0 == token1 {
            return Err(SwapError::InvalidPoolState(format!(
                "pool trades {} against itself",
                token0
            )));
        }
        Ok((self.currency(token0)?, self.currency(token1)?))
    }

    fn pool_key(&self, id: B256, key: RawPoolKey) -> SwapResult<InfinityPoolKey> {
        let (currency0, currency1) = self.currencies(key.currency0, key.currency1)?;
        Ok(InfinityPoolKey {
            id,
            currency0,
            currency1,
            hooks: key.hooks,
            pool_manager: key.pool_manager,
            fee: key.fee,
            parameters: key.parameters,
        })
    }
}

/// CL parameters: bits 16..40 hold the signed 24-bit tick spacing.
pub fn decode_tick_spacing(parameters: B256) -> i32 {
    let raw = (U256::from_be_bytes(parameters.0) >> 16usize) & U256::from(0xff_ffffu32);
    let value = raw.to::<u32>();
    // sign-extend from 24 bits
    ((value << 8) as i32) >> 8
}

/// Bin parameters: bits 16..32 hold the bin step.
pub fn decode_bin_step(parameters: B256) -> u16 {
    let raw = (U256::from_be_bytes(parameters.0) >> 16usize) & U256::from(0xffffu32);
    raw.to::<u16>()
}
