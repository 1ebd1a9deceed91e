use crate::core::{abi, constants::*, Currency};
use alloy::primitives::{aliases::U24, Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolKind {
    V2,
    V3,
    Stable,
    InfinityCl,
    InfinityBin,
}

impl PoolKind {
    pub fn is_infinity(&self) -> bool {
        matches!(self, PoolKind::InfinityCl | PoolKind::InfinityBin)
    }

    /// Gas units one hop through this kind of pool costs.
    pub fn hop_gas(&self) -> u64 {
        match self {
            PoolKind::V2 => V2_HOP_GAS,
            PoolKind::V3 => V3_HOP_GAS,
            PoolKind::Stable => STABLE_HOP_GAS,
            PoolKind::InfinityCl => INFINITY_CL_HOP_GAS,
            PoolKind::InfinityBin => INFINITY_BIN_HOP_GAS,
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::V2 => write!(f, "V2"),
            PoolKind::V3 => write!(f, "V3"),
            PoolKind::Stable => write!(f, "Stable"),
            PoolKind::InfinityCl => write!(f, "InfinityCL"),
            PoolKind::InfinityBin => write!(f, "InfinityBIN"),
        }
    }
}

/// Pools are identified by contract address (V2/V3/Stable) or pool id (Infinity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolId {
    Address(Address),
    Id(B256),
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolId::Address(address) => write!(f, "{}", address),
            PoolId::Id(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V2Pool {
    pub address: Address,
    pub currency0: Currency,
    pub currency1: Currency,
    pub reserve0: U256,
    pub reserve1: U256,
    pub fee_bps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V3Pool {
    pub address: Address,
    pub currency0: Currency,
    pub currency1: Currency,
    /// Hundredths of a bip
    pub fee: u32,
    pub tick_spacing: i32,
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StablePool {
    pub address: Address,
    pub currency0: Currency,
    pub currency1: Currency,
    pub balance0: U256,
    pub balance1: U256,
    pub amplifier: U256,
    /// Fee with 1e10 denominator, as the pool contract reports it
    pub fee: U256,
}

/// Fields common to both Infinity pool kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfinityPoolKey {
    pub id: B256,
    pub currency0: Currency,
    pub currency1: Currency,
    pub hooks: Address,
    pub pool_manager: Address,
    pub fee: u32,
    pub parameters: B256,
}

impl InfinityPoolKey {
    /// Low 16 bits of `parameters`.
    pub fn hooks_registration(&self) -> u16 {
        u16::from_be_bytes([self.parameters[30], self.parameters[31]])
    }

    pub fn to_abi(&self) -> abi::PoolKey {
        abi::PoolKey {
            currency0: self.currency0.address(),
            currency1: self.currency1.address(),
            hooks: self.hooks,
            poolManager: self.pool_manager,
            fee: U24::from(self.fee),
            parameters: self.parameters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfinityClPool {
    pub key: InfinityPoolKey,
    pub tick_spacing: i32,
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: u128,
    pub lp_fee: u32,
    pub protocol_fee: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfinityBinPool {
    pub key: InfinityPoolKey,
    pub bin_step: u16,
    pub active_id: u32,
    pub lp_fee: u32,
    pub protocol_fee: u32,
}

/// Canonical routing-graph node; every variant links exactly two currencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pool {
    V2(V2Pool),
    V3(V3Pool),
    Stable(StablePool),
    InfinityCl(InfinityClPool),
    InfinityBin(InfinityBinPool),
}

impl Pool {
    pub fn kind(&self) -> PoolKind {
        match self {
            Pool::V2(_) => PoolKind::V2,
            Pool::V3(_) => PoolKind::V3,
            Pool::Stable(_) => PoolKind::Stable,
            Pool::InfinityCl(_) => PoolKind::InfinityCl,
            Pool::InfinityBin(_) => PoolKind::InfinityBin,
        }
    }

    pub fn id(&self) -> PoolId {
        match self {
            Pool::V2(p) => PoolId::Address(p.address),
            Pool::V3(p) => PoolId::Address(p.address),
            Pool::Stable(p) => PoolId::Address(p.address),
            Pool::InfinityCl(p) => PoolId::Id(p.key.id),
            Pool::InfinityBin(p) => PoolId::Id(p.key.id),
        }
    }

    pub fn currency0(&self) -> &Currency {
        match self {
            Pool::V2(p) => &p.currency0,
            Pool::V3(p) => &p.currency0,
            Pool::Stable(p) => &p.currency0,
            Pool::InfinityCl(p) => &p.key.currency0,
            Pool::InfinityBin(p) => &p.key.currency0,
        }
    }

    pub fn currency1(&self) -> &Currency {
        match self {
            Pool::V2(p) => &p.currency1,
            Pool::V3(p) => &p.currency1,
            Pool::Stable(p) => &p.currency1,
            Pool::InfinityCl(p) => &p.key.currency1,
            Pool::InfinityBin(p) => &p.key.currency1,
        }
    }

    /// Whether the pool trades `currency` (native and wrapped are one node).
    pub fn involves(&self, currency: &Currency) -> bool {
        self.currency0().same_wrapped(currency) || self.currency1().same_wrapped(currency)
    }

    /// The pool's own form of `currency` (native vs wrapped as the pool holds it).
    pub fn matching(&self, currency: &Currency) -> Option<&Currency> {
        if self.currency0().same_wrapped(currency) {
            Some(self.currency0())
        } else if self.currency1().same_wrapped(currency) {
            Some(self.currency1())
        } else {
            None
        }
    }

    /// The side opposite `currency`.
    pub fn other(&self, currency: &Currency) -> Option<&Currency> {
        if self.currency0().same_wrapped(currency) {
            Some(self.currency1())
        } else if self.currency1().same_wrapped(currency) {
            Some(self.currency0())
        } else {
            None
        }
    }

    pub fn infinity_key(&self) -> Option<&InfinityPoolKey> {
        match self {
            Pool::InfinityCl(p) => Some(&p.key),
            Pool::InfinityBin(p) => Some(&p.key),
            _ => None,
        }
    }

    /// True when swapping `currency_in` moves the pool from currency0 to currency1.
    pub fn zero_for_one(&self, currency_in: &Currency) -> bool {
        self.currency0().same_wrapped(currency_in)
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} ({})",
            self.kind(),
            self.currency0(),
            self.currency1(),
            self.id()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{types::wrapped_native, Token};
    use alloy::primitives::address;

    fn cl_pool(parameters: B256) -> Pool {
        Pool::InfinityCl(InfinityClPool {
            key: InfinityPoolKey {
                id: B256::repeat_byte(1),
                currency0: Currency::native(BSC_CHAIN_ID),
                currency1: Currency::Token(Token::new(
                    BSC_CHAIN_ID,
                    address!("55d398326f99059ff775485246999027b3197955"),
                    18,
                    "USDT",
                    "Tether USD",
                )),
                hooks: Address::ZERO,
                pool_manager: INFINITY_CL_POOL_MANAGER_ADDRESS,
                fee: 500,
                parameters,
            },
            tick_spacing: 10,
            sqrt_price_x96: U256::from(1u64) << 96,
            tick: 0,
            liquidity: 1_000_000,
            lp_fee: 500,
            protocol_fee: 0,
        })
    }

    #[test]
    fn test_native_pool_matches_wrapped_currency() {
        let pool = cl_pool(B256::ZERO);
        let wbnb = Currency::Token(wrapped_native(BSC_CHAIN_ID));

        assert!(pool.involves(&wbnb));
        assert!(pool.matching(&wbnb).unwrap().is_native());
        assert_eq!(pool.other(&wbnb).unwrap().symbol(), "USDT");
        assert!(pool.zero_for_one(&wbnb));
        assert_eq!(pool.kind(), PoolKind::InfinityCl);
        assert!(matches!(pool.id(), PoolId::Id(_)));
    }

    #[test]
    fn test_hooks_registration_bits() {
        let mut raw = [0u8; 32];
        raw[29] = 0x0a; // tick spacing 10 at bits 16..
        raw[30] = 0x01;
        raw[31] = 0x55;
        let pool = cl_pool(B256::from(raw));
        if let Pool::InfinityCl(p) = pool {
            assert_eq!(p.key.hooks_registration(), 0x0155);
        } else {
            unreachable!();
        }
    }
}
