use crate::core::{
    constants::{BSC_CHAIN_ID, BSC_TESTNET_CHAIN_ID, WBNB_ADDRESS, WBNB_TESTNET_ADDRESS},
    SwapError, SwapResult,
};
use alloy::primitives::{Address, U256};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub chain_id: u64,
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
}

impl Token {
    pub fn new(chain_id: u64, address: Address, decimals: u8, symbol: &str, name: &str) -> Self {
        Self {
            chain_id,
            address,
            decimals,
            symbol: symbol.to_string(),
            name: name.to_string(),
        }
    }
}

/// The chain's native asset or an ERC-20 token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    Native { chain_id: u64 },
    Token(Token),
}

impl Currency {
    pub fn native(chain_id: u64) -> Self {
        Currency::Native { chain_id }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Currency::Native { .. })
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Currency::Native { chain_id } => *chain_id,
            Currency::Token(token) => token.chain_id,
        }
    }

    pub fn decimals(&self) -> u8 {
        match self {
            Currency::Native { .. } => 18,
            Currency::Token(token) => token.decimals,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Currency::Native { .. } => "BNB",
            Currency::Token(token) => &token.symbol,
        }
    }

    /// Infinity pools address native currency as the zero address.
    pub fn address(&self) -> Address {
        match self {
            Currency::Native { .. } => Address::ZERO,
            Currency::Token(token) => token.address,
        }
    }

    pub fn wrapped(&self) -> Token {
        match self {
            Currency::Native { chain_id } => wrapped_native(*chain_id),
            Currency::Token(token) => token.clone(),
        }
    }

    pub fn wrapped_address(&self) -> Address {
        match self {
            Currency::Native { chain_id } => wrapped_native(*chain_id).address,
            Currency::Token(token) => token.address,
        }
    }

    /// Native and its wrapped token are the same routing node.
    pub fn same_wrapped(&self, other: &Currency) -> bool {
        self.wrapped_address() == other.wrapped_address()
    }

    /// Whether this is the wrapped native token (not the native asset itself).
    pub fn is_wrapped_native(&self) -> bool {
        match self {
            Currency::Native { .. } => false,
            Currency::Token(token) => token.address == wrapped_native(token.chain_id).address,
        }
    }

    /// Infinity pool keys order currencies by raw address, native first.
    pub fn sorts_before(&self, other: &Currency) -> bool {
        self.address() < other.address()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

pub fn wrapped_native(chain_id: u64) -> Token {
    match chain_id {
        BSC_TESTNET_CHAIN_ID => Token::new(
            BSC_TESTNET_CHAIN_ID,
            WBNB_TESTNET_ADDRESS,
            18,
            "WBNB",
            "Wrapped BNB",
        ),
        _ => Token::new(BSC_CHAIN_ID, WBNB_ADDRESS, 18, "WBNB", "Wrapped BNB"),
    }
}

/// A currency paired with a raw amount in its smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyAmount {
    pub currency: Currency,
    pub raw: U256,
}

impl CurrencyAmount {
    pub fn from_raw(currency: Currency, raw: U256) -> Self {
        Self { currency, raw }
    }

    pub fn checked_add(&self, other: &CurrencyAmount) -> SwapResult<CurrencyAmount> {
        if !self.currency.same_wrapped(&other.currency) {
            return Err(SwapError::InvalidArgument(format!(
                "cannot add {} to {}",
                other.currency, self.currency
            )));
        }
        let raw = self
            .raw
            .checked_add(other.raw)
            .ok_or(SwapError::MathOverflow)?;
        Ok(Self::from_raw(self.currency.clone(), raw))
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }
}

impl fmt::Display for CurrencyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            crate::utils::format_amount(self.raw, self.currency.decimals()),
            self.currency.symbol()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeType {
    ExactInput,
    ExactOutput,
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeType::ExactInput => write!(f, "EXACT_INPUT"),
            TradeType::ExactOutput => write!(f, "EXACT_OUTPUT"),
        }
    }
}

/// Rational fraction with arbitrary-precision parts.
#[derive(Debug, Clone, Eq)]
pub struct Percent {
    pub numerator: BigUint,
    pub denominator: BigUint,
}

impl Percent {
    pub fn new(numerator: u64, denominator: u64) -> Self {
        assert!(denominator != 0, "percent denominator must be non-zero");
        Self {
            numerator: BigUint::from(numerator),
            denominator: BigUint::from(denominator),
        }
    }

    pub fn from_bps(bps: u32) -> Self {
        Self::new(bps as u64, 10_000)
    }

    pub fn zero() -> Self {
        Self::new(0, 1)
    }

    pub fn add(&self, other: &Percent) -> Percent {
        if self.denominator == other.denominator {
            return Percent {
                numerator: &self.numerator + &other.numerator,
                denominator: self.denominator.clone(),
            };
        }
        Percent {
            numerator: &self.numerator * &other.denominator + &other.numerator * &self.denominator,
            denominator: &self.denominator * &other.denominator,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    /// `floor(amount / (1 + self))`, the exact-input slippage bound.
    pub fn minimum_amount_out(&self, amount: U256) -> U256 {
        let amount = BigUint::from_bytes_be(&amount.to_be_bytes::<32>());
        let adjusted = amount * &self.denominator / (&self.denominator + &self.numerator);
        // adjusted <= amount, so it always fits
        U256::from_be_slice(&adjusted.to_bytes_be())
    }

    /// Value in basis points, rounded down.
    pub fn to_bps(&self) -> Option<u64> {
        (&self.numerator * BigUint::from(10_000u32) / &self.denominator).to_u64()
    }

    pub fn to_decimal(&self) -> Option<Decimal> {
        let numerator = Decimal::from_str_exact(&self.numerator.to_string()).ok()?;
        let denominator = Decimal::from_str_exact(&self.denominator.to_string()).ok()?;
        numerator
            .checked_mul(Decimal::ONE_HUNDRED)?
            .checked_div(denominator)
    }
}

impl PartialEq for Percent {
    fn eq(&self, other: &Self) -> bool {
        &self.numerator * &other.denominator == &other.numerator * &self.denominator
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Some(value) => write!(f, "{}%", value.round_dp(4).normalize()),
            None => write!(f, "{}/{}", self.numerator, self.denominator),
        }
    }
}

/// Source of "now" for deadlines and permit windows.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    fn usdt() -> Currency {
        Currency::Token(Token::new(
            BSC_CHAIN_ID,
            address!("55d398326f99059ff775485246999027b3197955"),
            18,
            "USDT",
            "Tether USD",
        ))
    }

    #[test]
    fn test_native_wraps_to_wbnb() {
        let bnb = Currency::native(BSC_CHAIN_ID);
        assert!(bnb.is_native());
        assert_eq!(bnb.address(), Address::ZERO);
        assert_eq!(bnb.wrapped_address(), WBNB_ADDRESS);
        assert!(bnb.same_wrapped(&Currency::Token(wrapped_native(BSC_CHAIN_ID))));
        assert!(!bnb.same_wrapped(&usdt()));
        assert!(bnb.sorts_before(&usdt()));
    }

    #[test]
    fn test_percent_addition_is_exact() {
        let base = Percent::new(5, 100);
        let fee = Percent::new(15, 10_000);
        let merged = base.add(&fee);
        assert_eq!(merged, Percent::new(515, 10_000));
        assert_eq!(base.add(&Percent::zero()), base);
        assert_eq!(merged.to_bps(), Some(515));
    }

    #[test]
    fn test_minimum_amount_out() {
        let slippage = Percent::new(5, 100);
        // 1050 / 1.05 = 1000
        assert_eq!(slippage.minimum_amount_out(U256::from(1050)), U256::from(1000));
        // floor(1000 / 1.05) = 952
        assert_eq!(slippage.minimum_amount_out(U256::from(1000)), U256::from(952));
        assert_eq!(Percent::zero().minimum_amount_out(U256::MAX), U256::MAX);
    }

    #[test]
    fn test_checked_add_rejects_foreign_currency() {
        let a = CurrencyAmount::from_raw(usdt(), U256::from(1));
        let b = CurrencyAmount::from_raw(Currency::native(BSC_CHAIN_ID), U256::from(1));
        assert!(a.checked_add(&b).is_err());

        let max = CurrencyAmount::from_raw(usdt(), U256::MAX);
        assert!(matches!(max.checked_add(&a), Err(SwapError::MathOverflow)));
    }

    #[test]
    fn test_percent_display() {
        assert_eq!(Percent::new(5, 100).to_string(), "5%");
        assert_eq!(Percent::from_bps(515).to_string(), "5.15%");
    }
}
