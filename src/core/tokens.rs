use crate::core::{
    constants::{BSC_CHAIN_ID, WBNB_ADDRESS},
    Currency, SwapError, SwapResult, Token,
};
use alloy::primitives::{address, Address};
use std::collections::HashMap;

lazy_static! {
    static ref BSC_TOKENS: Vec<Token> = vec![
        Token::new(BSC_CHAIN_ID, WBNB_ADDRESS, 18, "WBNB", "Wrapped BNB"),
        Token::new(BSC_CHAIN_ID, address!("55d398326f99059ff775485246999027b3197955"), 18, "USDT", "Tether USD"),
        Token::new(BSC_CHAIN_ID, address!("8ac76a51cc950d9822d68b83fe1ad97b32cd580d"), 18, "USDC", "USD Coin"),
        Token::new(BSC_CHAIN_ID, address!("e9e7cea3dedca5984780bafc599bd69add087d56"), 18, "BUSD", "Binance USD"),
        Token::new(BSC_CHAIN_ID, address!("0e09fabb73bd3ade0a17ecc321fd13a19e81ce82"), 18, "CAKE", "PancakeSwap Token"),
        Token::new(BSC_CHAIN_ID, address!("2170ed0880ac9a755fd29b2688956bd959f933f8"), 18, "ETH", "Binance-Peg Ethereum"),
        Token::new(BSC_CHAIN_ID, address!("7130d2a12b9bcbfae4f2634d864a1ee1ce3ead9c"), 18, "BTCB", "Binance-Peg BTCB"),
        Token::new(BSC_CHAIN_ID, address!("f3d5b4c34ed623478cc5141861776e6cf7ae3a1e"), 8, "KGEN", "KGEN"),
    ];
}

/// Default intermediate hops for multi-hop routing.
pub const DEFAULT_ROUTING_BASES: [&str; 3] = ["WBNB", "USDT", "USDC"];

/// Symbol and address lookup for the currencies the router knows about.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    chain_id: u64,
    by_symbol: HashMap<String, Token>,
    by_address: HashMap<Address, Token>,
    bases: Vec<String>,
}

impl TokenRegistry {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            by_symbol: HashMap::new(),
            by_address: HashMap::new(),
            bases: Vec::new(),
        }
    }

    pub fn bsc() -> Self {
        let mut registry = Self::new(BSC_CHAIN_ID);
        for token in BSC_TOKENS.iter() {
            registry.insert(token.clone());
        }
        registry.bases = DEFAULT_ROUTING_BASES.iter().map(|s| s.to_lowercase()).collect();
        registry
    }

    pub fn insert(&mut self, token: Token) {
        self.by_address.insert(token.address, token.clone());
        self.by_symbol.insert(token.symbol.to_lowercase(), token);
    }

    pub fn with_token(mut self, token: Token) -> Self {
        self.insert(token);
        self
    }

    pub fn with_bases(mut self, symbols: &[&str]) -> Self {
        self.bases = symbols.iter().map(|s| s.to_lowercase()).collect();
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Resolve a user-supplied symbol; `bnb` is the native asset.
    pub fn resolve(&self, symbol: &str) -> SwapResult<Currency> {
        let key = symbol.trim().to_lowercase();
        if key == "bnb" {
            return Ok(Currency::native(self.chain_id));
        }
        self.by_symbol
            .get(&key)
            .cloned()
            .map(Currency::Token)
            .ok_or_else(|| SwapError::TokenNotFound(symbol.to_string()))
    }

    /// The zero address is the native asset.
    pub fn by_address(&self, address: Address) -> Option<Currency> {
        if address == Address::ZERO {
            return Some(Currency::native(self.chain_id));
        }
        self.by_address.get(&address).cloned().map(Currency::Token)
    }

    pub fn routing_bases(&self) -> Vec<Currency> {
        self.bases
            .iter()
            .filter_map(|symbol| self.by_symbol.get(symbol).cloned())
            .map(Currency::Token)
            .collect()
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::bsc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_symbols() {
        let registry = TokenRegistry::bsc();

        assert!(registry.resolve("BNB").unwrap().is_native());
        assert_eq!(registry.resolve("usdt").unwrap().symbol(), "USDT");
        assert_eq!(registry.resolve("KGEN").unwrap().decimals(), 8);
        assert!(matches!(
            registry.resolve("UNKNOWN"),
            Err(SwapError::TokenNotFound(_))
        ));
    }

    #[test]
    fn test_lookup_by_address() {
        let registry = TokenRegistry::bsc();

        assert!(registry.by_address(Address::ZERO).unwrap().is_native());
        assert_eq!(registry.by_address(WBNB_ADDRESS).unwrap().symbol(), "WBNB");
        assert!(registry.by_address(Address::repeat_byte(0x42)).is_none());
    }

    #[test]
    fn test_routing_bases() {
        let registry = TokenRegistry::bsc();
        let bases: Vec<String> = registry
            .routing_bases()
            .iter()
            .map(|c| c.symbol().to_string())
            .collect();
        assert_eq!(bases, vec!["WBNB", "USDT", "USDC"]);
    }
}
