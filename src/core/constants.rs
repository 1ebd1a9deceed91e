use alloy::primitives::{address, Address, U256};

pub const BSC_CHAIN_ID: u64 = 56;
pub const BSC_TESTNET_CHAIN_ID: u64 = 97;
pub const DEFAULT_RPC_URL: &str = "https://bsc-dataseed.binance.org/";

// Wrapped native
pub const WBNB_ADDRESS: Address = address!("bb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c");
pub const WBNB_TESTNET_ADDRESS: Address = address!("ae13d989dac2f0debff460ac112a837c89baa7cd");

// PancakeSwap contracts (BSC mainnet)
pub const UNIVERSAL_ROUTER_ADDRESS: Address = address!("d9c500dff816a1da21a48a732d3498bf09dc9aeb");
pub const PERMIT2_ADDRESS: Address = address!("31c2f6fcff4f8759b3bd5bf0e1084a055615c768");
pub const V2_FACTORY_ADDRESS: Address = address!("ca143ce32fe78f1f7019d7d551a6402fc5350c73");
pub const V2_ROUTER_ADDRESS: Address = address!("10ed43c718714eb63d5aa57b78b54704e256024e");
pub const V3_FACTORY_ADDRESS: Address = address!("0bfbcf9fa4f9c56b0f40a671ad40e0805a091865");
pub const V3_QUOTER_ADDRESS: Address = address!("b048bbc1ee6b733fffcfb9e9cef7375518e25997");
pub const STABLE_FACTORY_ADDRESS: Address = address!("25a55f9f2279a54951133d503490342b50e5cd15");
pub const INFINITY_CL_POOL_MANAGER_ADDRESS: Address =
    address!("a0ffb9c1ce1fe56963b0321b32e7a0302114058b");
pub const INFINITY_BIN_POOL_MANAGER_ADDRESS: Address =
    address!("c697d2898e0d09264376196696c51d7abbbaa4a9");
pub const INFINITY_CL_QUOTER_ADDRESS: Address = address!("d0737c9762912dd34c3271197e362aa736df0926");
pub const INFINITY_BIN_QUOTER_ADDRESS: Address =
    address!("c631f4b0fc2dd68ad45f74b2942628db117dd359");

// Universal Router recipient sentinels
pub const MSG_SENDER: Address = address!("0000000000000000000000000000000000000001");
pub const ADDRESS_THIS: Address = address!("0000000000000000000000000000000000000002");

/// Amount sentinel telling the router to use its whole balance.
pub const CONTRACT_BALANCE: U256 = U256::from_limbs([0, 0, 0, 0x8000_0000_0000_0000]);
/// Infinity action amount sentinel for "settle/take the open delta".
pub const OPEN_DELTA: U256 = U256::ZERO;

// Fee tiers (hundredths of a bip)
pub const V3_FEE_TIERS: [u32; 4] = [100, 500, 2500, 10000];
pub const V2_FEE_BPS: u32 = 25;

// Permit2
pub const PERMIT_EXPIRATION_MS: u64 = 30 * 24 * 60 * 60 * 1000; // 30 days
pub const PERMIT_SIG_EXPIRATION_MS: u64 = 30 * 60 * 1000; // 30 minutes
pub const DEFAULT_APPROVE_AMOUNT: &str = "500";

// Swap options
pub const BASE_SLIPPAGE_BPS: u32 = 500; // 5%
pub const DEFAULT_DEADLINE_SECS: u64 = 5 * 60;
pub const DEFAULT_GAS_LIMIT: u64 = 700_000;

// RPC Configuration
pub const DEFAULT_RPC_TIMEOUT: u64 = 30;
pub const DEFAULT_CONFIRMATION_TIMEOUT: u64 = 120;
pub const MAX_RPC_RETRIES: u32 = 3;

// Route search
pub const DEFAULT_MAX_HOPS: usize = 3;
pub const DEFAULT_MAX_SPLITS: usize = 2;
pub const DEFAULT_DISTRIBUTION_PERCENT: u32 = 25;
/// Paths kept for split search after single-path quoting
pub const DEFAULT_MAX_PATHS: usize = 10;
/// Quoter calls in flight at once
pub const QUOTE_CONCURRENCY: usize = 16;

// Gas model (units)
pub const ROUTE_BASE_GAS: u64 = 75_000;
pub const V2_HOP_GAS: u64 = 60_000;
pub const V3_HOP_GAS: u64 = 80_000;
pub const STABLE_HOP_GAS: u64 = 100_000;
pub const INFINITY_CL_HOP_GAS: u64 = 80_000;
pub const INFINITY_BIN_HOP_GAS: u64 = 90_000;
