use crate::core::{constants::*, error::SwapResult, SwapError};
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Protocol contract addresses; each can be overridden from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contracts {
    pub universal_router: Address,
    pub permit2: Address,
    pub v2_factory: Address,
    pub v2_router: Address,
    pub v3_factory: Address,
    pub v3_quoter: Address,
    pub stable_factory: Address,
    pub infinity_cl_pool_manager: Address,
    pub infinity_bin_pool_manager: Address,
    pub infinity_cl_quoter: Address,
    pub infinity_bin_quoter: Address,
}

impl Contracts {
    pub fn from_env() -> SwapResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            universal_router: env_address("UNIVERSAL_ROUTER_ADDRESS", defaults.universal_router)?,
            permit2: env_address("PERMIT2_ADDRESS", defaults.permit2)?,
            v2_factory: env_address("V2_FACTORY_ADDRESS", defaults.v2_factory)?,
            v2_router: env_address("V2_ROUTER_ADDRESS", defaults.v2_router)?,
            v3_factory: env_address("V3_FACTORY_ADDRESS", defaults.v3_factory)?,
            v3_quoter: env_address("V3_QUOTER_ADDRESS", defaults.v3_quoter)?,
            stable_factory: env_address("STABLE_FACTORY_ADDRESS", defaults.stable_factory)?,
            infinity_cl_pool_manager: env_address(
                "INFINITY_CL_POOL_MANAGER_ADDRESS",
                defaults.infinity_cl_pool_manager,
            )?,
            infinity_bin_pool_manager: env_address(
                "INFINITY_BIN_POOL_MANAGER_ADDRESS",
                defaults.infinity_bin_pool_manager,
            )?,
            infinity_cl_quoter: env_address("INFINITY_CL_QUOTER_ADDRESS", defaults.infinity_cl_quoter)?,
            infinity_bin_quoter: env_address(
                "INFINITY_BIN_QUOTER_ADDRESS",
                defaults.infinity_bin_quoter,
            )?,
        })
    }
}

impl Default for Contracts {
    fn default() -> Self {
        Self {
            universal_router: UNIVERSAL_ROUTER_ADDRESS,
            permit2: PERMIT2_ADDRESS,
            v2_factory: V2_FACTORY_ADDRESS,
            v2_router: V2_ROUTER_ADDRESS,
            v3_factory: V3_FACTORY_ADDRESS,
            v3_quoter: V3_QUOTER_ADDRESS,
            stable_factory: STABLE_FACTORY_ADDRESS,
            infinity_cl_pool_manager: INFINITY_CL_POOL_MANAGER_ADDRESS,
            infinity_bin_pool_manager: INFINITY_BIN_POOL_MANAGER_ADDRESS,
            infinity_cl_quoter: INFINITY_CL_QUOTER_ADDRESS,
            infinity_bin_quoter: INFINITY_BIN_QUOTER_ADDRESS,
        }
    }
}

fn env_address(name: &str, default: Address) -> SwapResult<Address> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Address::from_str(value.trim())
            .map_err(|e| SwapError::ConfigError(format!("{} is not an address: {}", name, e))),
        _ => Ok(default),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rpc_url: String,
    pub chain_id: u64,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub confirmation_timeout_secs: u64,
    pub base_slippage_bps: u32,
    pub deadline_secs: u64,
    pub max_hops: usize,
    pub max_splits: usize,
    pub max_paths: usize,
    pub distribution_percent: u32,
    pub pool_ids_path: Option<PathBuf>,
    /// Whole-token approval floor, scaled by the input token's decimals.
    pub default_approve_amount: String,
    pub gas_limit: u64,
    /// Interface fee taken from the output, in basis points; 0 disables it.
    pub fee_bps: u32,
    pub fee_recipient: Option<Address>,
    pub contracts: Contracts,
}

impl Config {
    pub fn from_env() -> SwapResult<Self> {
        let rpc_url = env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());

        Ok(Self {
            rpc_url,
            chain_id: env::var("CHAIN_ID")
                .unwrap_or_default()
                .parse()
                .unwrap_or(BSC_CHAIN_ID),
            max_retries: env::var("MAX_RETRIES")
                .unwrap_or_default()
                .parse()
                .unwrap_or(MAX_RPC_RETRIES),
            timeout_secs: env::var("TIMEOUT_SECS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(DEFAULT_RPC_TIMEOUT),
            confirmation_timeout_secs: env::var("CONFIRMATION_TIMEOUT_SECS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT),
            base_slippage_bps: env::var("BASE_SLIPPAGE_BPS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(BASE_SLIPPAGE_BPS),
            deadline_secs: env::var("DEADLINE_SECS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(DEFAULT_DEADLINE_SECS),
            max_hops: env::var("MAX_HOPS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(DEFAULT_MAX_HOPS),
            max_splits: env::var("MAX_SPLITS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(DEFAULT_MAX_SPLITS),
            max_paths: env::var("MAX_PATHS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(DEFAULT_MAX_PATHS),
            distribution_percent: env::var("DISTRIBUTION_PERCENT")
                .unwrap_or_default()
                .parse()
                .unwrap_or(DEFAULT_DISTRIBUTION_PERCENT),
            pool_ids_path: env::var("POOL_IDS_PATH").ok().map(PathBuf::from),
            default_approve_amount: env::var("DEFAULT_APPROVE_AMOUNT")
                .unwrap_or_else(|_| DEFAULT_APPROVE_AMOUNT.to_string()),
            gas_limit: env::var("GAS_LIMIT")
                .unwrap_or_default()
                .parse()
                .unwrap_or(DEFAULT_GAS_LIMIT),
            fee_bps: env::var("FEE_BPS").unwrap_or_default().parse().unwrap_or(0),
            fee_recipient: match env::var("FEE_RECIPIENT") {
                Ok(value) if !value.trim().is_empty() => Some(env_address("FEE_RECIPIENT", Address::ZERO)?),
                _ => None,
            },
            contracts: Contracts::from_env()?,
        })
    }

    pub fn validate(&self) -> SwapResult<()> {
        if self.base_slippage_bps >= 10_000 {
            return Err(SwapError::ConfigError(
                "Base slippage must be below 100%".to_string(),
            ));
        }

        if self.timeout_secs == 0 || self.confirmation_timeout_secs == 0 {
            return Err(SwapError::ConfigError(
                "Timeouts must be greater than 0".to_string(),
            ));
        }

        if self.max_hops == 0 {
            return Err(SwapError::ConfigError(
                "Max hops must be at least 1".to_string(),
            ));
        }

        if self.max_splits == 0 {
            return Err(SwapError::ConfigError(
                "Max splits must be at least 1".to_string(),
            ));
        }

        if self.max_paths == 0 {
            return Err(SwapError::ConfigError(
                "Max paths must be at least 1".to_string(),
            ));
        }

        if self.distribution_percent == 0
            || self.distribution_percent > 100
            || 100 % self.distribution_percent != 0
        {
            return Err(SwapError::ConfigError(
                "Distribution percent must evenly divide 100".to_string(),
            ));
        }

        if self.contracts.universal_router == Address::ZERO || self.contracts.permit2 == Address::ZERO
        {
            return Err(SwapError::ConfigError(
                "Router and Permit2 addresses must be set".to_string(),
            ));
        }

        if self.fee_bps >= 10_000 {
            return Err(SwapError::ConfigError(
                "Fee must be below 100%".to_string(),
            ));
        }

        if self.fee_bps > 0 && self.fee_recipient.is_none() {
            return Err(SwapError::ConfigError(
                "FEE_RECIPIENT is required when FEE_BPS is set".to_string(),
            ));
        }

        if self.deadline_secs == 0 {
            return Err(SwapError::ConfigError(
                "Deadline window must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chain_id: BSC_CHAIN_ID,
            max_retries: MAX_RPC_RETRIES,
            timeout_secs: DEFAULT_RPC_TIMEOUT,
            confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT,
            base_slippage_bps: BASE_SLIPPAGE_BPS,
            deadline_secs: DEFAULT_DEADLINE_SECS,
            max_hops: DEFAULT_MAX_HOPS,
            max_splits: DEFAULT_MAX_SPLITS,
            max_paths: DEFAULT_MAX_PATHS,
            distribution_percent: DEFAULT_DISTRIBUTION_PERCENT,
            pool_ids_path: None,
            default_approve_amount: DEFAULT_APPROVE_AMOUNT.to_string(),
            gas_limit: DEFAULT_GAS_LIMIT,
            fee_bps: 0,
            fee_recipient: None,
            contracts: Contracts::default(),
        }
    }
}
