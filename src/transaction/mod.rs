pub mod calldata;
pub mod monitor;
pub mod planner;

use crate::authorization::{AllowanceProvider, Permit2Allowance};
use crate::core::abi::{IPermit2, IERC20};
use crate::core::{retry_read, Config, RetryConfig, SwapError, SwapResult};
use crate::selection::GasPriceOracle;
use alloy::network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use log::{debug, info};

pub use calldata::{swap_options, FeeOptions, MethodParameters, SwapOptions, SwapRouter};
pub use monitor::{MonitorConfig, TransactionMonitor};
pub use planner::{ActionsPlanner, CommandType, InfinityAction, RoutePlanner};

/// Outcome of a mined swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Broadcasts the final router call.
#[async_trait::async_trait]
pub trait SwapSubmitter: Send + Sync {
    async fn submit(&self, params: &MethodParameters, gas_limit: u64) -> SwapResult<SwapReceipt>;
}

/// Wallet-backed connection to the chain.
///
/// Reads go through the retry helper; writes are sent once and handed to the
/// monitor.
pub struct ChainClient {
    provider: DynProvider,
    owner: Address,
    permit2: Address,
    retry: RetryConfig,
    monitor: TransactionMonitor,
}

impl ChainClient {
    pub async fn connect(config: &Config, signer: PrivateKeySigner) -> SwapResult<Self> {
        let owner = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect(&config.rpc_url)
            .await
            .map_err(|e| SwapError::ConfigError(format!("cannot connect to {}: {}", config.rpc_url, e)))?;

        let chain_id = provider.get_chain_id().await?;
        if chain_id != config.chain_id {
            return Err(SwapError::ConfigError(format!(
                "RPC serves chain {} but {} is configured",
                chain_id, config.chain_id
            )));
        }
        info!("Connected to chain {} as {}", chain_id, owner);

        Ok(Self {
            provider: provider.erased(),
            owner,
            permit2: config.contracts.permit2,
            retry: RetryConfig::from_config(config),
            monitor: TransactionMonitor::new(MonitorConfig {
                confirmation_timeout_secs: config.confirmation_timeout_secs,
            }),
        })
    }

    pub fn provider(&self) -> DynProvider {
        self.provider.clone()
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub async fn native_balance(&self) -> SwapResult<U256> {
        retry_read(&self.retry, "balance", || async {
            Ok(self.provider.get_balance(self.owner).await?)
        })
        .await
    }

    async fn read_erc20_allowance(&self, token: Address, owner: Address, spender: Address) -> SwapResult<U256> {
        let erc20 = IERC20::new(token, self.provider.clone());
        Ok(erc20.allowance(owner, spender).call().await?)
    }

    async fn read_permit2_allowance(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> SwapResult<Permit2Allowance> {
        let permit2 = IPermit2::new(self.permit2, self.provider.clone());
        let record = permit2.allowance(owner, token, spender).call().await?;
        Ok(Permit2Allowance {
            amount: U256::from(record.amount),
            expiration: record.expiration.to::<u64>(),
            nonce: record.nonce.to::<u64>(),
        })
    }
}

#[async_trait::async_trait]
impl GasPriceOracle for ChainClient {
    async fn gas_price(&self) -> SwapResult<u128> {
        retry_read(&self.retry, "gas price", || async {
            Ok(self.provider.get_gas_price().await?)
        })
        .await
    }
}

#[async_trait::async_trait]
impl AllowanceProvider for ChainClient {
    async fn erc20_allowance(&self, token: Address, owner: Address, spender: Address) -> SwapResult<U256> {
        retry_read(&self.retry, "erc20 allowance", move || {
            self.read_erc20_allowance(token, owner, spender)
        })
        .await
    }

    async fn permit2_allowance(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> SwapResult<Permit2Allowance> {
        retry_read(&self.retry, "permit2 allowance", move || {
            self.read_permit2_allowance(owner, token, spender)
        })
        .await
    }

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> SwapResult<TxHash> {
        let erc20 = IERC20::new(token, self.provider.clone());
        let pending = erc20
            .approve(spender, amount)
            .send()
            .await
            .map_err(|e| SwapError::TransactionFailed(format!("approve not sent: {}", e)))?;
        let hash = *pending.tx_hash();
        info!("Approval sent: {}", hash);

        let receipt = self
            .monitor
            .wait_for(hash, "Approval", async {
                Ok(pending.get_receipt().await?)
            })
            .await?;
        if !receipt.status() {
            return Err(SwapError::TransactionFailed(format!("approval {} reverted", hash)));
        }
        Ok(hash)
    }
}

#[async_trait::async_trait]
impl SwapSubmitter for ChainClient {
    async fn submit(&self, params: &MethodParameters, gas_limit: u64) -> SwapResult<SwapReceipt> {
        let request = TransactionRequest::default()
            .with_from(self.owner)
            .with_to(params.to)
            .with_input(params.calldata.clone())
            .with_value(params.value)
            .with_gas_limit(gas_limit);

        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(|e| SwapError::TransactionFailed(format!("swap not sent: {}", e)))?;
        let hash = *pending.tx_hash();
        info!("Swap sent: {}", hash);

        let receipt = self
            .monitor
            .wait_for(hash, "Swap", async { Ok(pending.get_receipt().await?) })
            .await?;
        debug!("Swap receipt: {:?}", receipt);

        if !receipt.status() {
            return Err(SwapError::TransactionFailed(format!("swap {} reverted", hash)));
        }
        Ok(SwapReceipt {
            tx_hash: hash,
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
        })
    }
}
