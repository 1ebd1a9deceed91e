//! Ordered swap stages: discover, normalize, search, build trade, authorize,
//! build call data and, when executing, submit.

use crate::authorization::{ApprovalMode, Authorization, Authorizer, SignedPermit};
use crate::core::{Clock, Config, Currency, CurrencyAmount, Percent, Pool, SwapResult, TradeType};
use crate::discovery::{DiscoveredPool, PoolDiscovery, PoolNormalizer};
use crate::selection::{BestTrade, GasPriceOracle, TradeSearch};
use crate::trade::{build_trade, Trade};
use crate::transaction::{
    swap_options, FeeOptions, MethodParameters, SwapOptions, SwapReceipt, SwapRouter, SwapSubmitter,
};
use log::{debug, info};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discover,
    Normalize,
    Search,
    BuildTrade,
    Authorize,
    BuildCallData,
    Submit,
}

impl Stage {
    fn number(&self) -> usize {
        *self as usize + 1
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Discover => "discover pools",
            Stage::Normalize => "normalize pools",
            Stage::Search => "search best trade",
            Stage::BuildTrade => "build trade",
            Stage::Authorize => "authorize input",
            Stage::BuildCallData => "build call data",
            Stage::Submit => "submit swap",
        };
        write!(f, "{}", name)
    }
}

/// One swap to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub trade_type: TradeType,
    pub amount: CurrencyAmount,
    pub quote_currency: Currency,
}

impl SwapRequest {
    pub fn exact_input(amount: CurrencyAmount, quote_currency: Currency) -> Self {
        Self {
            trade_type: TradeType::ExactInput,
            amount,
            quote_currency,
        }
    }
}

/// Output of the read-only stages: nothing signed or sent yet.
#[derive(Debug, Clone)]
pub struct QuotedSwap {
    pub request: SwapRequest,
    pub pools: Vec<Pool>,
    pub trade: Trade,
}

/// Everything produced before submission.
#[derive(Debug, Clone)]
pub struct PreparedSwap {
    pub request: SwapRequest,
    pub pools: Vec<Pool>,
    pub trade: Trade,
    pub authorization: Authorization,
    pub options: SwapOptions,
    pub params: MethodParameters,
}

#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub prepared: PreparedSwap,
    pub receipt: SwapReceipt,
}

/// Collaborators the pipeline drives.
pub struct PipelineParts {
    pub discovery: PoolDiscovery,
    pub normalizer: PoolNormalizer,
    pub search: TradeSearch,
    pub gas_oracle: Arc<dyn GasPriceOracle>,
    pub authorizer: Authorizer,
    pub submitter: Arc<dyn SwapSubmitter>,
    pub clock: Arc<dyn Clock>,
}

pub struct SwapPipeline {
    discovery: PoolDiscovery,
    normalizer: PoolNormalizer,
    search: TradeSearch,
    gas_oracle: Arc<dyn GasPriceOracle>,
    authorizer: Authorizer,
    router: SwapRouter,
    submitter: Arc<dyn SwapSubmitter>,
    clock: Arc<dyn Clock>,
    base_slippage: Percent,
    deadline_secs: u64,
    gas_limit: u64,
    fee: Option<FeeOptions>,
}

impl SwapPipeline {
    pub fn new(parts: PipelineParts, config: &Config) -> Self {
        Self {
            discovery: parts.discovery,
            normalizer: parts.normalizer,
            search: parts.search,
            gas_oracle: parts.gas_oracle,
            authorizer: parts.authorizer,
            router: SwapRouter::new(config.contracts.universal_router),
            submitter: parts.submitter,
            clock: parts.clock,
            base_slippage: Percent::from_bps(config.base_slippage_bps),
            deadline_secs: config.deadline_secs,
            gas_limit: config.gas_limit,
            fee: fee_options(config),
        }
    }

    /// Router options for a swap built now, fee and slippage merged.
    pub fn swap_options(&self, permit: Option<SignedPermit>) -> SwapOptions {
        swap_options(
            self.base_slippage.clone(),
            self.deadline_secs,
            self.clock.as_ref(),
            self.fee.clone(),
            permit,
        )
    }

    /// Run every stage up to and including call-data construction.
    pub async fn prepare(&self, request: SwapRequest) -> SwapResult<PreparedSwap> {
        let quoted = self.quote(request).await?;
        self.finalize(quoted).await
    }

    /// Discover, normalize, search and build the trade. Touches no allowance.
    pub async fn quote(&self, request: SwapRequest) -> SwapResult<QuotedSwap> {
        info!(
            "Preparing {} swap of {} for {}",
            request.trade_type, request.amount, request.quote_currency
        );

        let discovered = self.discover(&request).await?;
        let pools = self.normalize(discovered)?;
        let best = self.find_best(&request, &pools).await?;
        let trade = self.build(best)?;

        Ok(QuotedSwap {
            request,
            pools,
            trade,
        })
    }

    /// Authorize the input and build the router call for a quoted trade.
    pub async fn finalize(&self, quoted: QuotedSwap) -> SwapResult<PreparedSwap> {
        self.finalize_with(quoted, ApprovalMode::Send).await
    }

    /// Like [`finalize`](Self::finalize) but never writes to the chain: a
    /// missing approval is reported on the authorization instead of sent.
    pub async fn finalize_dry_run(&self, quoted: QuotedSwap) -> SwapResult<PreparedSwap> {
        self.finalize_with(quoted, ApprovalMode::Skip).await
    }

    async fn finalize_with(&self, quoted: QuotedSwap, mode: ApprovalMode) -> SwapResult<PreparedSwap> {
        let QuotedSwap {
            request,
            pools,
            trade,
        } = quoted;
        let authorization = self.authorize(&request, mode).await?;
        let (options, params) = self.build_call_data(&trade, &authorization)?;

        Ok(PreparedSwap {
            request,
            pools,
            trade,
            authorization,
            options,
            params,
        })
    }

    /// Prepare and submit.
    pub async fn execute(&self, request: SwapRequest) -> SwapResult<SwapOutcome> {
        let prepared = self.prepare(request).await?;
        let receipt = self.submit(&prepared).await?;
        Ok(SwapOutcome { prepared, receipt })
    }

    pub async fn submit(&self, prepared: &PreparedSwap) -> SwapResult<SwapReceipt> {
        self.enter(Stage::Submit);
        let receipt = self.submitter.submit(&prepared.params, self.gas_limit).await?;
        info!("Swap confirmed: {}", receipt.tx_hash);
        Ok(receipt)
    }

    fn enter(&self, stage: Stage) {
        info!("[{}/{}] {}", stage.number(), Stage::Submit.number(), stage);
    }

    async fn discover(&self, request: &SwapRequest) -> SwapResult<Vec<DiscoveredPool>> {
        self.enter(Stage::Discover);
        let pools = self
            .discovery
            .discover(&request.amount.currency, &request.quote_currency)
            .await?;
        info!("Discovered {} pools", pools.len());
        Ok(pools)
    }

    fn normalize(&self, discovered: Vec<DiscoveredPool>) -> SwapResult<Vec<Pool>> {
        self.enter(Stage::Normalize);
        let pools = self.normalizer.normalize_all(discovered)?;
        for pool in &pools {
            debug!("  {}", pool);
        }
        Ok(pools)
    }

    async fn find_best(&self, request: &SwapRequest, pools: &[Pool]) -> SwapResult<BestTrade> {
        self.enter(Stage::Search);
        self.search
            .find_best_trade(
                &request.amount,
                &request.quote_currency,
                request.trade_type,
                pools,
                self.gas_oracle.as_ref(),
            )
            .await
    }

    fn build(&self, best: BestTrade) -> SwapResult<Trade> {
        self.enter(Stage::BuildTrade);
        let trade = build_trade(best)?;
        for route in &trade.routes {
            info!("  {}", route);
        }
        Ok(trade)
    }

    async fn authorize(&self, request: &SwapRequest, mode: ApprovalMode) -> SwapResult<Authorization> {
        self.enter(Stage::Authorize);
        let authorization = self.authorizer.authorize_with(&request.amount, mode).await?;
        debug!("Authorization trace: {:?}", authorization.trace);
        Ok(authorization)
    }

    fn build_call_data(
        &self,
        trade: &Trade,
        authorization: &Authorization,
    ) -> SwapResult<(SwapOptions, MethodParameters)> {
        self.enter(Stage::BuildCallData);
        let options = self.swap_options(authorization.permit.clone());
        let params = self.router.swap_call_parameters(trade, &options)?;
        info!(
            "Call data ready: {} bytes to {}, value {}",
            params.calldata.len(),
            params.to,
            params.value
        );
        Ok((options, params))
    }
}

/// Configured interface fee, if any. A zero fee is no fee.
fn fee_options(config: &Config) -> Option<FeeOptions> {
    match (config.fee_bps, config.fee_recipient) {
        (0, _) | (_, None) => None,
        (bps, Some(recipient)) => Some(FeeOptions {
            fee: Percent::from_bps(bps),
            recipient,
        }),
    }
}
