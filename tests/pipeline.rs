use alloy::primitives::{Address, TxHash, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;
use infinity_swap::authorization::{AllowanceProvider, AuthState, Authorizer, Permit2Allowance};
use infinity_swap::core::abi::IUniversalRouter;
use infinity_swap::core::{
    Clock, Config, Currency, CurrencyAmount, Pool, SwapError, SwapResult, TokenRegistry,
    INFINITY_CL_POOL_MANAGER_ADDRESS, PERMIT2_ADDRESS, UNIVERSAL_ROUTER_ADDRESS,
};
use infinity_swap::discovery::{DiscoveredPool, PoolDiscovery, PoolFinder, PoolNormalizer, RawPoolKey};
use infinity_swap::pipeline::{PipelineParts, SwapPipeline, SwapRequest};
use infinity_swap::quotes::PoolQuoter;
use infinity_swap::selection::{GasPriceOracle, SearchOptions, TradeSearch};
use infinity_swap::trade::RouteType;
use infinity_swap::transaction::{MethodParameters, SwapReceipt, SwapSubmitter};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

const NOW_MS: u64 = 1_700_000_000_000;

struct FixedClock;

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        NOW_MS
    }
}

/// Returns the same pools for every request.
struct StaticFinder(Vec<DiscoveredPool>);

#[async_trait::async_trait]
impl PoolFinder for StaticFinder {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn find_pools(&self, _pairs: &[(Currency, Currency)]) -> SwapResult<Vec<DiscoveredPool>> {
        Ok(self.0.clone())
    }
}

/// Every pool pays out twice the input.
struct DoublingQuoter;

#[async_trait::async_trait]
impl PoolQuoter for DoublingQuoter {
    async fn quote_exact_input(
        &self,
        _pool: &Pool,
        _currency_in: &Currency,
        amount_in: U256,
    ) -> SwapResult<Option<U256>> {
        Ok(Some(amount_in * U256::from(2)))
    }
}

struct FixedGas;

#[async_trait::async_trait]
impl GasPriceOracle for FixedGas {
    async fn gas_price(&self) -> SwapResult<u128> {
        Ok(1_000_000_000)
    }
}

#[derive(Default)]
struct ChainState {
    allowance: Mutex<U256>,
    nonce: Mutex<u64>,
    calls: Mutex<Vec<String>>,
    submitted: Mutex<Vec<MethodParameters>>,
}

impl ChainState {
    fn with_allowance(allowance: U256) -> Arc<Self> {
        let state = Self::default();
        *state.allowance.lock().unwrap() = allowance;
        *state.nonce.lock().unwrap() = 2;
        Arc::new(state)
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn submitted(&self) -> Vec<MethodParameters> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AllowanceProvider for ChainState {
    async fn erc20_allowance(&self, _token: Address, _owner: Address, spender: Address) -> SwapResult<U256> {
        assert_eq!(spender, PERMIT2_ADDRESS);
        self.calls.lock().unwrap().push("allowance".to_string());
        Ok(*self.allowance.lock().unwrap())
    }

    async fn permit2_allowance(
        &self,
        _owner: Address,
        _token: Address,
        spender: Address,
    ) -> SwapResult<Permit2Allowance> {
        assert_eq!(spender, UNIVERSAL_ROUTER_ADDRESS);
        self.calls.lock().unwrap().push("nonce".to_string());
        Ok(Permit2Allowance {
            nonce: *self.nonce.lock().unwrap(),
            ..Default::default()
        })
    }

    async fn approve(&self, _token: Address, spender: Address, amount: U256) -> SwapResult<TxHash> {
        assert_eq!(spender, PERMIT2_ADDRESS);
        self.calls.lock().unwrap().push(format!("approve:{}", amount));
        *self.allowance.lock().unwrap() = amount;
        *self.nonce.lock().unwrap() += 1;
        Ok(TxHash::repeat_byte(0xaa))
    }
}

#[async_trait::async_trait]
impl SwapSubmitter for ChainState {
    async fn submit(&self, params: &MethodParameters, _gas_limit: u64) -> SwapResult<SwapReceipt> {
        self.calls.lock().unwrap().push("submit".to_string());
        self.submitted.lock().unwrap().push(params.clone());
        Ok(SwapReceipt {
            tx_hash: TxHash::repeat_byte(0xbb),
            block_number: Some(1),
            gas_used: 150_000,
        })
    }
}

fn tokens() -> TokenRegistry {
    TokenRegistry::bsc()
}

fn currency(symbol: &str) -> Currency {
    tokens().resolve(symbol).unwrap()
}

fn whole(symbol: &str, units: u64) -> CurrencyAmount {
    let currency = currency(symbol);
    let raw = U256::from(units) * U256::from(10u64).pow(U256::from(currency.decimals()));
    CurrencyAmount::from_raw(currency, raw)
}

fn pipeline(pools: Vec<DiscoveredPool>, chain: Arc<ChainState>) -> SwapPipeline {
    pipeline_with(pools, chain, &Config::default())
}

fn pipeline_with(pools: Vec<DiscoveredPool>, chain: Arc<ChainState>, config: &Config) -> SwapPipeline {
    let tokens = tokens();
    let signer = PrivateKeySigner::random();

    SwapPipeline::new(
        PipelineParts {
            discovery: PoolDiscovery::new(vec![Box::new(StaticFinder(pools))], tokens.routing_bases()),
            normalizer: PoolNormalizer::new(tokens),
            search: TradeSearch::new(Arc::new(DoublingQuoter), SearchOptions::from_config(config)),
            gas_oracle: Arc::new(FixedGas),
            authorizer: Authorizer::new(chain.clone(), Arc::new(signer), Arc::new(FixedClock), config),
            submitter: chain,
            clock: Arc::new(FixedClock),
        },
        config,
    )
}

fn native_kgen_cl_pool() -> DiscoveredPool {
    DiscoveredPool::InfinityCl {
        id: B256::repeat_byte(0x11),
        key: RawPoolKey {
            currency0: Address::ZERO,
            currency1: currency("KGEN").address(),
            hooks: Address::ZERO,
            pool_manager: INFINITY_CL_POOL_MANAGER_ADDRESS,
            fee: 2500,
            parameters: B256::ZERO,
        },
        sqrt_price_x96: U256::from(1) << 96,
        tick: 0,
        liquidity: 1_000_000,
        lp_fee: 2500,
        protocol_fee: 0,
    }
}

fn usdt_kgen_v2_pool() -> DiscoveredPool {
    DiscoveredPool::V2 {
        address: Address::repeat_byte(0x22),
        token0: currency("USDT").address(),
        token1: currency("KGEN").address(),
        reserve0: U256::from(10u64).pow(U256::from(24)),
        reserve1: U256::from(10u64).pow(U256::from(14)),
    }
}

fn decode(params: &MethodParameters) -> IUniversalRouter::executeCall {
    IUniversalRouter::executeCall::abi_decode(&params.calldata).unwrap()
}

#[tokio::test]
async fn test_native_input_skips_authorization() {
    let chain = ChainState::with_allowance(U256::ZERO);
    let pipeline = pipeline(vec![native_kgen_cl_pool()], chain.clone());
    let amount = CurrencyAmount::from_raw(currency("BNB"), U256::from(10u64).pow(U256::from(16)));

    let prepared = pipeline
        .prepare(SwapRequest::exact_input(amount.clone(), currency("KGEN")))
        .await
        .unwrap();

    assert_eq!(prepared.authorization.trace, vec![AuthState::NoAction]);
    assert!(prepared.authorization.permit.is_none());
    assert_eq!(prepared.trade.routes.len(), 1);
    assert_eq!(prepared.trade.routes[0].route_type, RouteType::InfinityCl);

    assert_eq!(prepared.params.to, UNIVERSAL_ROUTER_ADDRESS);
    assert_eq!(prepared.params.value, amount.raw);
    let call = decode(&prepared.params);
    assert_eq!(call.commands.to_vec(), vec![0x10]);
    assert_eq!(call.deadline, U256::from(NOW_MS / 1000 + 300));

    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn test_sufficient_allowance_signs_permit_without_approval() {
    let chain = ChainState::with_allowance(U256::MAX);
    let pipeline = pipeline(vec![usdt_kgen_v2_pool()], chain.clone());

    let prepared = pipeline
        .prepare(SwapRequest::exact_input(whole("USDT", 10), currency("KGEN")))
        .await
        .unwrap();

    assert_eq!(
        prepared.authorization.trace,
        vec![AuthState::CheckAllowance, AuthState::SignPermit, AuthState::Ready]
    );
    assert!(prepared.authorization.approval_tx.is_none());
    assert_eq!(chain.calls(), vec!["allowance", "nonce"]);

    let permit = prepared.authorization.permit.as_ref().unwrap();
    assert_eq!(permit.permit.details.nonce.to::<u64>(), 2);

    assert!(prepared.params.value.is_zero());
    let call = decode(&prepared.params);
    // PERMIT2_PERMIT then V2_SWAP_EXACT_IN straight to the sender
    assert_eq!(call.commands.to_vec(), vec![0x0a, 0x08]);
}

#[tokio::test]
async fn test_low_allowance_approves_before_signing() {
    let chain = ChainState::with_allowance(U256::from(5));
    let pipeline = pipeline(vec![usdt_kgen_v2_pool()], chain.clone());

    let prepared = pipeline
        .prepare(SwapRequest::exact_input(whole("USDT", 10), currency("KGEN")))
        .await
        .unwrap();

    assert_eq!(
        prepared.authorization.trace,
        vec![
            AuthState::CheckAllowance,
            AuthState::RaiseApproval,
            AuthState::SignPermit,
            AuthState::Ready
        ]
    );
    assert_eq!(prepared.authorization.approval_tx, Some(TxHash::repeat_byte(0xaa)));

    // max(10 USDT, 500 USDT default), confirmed before the nonce read
    let floor = whole("USDT", 500).raw;
    assert_eq!(
        chain.calls(),
        vec!["allowance".to_string(), format!("approve:{}", floor), "nonce".to_string()]
    );
    let permit = prepared.authorization.permit.as_ref().unwrap();
    assert_eq!(permit.permit.details.nonce.to::<u64>(), 3);
}

#[tokio::test]
async fn test_no_connecting_pool_fails_before_authorization() {
    let chain = ChainState::with_allowance(U256::ZERO);
    let pipeline = pipeline(vec![usdt_kgen_v2_pool()], chain.clone());

    let result = pipeline
        .execute(SwapRequest::exact_input(whole("CAKE", 1), currency("ETH")))
        .await;

    assert!(matches!(result, Err(SwapError::NoRouteFound(_, _))));
    assert!(chain.calls().is_empty());
    assert!(chain.submitted().is_empty());
}

#[tokio::test]
async fn test_execute_submits_prepared_call() {
    let chain = ChainState::with_allowance(U256::MAX);
    let pipeline = pipeline(vec![usdt_kgen_v2_pool()], chain.clone());

    let outcome = pipeline
        .execute(SwapRequest::exact_input(whole("USDT", 10), currency("KGEN")))
        .await
        .unwrap();

    assert_eq!(outcome.receipt.tx_hash, TxHash::repeat_byte(0xbb));
    assert_eq!(chain.submitted(), vec![outcome.prepared.params.clone()]);
    assert_eq!(chain.calls().last().map(String::as_str), Some("submit"));
}

#[tokio::test]
async fn test_unknown_pool_kind_aborts() {
    let chain = ChainState::with_allowance(U256::MAX);
    let unknown = DiscoveredPool::Other {
        kind: "weighted".to_string(),
        id: "0x33".to_string(),
    };
    let pipeline = pipeline(vec![usdt_kgen_v2_pool(), unknown], chain.clone());

    let result = pipeline
        .prepare(SwapRequest::exact_input(whole("USDT", 10), currency("KGEN")))
        .await;

    assert!(matches!(result, Err(SwapError::UnsupportedPoolKind { .. })));
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn test_dry_run_never_sends_approval() {
    let chain = ChainState::with_allowance(U256::from(5));
    let pipeline = pipeline(vec![usdt_kgen_v2_pool()], chain.clone());

    let quoted = pipeline
        .quote(SwapRequest::exact_input(whole("USDT", 10), currency("KGEN")))
        .await
        .unwrap();
    let prepared = pipeline.finalize_dry_run(quoted).await.unwrap();

    assert_eq!(
        prepared.authorization.trace,
        vec![
            AuthState::CheckAllowance,
            AuthState::RaiseApproval,
            AuthState::SignPermit,
            AuthState::Ready
        ]
    );
    assert!(prepared.authorization.approval_tx.is_none());
    assert_eq!(prepared.authorization.skipped_approval, Some(whole("USDT", 500).raw));
    assert_eq!(chain.calls(), vec!["allowance", "nonce"]);
    assert!(chain.calls().iter().all(|call| !call.starts_with("approve")));
    assert_eq!(*chain.allowance.lock().unwrap(), U256::from(5));

    // call data is still built for display
    assert_eq!(decode(&prepared.params).commands.to_vec(), vec![0x0a, 0x08]);
}

#[tokio::test]
async fn test_configured_fee_pays_portion() {
    let chain = ChainState::with_allowance(U256::MAX);
    let config = Config {
        fee_bps: 100,
        fee_recipient: Some(Address::repeat_byte(0xfe)),
        ..Config::default()
    };
    let pipeline = pipeline_with(vec![usdt_kgen_v2_pool()], chain.clone(), &config);

    let options = pipeline.swap_options(None);
    assert_eq!(options.slippage_tolerance.to_bps(), Some(600));

    let prepared = pipeline
        .prepare(SwapRequest::exact_input(whole("USDT", 10), currency("KGEN")))
        .await
        .unwrap();

    let call = decode(&prepared.params);
    // permit, swap into the router, fee portion, sweep the rest
    assert_eq!(call.commands.to_vec(), vec![0x0a, 0x08, 0x06, 0x04]);
    assert_eq!(prepared.options.fee.as_ref().map(|f| f.recipient), Some(Address::repeat_byte(0xfe)));
}

#[tokio::test]
async fn test_unknown_pair_is_pool_not_found() {
    let chain = ChainState::with_allowance(U256::MAX);
    let pipeline = pipeline(Vec::new(), chain.clone());

    let result = pipeline
        .prepare(SwapRequest::exact_input(whole("USDT", 10), currency("KGEN")))
        .await;

    assert!(matches!(result, Err(SwapError::PoolNotFound(_))));
    assert!(chain.calls().is_empty());
}
