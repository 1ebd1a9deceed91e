//! Permit2 authorization for ERC-20 inputs.
//!
//! Native input needs nothing. Token input is checked against the ERC-20
//! allowance granted to Permit2, topped up with an on-chain approval when it
//! falls short, and then covered by an off-chain signed `PermitSingle` that
//! lets the Universal Router pull exactly the swap amount.

use crate::core::abi::{PermitDetails, PermitSingle};
use crate::core::{
    Clock, Config, CurrencyAmount, SwapError, SwapResult, PERMIT_EXPIRATION_MS,
    PERMIT_SIG_EXPIRATION_MS,
};
use crate::utils::parse_amount;
use alloy::primitives::aliases::{U160, U48};
use alloy::primitives::{Address, Signature, TxHash, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::{Eip712Domain, SolStruct};
use log::{debug, info, warn};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Largest amount a Permit2 allowance can carry (`2^160 - 1`).
pub const MAX_ALLOWANCE_TRANSFER_AMOUNT: U160 = U160::MAX;

/// Permit2's per (owner, token, spender) allowance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permit2Allowance {
    pub amount: U256,
    pub expiration: u64,
    pub nonce: u64,
}

/// On-chain allowance reads and the approval write.
#[async_trait::async_trait]
pub trait AllowanceProvider: Send + Sync {
    async fn erc20_allowance(&self, token: Address, owner: Address, spender: Address) -> SwapResult<U256>;

    async fn permit2_allowance(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> SwapResult<Permit2Allowance>;

    /// Send `approve(spender, amount)` and wait for it to be mined.
    async fn approve(&self, token: Address, spender: Address, amount: U256) -> SwapResult<TxHash>;
}

/// Typed-data signing capability bound to one key.
#[async_trait::async_trait]
pub trait PermitSigner: Send + Sync {
    fn address(&self) -> Address;

    async fn sign_permit(&self, permit: &PermitSingle, domain: &Eip712Domain) -> SwapResult<Signature>;
}

#[async_trait::async_trait]
impl PermitSigner for PrivateKeySigner {
    fn address(&self) -> Address {
        alloy::signers::Signer::address(self)
    }

    async fn sign_permit(&self, permit: &PermitSingle, domain: &Eip712Domain) -> SwapResult<Signature> {
        let hash = permit.eip712_signing_hash(domain);
        alloy::signers::Signer::sign_hash(self, &hash)
            .await
            .map_err(|e| SwapError::AuthorizationError(format!("permit signing failed: {}", e)))
    }
}

/// The EIP-712 domain Permit2 verifies signatures against.
pub fn permit2_domain(chain_id: u64, permit2: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed("Permit2")),
        None,
        Some(U256::from(chain_id)),
        Some(permit2),
        None,
    )
}

/// `floor((now + window) / 1000)` in seconds.
pub fn to_deadline(now_ms: u64, window_ms: u64) -> u64 {
    now_ms.saturating_add(window_ms) / 1000
}

/// Build the permit for `spender` to move `amount` of `token`.
///
/// Amounts above [`MAX_ALLOWANCE_TRANSFER_AMOUNT`] cannot be carried by a
/// permit and fail with `MathOverflow`.
pub fn make_permit(
    token: Address,
    spender: Address,
    amount: U256,
    nonce: u64,
    now_ms: u64,
) -> SwapResult<PermitSingle> {
    let amount = <U160 as alloy::primitives::ruint::UintTryFrom<U256>>::uint_try_from(amount).ok().ok_or(SwapError::MathOverflow)?;
    let nonce = U48::try_from(nonce).ok().ok_or(SwapError::MathOverflow)?;
    Ok(PermitSingle {
        details: PermitDetails {
            token,
            amount,
            expiration: U48::saturating_from(to_deadline(now_ms, PERMIT_EXPIRATION_MS)),
            nonce,
        },
        spender,
        sigDeadline: U256::from(to_deadline(now_ms, PERMIT_SIG_EXPIRATION_MS)),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPermit {
    pub permit: PermitSingle,
    pub signature: Signature,
}

impl SignedPermit {
    /// 65-byte `r || s || v` form the router expects.
    pub fn signature_bytes(&self) -> Vec<u8> {
        self.signature.as_bytes().to_vec()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    NoAction,
    CheckAllowance,
    RaiseApproval,
    SignPermit,
    Ready,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthState::NoAction => "NoAction",
            AuthState::CheckAllowance => "CheckAllowance",
            AuthState::RaiseApproval => "RaiseApproval",
            AuthState::SignPermit => "SignPermit",
            AuthState::Ready => "Ready",
        };
        write!(f, "{}", name)
    }
}

/// Whether a short allowance is raised on-chain or only reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApprovalMode {
    #[default]
    Send,
    /// Record `RaiseApproval` but write nothing; used for dry runs.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    /// States visited, in order
    pub trace: Vec<AuthState>,
    pub permit: Option<SignedPermit>,
    pub approval_tx: Option<TxHash>,
    /// Amount an approval needs but was not sent for
    pub skipped_approval: Option<U256>,
}

impl Authorization {
    pub fn final_state(&self) -> AuthState {
        self.trace.last().copied().unwrap_or(AuthState::NoAction)
    }

    pub fn needs_approval(&self) -> bool {
        self.skipped_approval.is_some()
    }
}

pub struct Authorizer {
    allowances: Arc<dyn AllowanceProvider>,
    signer: Arc<dyn PermitSigner>,
    clock: Arc<dyn Clock>,
    chain_id: u64,
    permit2: Address,
    spender: Address,
    approve_amount: String,
}

impl Authorizer {
    pub fn new(
        allowances: Arc<dyn AllowanceProvider>,
        signer: Arc<dyn PermitSigner>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Self {
        Self {
            allowances,
            signer,
            clock,
            chain_id: config.chain_id,
            permit2: config.contracts.permit2,
            spender: config.contracts.universal_router,
            approve_amount: config.default_approve_amount.clone(),
        }
    }

    pub async fn authorize(&self, amount: &CurrencyAmount) -> SwapResult<Authorization> {
        self.authorize_with(amount, ApprovalMode::Send).await
    }

    pub async fn authorize_with(&self, amount: &CurrencyAmount, mode: ApprovalMode) -> SwapResult<Authorization> {
        if amount.currency.is_native() {
            debug!("Native input, no authorization needed");
            return Ok(Authorization {
                trace: vec![AuthState::NoAction],
                permit: None,
                approval_tx: None,
                skipped_approval: None,
            });
        }

        let token = amount.currency.address();
        let owner = self.signer.address();
        let mut trace = vec![AuthState::CheckAllowance];
        let mut approval_tx = None;
        let mut skipped_approval = None;

        let current = self.allowances.erc20_allowance(token, owner, self.permit2).await?;
        debug!("{} allowance to Permit2: {}", amount.currency, current);

        if current < amount.raw {
            trace.push(AuthState::RaiseApproval);
            let floor = parse_amount(&self.approve_amount, amount.currency.decimals())?;
            let approve = amount.raw.max(floor);
            match mode {
                ApprovalMode::Skip => {
                    warn!(
                        "Allowance {} is below swap amount {}, approval of {} {} not sent",
                        current, amount.raw, approve, amount.currency
                    );
                    skipped_approval = Some(approve);
                }
                ApprovalMode::Send => {
                    info!(
                        "Allowance {} is below swap amount {}, approving {} {} for Permit2",
                        current, amount.raw, approve, amount.currency
                    );
                    let hash = self
                        .allowances
                        .approve(token, self.permit2, approve)
                        .await
                        .map_err(|e| match e {
                            SwapError::TransactionPending(_) | SwapError::AuthorizationError(_) => e,
                            other => SwapError::AuthorizationError(format!("approval failed: {}", other)),
                        })?;
                    info!("Approval confirmed: {}", hash);
                    approval_tx = Some(hash);
                }
            }
        }

        trace.push(AuthState::SignPermit);
        // nonce must reflect any state the approval changed
        let record = self
            .allowances
            .permit2_allowance(owner, token, self.spender)
            .await?;
        let permit = make_permit(token, self.spender, amount.raw, record.nonce, self.clock.now_millis())?;
        let domain = permit2_domain(self.chain_id, self.permit2);
        let signature = self.signer.sign_permit(&permit, &domain).await?;
        debug!("Signed permit with nonce {}", record.nonce);

        trace.push(AuthState::Ready);
        Ok(Authorization {
            trace,
            permit: Some(SignedPermit { permit, signature }),
            approval_tx,
            skipped_approval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Currency, TokenRegistry};
    use std::sync::Mutex;

    const NOW_MS: u64 = 1_700_000_000_123;

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now_millis(&self) -> u64 {
            self.0
        }
    }

    #[derive(Default)]
    struct MockAllowances {
        erc20: Mutex<U256>,
        nonce: Mutex<u64>,
        calls: Mutex<Vec<String>>,
        fail_approve: bool,
    }

    impl MockAllowances {
        fn with_allowance(allowance: U256) -> Self {
            let mock = Self::default();
            *mock.erc20.lock().unwrap() = allowance;
            *mock.nonce.lock().unwrap() = 4;
            mock
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl AllowanceProvider for MockAllowances {
        async fn erc20_allowance(&self, _token: Address, _owner: Address, _spender: Address) -> SwapResult<U256> {
            self.calls.lock().unwrap().push("erc20_allowance".to_string());
            Ok(*self.erc20.lock().unwrap())
        }

        async fn permit2_allowance(
            &self,
            _owner: Address,
            _token: Address,
            _spender: Address,
        ) -> SwapResult<Permit2Allowance> {
            self.calls.lock().unwrap().push("permit2_allowance".to_string());
            Ok(Permit2Allowance {
                nonce: *self.nonce.lock().unwrap(),
                ..Default::default()
            })
        }

        async fn approve(&self, _token: Address, _spender: Address, amount: U256) -> SwapResult<TxHash> {
            self.calls.lock().unwrap().push(format!("approve:{}", amount));
            if self.fail_approve {
                return Err(SwapError::TransactionFailed("reverted".to_string()));
            }
            *self.erc20.lock().unwrap() = amount;
            // approval mined, nonce is what the chain now reports
            *self.nonce.lock().unwrap() += 1;
            Ok(TxHash::repeat_byte(0xaa))
        }
    }

    fn authorizer(allowances: Arc<MockAllowances>, signer: Arc<PrivateKeySigner>) -> Authorizer {
        Authorizer::new(allowances, signer, Arc::new(FixedClock(NOW_MS)), &Config::default())
    }

    fn usdt(amount: u64) -> CurrencyAmount {
        let usdt = TokenRegistry::bsc().resolve("USDT").unwrap();
        CurrencyAmount::from_raw(usdt, U256::from(amount) * U256::from(10u64).pow(U256::from(18)))
    }

    #[test]
    fn test_permit_windows() {
        let permit =
            make_permit(Address::repeat_byte(1), Address::repeat_byte(2), U256::from(10), 3, NOW_MS).unwrap();
        let expiration = (NOW_MS + PERMIT_EXPIRATION_MS) / 1000;
        let deadline = (NOW_MS + PERMIT_SIG_EXPIRATION_MS) / 1000;

        assert_eq!(permit.details.expiration, U48::from(expiration));
        assert_eq!(permit.sigDeadline, U256::from(deadline));
        assert!(U256::from(deadline) <= U256::from(expiration));
        assert_eq!(permit.details.nonce, U48::from(3u64));
        assert_eq!(permit.details.amount, U160::from(10u64));
        assert_eq!(permit.spender, Address::repeat_byte(2));
    }

    #[test]
    fn test_permit_amount_limit() {
        let max = U256::from(MAX_ALLOWANCE_TRANSFER_AMOUNT);
        let permit = make_permit(Address::ZERO, Address::ZERO, max, 0, NOW_MS).unwrap();
        assert_eq!(permit.details.amount, MAX_ALLOWANCE_TRANSFER_AMOUNT);

        // one wei more must not be silently shrunk below the trade input
        let result = make_permit(Address::ZERO, Address::ZERO, max + U256::from(1), 0, NOW_MS);
        assert!(matches!(result, Err(SwapError::MathOverflow)));
    }

    #[tokio::test]
    async fn test_signature_recovers_signer() {
        let signer = PrivateKeySigner::random();
        let permit =
            make_permit(Address::repeat_byte(1), Address::repeat_byte(2), U256::from(10), 0, NOW_MS).unwrap();
        let domain = permit2_domain(56, Address::repeat_byte(3));

        let signature = signer.sign_permit(&permit, &domain).await.unwrap();
        let recovered = signature
            .recover_address_from_prehash(&permit.eip712_signing_hash(&domain))
            .unwrap();

        assert_eq!(recovered, signer.address());
        assert_eq!(signature.as_bytes().len(), 65);
    }

    #[tokio::test]
    async fn test_native_input_needs_nothing() {
        let allowances = Arc::new(MockAllowances::default());
        let auth = authorizer(allowances.clone(), Arc::new(PrivateKeySigner::random()));

        let amount = CurrencyAmount::from_raw(Currency::native(56), U256::from(1));
        let result = auth.authorize(&amount).await.unwrap();

        assert_eq!(result.trace, vec![AuthState::NoAction]);
        assert!(result.permit.is_none());
        assert!(allowances.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sufficient_allowance_goes_straight_to_permit() {
        let amount = usdt(10);
        let allowances = Arc::new(MockAllowances::with_allowance(amount.raw));
        let auth = authorizer(allowances.clone(), Arc::new(PrivateKeySigner::random()));

        let result = auth.authorize(&amount).await.unwrap();

        assert_eq!(
            result.trace,
            vec![AuthState::CheckAllowance, AuthState::SignPermit, AuthState::Ready]
        );
        assert!(result.approval_tx.is_none());
        assert_eq!(allowances.calls(), vec!["erc20_allowance", "permit2_allowance"]);

        let permit = result.permit.unwrap().permit;
        assert_eq!(permit.spender, Config::default().contracts.universal_router);
        assert_eq!(U256::from(permit.details.amount), amount.raw);
        assert_eq!(permit.details.nonce, U48::from(4u64));
    }

    #[tokio::test]
    async fn test_low_allowance_approves_default_floor_before_signing() {
        let amount = usdt(10);
        let allowances = Arc::new(MockAllowances::with_allowance(U256::from(1)));
        let auth = authorizer(allowances.clone(), Arc::new(PrivateKeySigner::random()));

        let result = auth.authorize(&amount).await.unwrap();

        assert_eq!(
            result.trace,
            vec![
                AuthState::CheckAllowance,
                AuthState::RaiseApproval,
                AuthState::SignPermit,
                AuthState::Ready
            ]
        );
        let floor = usdt(500).raw;
        assert_eq!(
            allowances.calls(),
            vec![
                "erc20_allowance".to_string(),
                format!("approve:{}", floor),
                "permit2_allowance".to_string()
            ]
        );
        // nonce read after the approval landed
        assert_eq!(result.permit.unwrap().permit.details.nonce, U48::from(5u64));
    }

    #[tokio::test]
    async fn test_large_swap_approves_swap_amount() {
        let amount = usdt(2_000);
        let allowances = Arc::new(MockAllowances::with_allowance(U256::ZERO));
        let auth = authorizer(allowances.clone(), Arc::new(PrivateKeySigner::random()));

        auth.authorize(&amount).await.unwrap();
        assert!(allowances.calls().contains(&format!("approve:{}", amount.raw)));
    }

    #[tokio::test]
    async fn test_failed_approval_is_authorization_error() {
        let allowances = Arc::new(MockAllowances {
            fail_approve: true,
            ..Default::default()
        });
        let auth = authorizer(allowances.clone(), Arc::new(PrivateKeySigner::random()));

        let result = auth.authorize(&usdt(1)).await;
        assert!(matches!(result, Err(SwapError::AuthorizationError(_))));
        // aborted before any permit was built
        assert!(!allowances.calls().contains(&"permit2_allowance".to_string()));
    }

    #[tokio::test]
    async fn test_skip_mode_records_approval_without_sending() {
        let amount = usdt(10);
        let allowances = Arc::new(MockAllowances::with_allowance(U256::from(1)));
        let auth = authorizer(allowances.clone(), Arc::new(PrivateKeySigner::random()));

        let result = auth.authorize_with(&amount, ApprovalMode::Skip).await.unwrap();

        assert_eq!(
            result.trace,
            vec![
                AuthState::CheckAllowance,
                AuthState::RaiseApproval,
                AuthState::SignPermit,
                AuthState::Ready
            ]
        );
        assert!(result.needs_approval());
        assert_eq!(result.skipped_approval, Some(usdt(500).raw));
        assert!(result.approval_tx.is_none());
        assert_eq!(allowances.calls(), vec!["erc20_allowance", "permit2_allowance"]);
        // nothing changed on chain, so the current nonce is used
        assert_eq!(result.permit.unwrap().permit.details.nonce, U48::from(4u64));
    }
}
