//! # Vault Hooks
//!
//! Ready-made [`VaultHooks`] implementations:
//!
//! - [`HookRecorder`] — remembers every invocation and the totals it saw.
//! - [`MinimumPosition`] — keeps every non-zero position above a floor.
//! - [`HookChain`] — runs several hooks in order.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use cistern_protocol::{AccountId, HookError, Totals, Vault, VaultHooks};

// ---------------------------------------------------------------------------
// HookRecorder
// ---------------------------------------------------------------------------

/// Which hook fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    /// After shares were minted.
    AfterDeposit,
    /// Before shares are burned.
    BeforeWithdraw,
}

/// One recorded hook invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookCall {
    /// Which hook fired.
    pub point: HookPoint,
    /// The receiver (deposit) or owner (withdraw).
    pub account: AccountId,
    /// Assets passed to the hook.
    pub assets: u64,
    /// Shares passed to the hook.
    pub shares: u64,
    /// Vault totals at the moment the hook ran.
    pub observed: Totals,
}

/// Records every hook invocation. Never rejects.
#[derive(Debug, Default)]
pub struct HookRecorder {
    calls: Mutex<Vec<HookCall>>,
}

impl HookRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every invocation so far, oldest first.
    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.lock().clone()
    }

    /// The most recent invocation.
    pub fn last(&self) -> Option<HookCall> {
        self.calls.lock().last().cloned()
    }

    fn record(
        &self,
        point: HookPoint,
        vault: &Vault,
        account: &AccountId,
        assets: u64,
        shares: u64,
    ) -> Result<(), HookError> {
        let observed = vault
            .totals()
            .map_err(|e| HookError::new(format!("cannot read totals: {}", e)))?;
        self.calls.lock().push(HookCall {
            point,
            account: account.clone(),
            assets,
            shares,
            observed,
        });
        Ok(())
    }
}

impl VaultHooks for HookRecorder {
    fn after_deposit(
        &self,
        vault: &Vault,
        receiver: &AccountId,
        assets: u64,
        shares: u64,
    ) -> Result<(), HookError> {
        self.record(HookPoint::AfterDeposit, vault, receiver, assets, shares)
    }

    fn before_withdraw(
        &self,
        vault: &Vault,
        owner: &AccountId,
        assets: u64,
        shares: u64,
    ) -> Result<(), HookError> {
        self.record(HookPoint::BeforeWithdraw, vault, owner, assets, shares)
    }
}

// ---------------------------------------------------------------------------
// MinimumPosition
// ---------------------------------------------------------------------------

/// Rejects settlements that would leave an account holding a non-zero
/// share position below `minimum`. Exiting completely is always allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimumPosition {
    /// Smallest non-zero share position.
    pub minimum: u64,
}

impl MinimumPosition {
    /// Creates the hook.
    pub fn new(minimum: u64) -> Self {
        Self { minimum }
    }

    fn check(&self, account: &AccountId, remaining: u64) -> Result<(), HookError> {
        if remaining != 0 && remaining < self.minimum {
            debug!(%account, remaining, minimum = self.minimum, "position below minimum");
            return Err(HookError::new(format!(
                "{} would hold {} shares, minimum position is {}",
                account, remaining, self.minimum
            )));
        }
        Ok(())
    }
}

impl VaultHooks for MinimumPosition {
    fn after_deposit(
        &self,
        vault: &Vault,
        receiver: &AccountId,
        _assets: u64,
        _shares: u64,
    ) -> Result<(), HookError> {
        // Shares are already minted here.
        self.check(receiver, vault.share_balance(receiver))
    }

    fn before_withdraw(
        &self,
        vault: &Vault,
        owner: &AccountId,
        _assets: u64,
        shares: u64,
    ) -> Result<(), HookError> {
        let remaining = vault.share_balance(owner).saturating_sub(shares);
        self.check(owner, remaining)
    }
}

// ---------------------------------------------------------------------------
// HookChain
// ---------------------------------------------------------------------------

/// Runs hooks in insertion order, stopping at the first rejection.
#[derive(Default, Clone)]
pub struct HookChain {
    hooks: Vec<Arc<dyn VaultHooks>>,
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookChain")
            .field("len", &self.hooks.len())
            .finish()
    }
}

impl HookChain {
    /// An empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook.
    pub fn with(mut self, hook: Arc<dyn VaultHooks>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Number of hooks in the chain.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// `true` if the chain has no hooks.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl VaultHooks for HookChain {
    fn after_deposit(
        &self,
        vault: &Vault,
        receiver: &AccountId,
        assets: u64,
        shares: u64,
    ) -> Result<(), HookError> {
        self.hooks
            .iter()
            .try_for_each(|h| h.after_deposit(vault, receiver, assets, shares))
    }

    fn before_withdraw(
        &self,
        vault: &Vault,
        owner: &AccountId,
        assets: u64,
        shares: u64,
    ) -> Result<(), HookError> {
        self.hooks
            .iter()
            .try_for_each(|h| h.before_withdraw(vault, owner, assets, shares))
    }
}

#[cfg(test)]
mod tests {
    use cistern_protocol::{ShareRegistry, VaultBuilder, VaultConfig, VaultError};

    use super::*;
    use crate::asset_token::AssetToken;

    fn setup(hooks: Arc<dyn VaultHooks>) -> (Vault, Arc<AssetToken>) {
        let token = Arc::new(AssetToken::create("Dollar", "USD", 6, "issuer").unwrap());
        let vault = VaultBuilder::new(
            VaultConfig::new("Hooked", "hk", "vault"),
            token.clone(),
            Arc::new(ShareRegistry::new()),
        )
        .hooks(hooks)
        .build()
        .unwrap();
        (vault, token)
    }

    fn fund(vault: &Vault, token: &AssetToken, who: &AccountId, amount: u64) {
        token.mint(&"issuer".into(), who, amount).unwrap();
        token.approve(who, vault.custody(), amount);
    }

    #[test]
    fn recorder_sees_post_mint_and_pre_burn_totals() {
        let recorder = Arc::new(HookRecorder::new());
        let (vault, token) = setup(recorder.clone());
        let alice = AccountId::from("alice");
        fund(&vault, &token, &alice, 1_000);

        vault.deposit(&alice, 1_000, &alice).unwrap();
        vault.withdraw(&alice, 250, &alice, &alice).unwrap();

        let calls = recorder.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].point, HookPoint::AfterDeposit);
        assert_eq!(calls[0].observed, Totals::new(1_000, 1_000));
        assert_eq!(calls[1].point, HookPoint::BeforeWithdraw);
        assert_eq!(calls[1].observed, Totals::new(1_000, 1_000));
        assert_eq!((calls[1].assets, calls[1].shares), (250, 250));
    }

    #[test]
    fn minimum_position_blocks_dust_positions() {
        let (vault, token) = setup(Arc::new(MinimumPosition::new(100)));
        let alice = AccountId::from("alice");
        fund(&vault, &token, &alice, 1_000);

        assert!(matches!(
            vault.deposit(&alice, 50, &alice),
            Err(VaultError::HookRejected(_))
        ));
        assert_eq!(token.balance_of(&alice), 1_000);

        vault.deposit(&alice, 150, &alice).unwrap();
        assert!(matches!(
            vault.redeem(&alice, 100, &alice, &alice),
            Err(VaultError::HookRejected(_))
        ));
        assert_eq!(vault.share_balance(&alice), 150);

        // Leaving entirely is fine.
        assert_eq!(vault.redeem(&alice, 150, &alice, &alice), Ok(150));
    }

    #[test]
    fn chain_stops_at_first_rejection() {
        let recorder = Arc::new(HookRecorder::new());
        let chain = HookChain::new()
            .with(Arc::new(MinimumPosition::new(100)))
            .with(recorder.clone());
        assert_eq!(chain.len(), 2);
        let (vault, token) = setup(Arc::new(chain));
        let alice = AccountId::from("alice");
        fund(&vault, &token, &alice, 1_000);

        assert!(vault.deposit(&alice, 10, &alice).is_err());
        assert!(recorder.calls().is_empty());

        vault.deposit(&alice, 500, &alice).unwrap();
        assert_eq!(recorder.last().map(|c| c.shares), Some(500));
    }

    #[test]
    fn hook_calls_serialize_for_reports() {
        let call = HookCall {
            point: HookPoint::BeforeWithdraw,
            account: "alice".into(),
            assets: 10,
            shares: 7,
            observed: Totals::new(150, 100),
        };
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["point"], "before_withdraw");
        assert_eq!(json["account"], "alice");
        assert_eq!(json["observed"]["shares"], 100);
    }

    #[test]
    fn empty_chain_is_a_noop() {
        let chain = HookChain::new();
        assert!(chain.is_empty());
        let (vault, token) = setup(Arc::new(chain));
        let alice = AccountId::from("alice");
        fund(&vault, &token, &alice, 10);
        assert_eq!(vault.deposit(&alice, 10, &alice), Ok(10));
    }
}
