//! # Vault Module — Pooled Custody & Share Accounting
//!
//! The vault is where the pool lives. It holds no balances of its own: the
//! asset sits in a custody account on the [`AssetLedger`], claims on it are
//! shares on the [`ShareLedger`], and the vault is the only party that
//! moves either in a settlement.
//!
//! ## Architecture
//!
//! ```text
//! mod.rs      — Vault, VaultBuilder, queries and previews
//! flows.rs    — deposit, mint, withdraw, redeem
//! journal.rs  — applied-effect journal and compensation
//! guard.rs    — re-entrancy guard
//! ```
//!
//! ## Design Principles
//!
//! 1. **Rates are derived, never stored.** Every conversion reads the two
//!    totals fresh. Accruals to custody raise the rate immediately.
//!
//! 2. **Rounding always favours the pool.** Callers that receive round down,
//!    callers that pay round up.
//!
//! 3. **One flow at a time.** Mutating flows hold the re-entrancy guard for
//!    their full duration. Queries made from inside a flow (by a hook or a
//!    ledger) are answered; a nested flow is rejected.
//!
//! 4. **All or nothing.** Validation happens before the first effect. Any
//!    effect applied before a later failure is compensated.

mod flows;
mod guard;
mod journal;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::VaultConfig;
use crate::conversion::{self, Rounding, Totals};
use crate::error::VaultError;
use crate::events::{EventSink, TracingSink};
use crate::hooks::{NoopHooks, VaultHooks};
use crate::ledger::{AssetLedger, ShareLedger};
use crate::policy::{UnboundedPolicy, VaultPolicy};
use crate::types::{AccountId, AssetId};

use guard::ReentrancyGuard;

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// A pooled-asset vault over one underlying asset.
pub struct Vault {
    name: String,
    symbol: String,
    decimals: u8,
    asset_id: AssetId,
    custody: AccountId,
    asset: Arc<dyn AssetLedger>,
    shares: Arc<dyn ShareLedger>,
    hooks: Arc<dyn VaultHooks>,
    policy: Arc<dyn VaultPolicy>,
    events: Arc<dyn EventSink>,
    guard: ReentrancyGuard,
}

impl fmt::Debug for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault")
            .field("name", &self.name)
            .field("symbol", &self.symbol)
            .field("decimals", &self.decimals)
            .field("asset", &self.asset_id)
            .field("custody", &self.custody)
            .finish_non_exhaustive()
    }
}

impl Vault {
    /// Starts building a vault over `asset`, issuing shares on `shares`.
    pub fn builder(
        config: VaultConfig,
        asset: Arc<dyn AssetLedger>,
        shares: Arc<dyn ShareLedger>,
    ) -> VaultBuilder {
        VaultBuilder::new(config, asset, shares)
    }

    // -- identity ----------------------------------------------------------

    /// Identifier of the underlying asset.
    pub fn asset(&self) -> &AssetId {
        &self.asset_id
    }

    /// Share-token name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Share-token symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Share decimals.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// The vault's custody account on the asset ledger.
    pub fn custody(&self) -> &AccountId {
        &self.custody
    }

    pub(crate) fn asset_ledger(&self) -> &dyn AssetLedger {
        self.asset.as_ref()
    }

    pub(crate) fn share_ledger(&self) -> &dyn ShareLedger {
        self.shares.as_ref()
    }

    // -- totals ------------------------------------------------------------

    /// Underlying assets attributed to the pool, as reported by the policy.
    pub fn total_assets(&self) -> Result<u64, VaultError> {
        let _held = self.guard.observe();
        let custody_balance = self.asset.balance_of(&self.custody);
        self.policy.total_assets(custody_balance)
    }

    /// Shares outstanding.
    pub fn total_shares(&self) -> u64 {
        let _held = self.guard.observe();
        self.shares.total_supply()
    }

    /// Both totals, read together.
    pub fn totals(&self) -> Result<Totals, VaultError> {
        let _held = self.guard.observe();
        Ok(Totals::new(self.total_assets()?, self.total_shares()))
    }

    /// Shares held by `account`.
    pub fn share_balance(&self, account: &AccountId) -> u64 {
        let _held = self.guard.observe();
        self.shares.balance_of(account)
    }

    /// Shares `spender` may withdraw or redeem on behalf of `owner`.
    pub fn share_allowance(&self, owner: &AccountId, spender: &AccountId) -> u64 {
        let _held = self.guard.observe();
        self.shares.allowance(owner, spender)
    }

    // -- conversions -------------------------------------------------------

    /// Shares `assets` is worth at the current rate, rounded down.
    pub fn convert_to_shares(&self, assets: u64) -> Result<u64, VaultError> {
        self.shares_for(assets, Rounding::Down)
    }

    /// Assets `shares` is worth at the current rate, rounded down.
    pub fn convert_to_assets(&self, shares: u64) -> Result<u64, VaultError> {
        self.assets_for(shares, Rounding::Down)
    }

    fn shares_for(&self, assets: u64, rounding: Rounding) -> Result<u64, VaultError> {
        let totals = self.totals()?;
        Ok(conversion::shares_for_assets(assets, totals, rounding)?)
    }

    fn assets_for(&self, shares: u64, rounding: Rounding) -> Result<u64, VaultError> {
        let totals = self.totals()?;
        Ok(conversion::assets_for_shares(shares, totals, rounding)?)
    }

    // -- ceilings ----------------------------------------------------------

    /// Most assets `receiver` may deposit right now.
    pub fn max_deposit(&self, receiver: &AccountId) -> Result<u64, VaultError> {
        let _held = self.guard.observe();
        self.policy.max_deposit(self, receiver)
    }

    /// Most shares `receiver` may mint right now.
    pub fn max_mint(&self, receiver: &AccountId) -> Result<u64, VaultError> {
        let _held = self.guard.observe();
        self.policy.max_mint(self, receiver)
    }

    /// Most assets `owner` may withdraw right now.
    pub fn max_withdraw(&self, owner: &AccountId) -> Result<u64, VaultError> {
        let _held = self.guard.observe();
        self.policy.max_withdraw(self, owner)
    }

    /// Most shares `owner` may redeem right now.
    pub fn max_redeem(&self, owner: &AccountId) -> Result<u64, VaultError> {
        let _held = self.guard.observe();
        self.policy.max_redeem(self, owner)
    }

    // -- previews ----------------------------------------------------------

    /// Shares a deposit of `assets` would mint now.
    pub fn preview_deposit(&self, assets: u64) -> Result<u64, VaultError> {
        self.shares_for(assets, Rounding::Down)
    }

    /// Assets a mint of `shares` would cost now.
    pub fn preview_mint(&self, shares: u64) -> Result<u64, VaultError> {
        self.assets_for(shares, Rounding::Up)
    }

    /// Shares a withdrawal of `assets` would burn now.
    pub fn preview_withdraw(&self, assets: u64) -> Result<u64, VaultError> {
        self.shares_for(assets, Rounding::Up)
    }

    /// Assets a redemption of `shares` would pay out now.
    pub fn preview_redeem(&self, shares: u64) -> Result<u64, VaultError> {
        self.assets_for(shares, Rounding::Down)
    }
}

// ---------------------------------------------------------------------------
// VaultBuilder
// ---------------------------------------------------------------------------

/// Assembles a [`Vault`] from its configuration and collaborators.
///
/// Hooks, policy, and event sink are optional and default to
/// [`NoopHooks`], [`UnboundedPolicy`], and [`TracingSink`].
pub struct VaultBuilder {
    config: VaultConfig,
    asset: Arc<dyn AssetLedger>,
    shares: Arc<dyn ShareLedger>,
    hooks: Arc<dyn VaultHooks>,
    policy: Arc<dyn VaultPolicy>,
    events: Arc<dyn EventSink>,
}

impl VaultBuilder {
    /// Starts a builder with the default hooks, policy, and sink.
    pub fn new(
        config: VaultConfig,
        asset: Arc<dyn AssetLedger>,
        shares: Arc<dyn ShareLedger>,
    ) -> Self {
        Self {
            config,
            asset,
            shares,
            hooks: Arc::new(NoopHooks),
            policy: Arc::new(UnboundedPolicy),
            events: Arc::new(TracingSink),
        }
    }

    /// Installs the hooks invoked inside the flows.
    pub fn hooks(mut self, hooks: Arc<dyn VaultHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Installs the total-assets and ceiling policy.
    pub fn policy(mut self, policy: Arc<dyn VaultPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Installs the sink settlements are emitted into.
    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Validates the configuration and builds the vault.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] if the configuration is invalid.
    pub fn build(self) -> Result<Vault, VaultError> {
        self.config.validate()?;
        let asset_id = self.asset.asset_id();
        let decimals = self.config.resolve_decimals(self.asset.decimals());

        debug!(
            name = %self.config.name,
            symbol = %self.config.symbol,
            asset = %asset_id,
            custody = %self.config.custody_account,
            decimals,
            "vault constructed"
        );

        Ok(Vault {
            name: self.config.name,
            symbol: self.config.symbol,
            decimals,
            asset_id,
            custody: self.config.custody_account,
            asset: self.asset,
            shares: self.shares,
            hooks: self.hooks,
            policy: self.policy,
            events: self.events,
            guard: ReentrancyGuard::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{Fixture, CUSTODY};

    #[test]
    fn identity_comes_from_config_and_asset() {
        let fx = Fixture::new();
        assert_eq!(fx.vault.name(), "Test Vault");
        assert_eq!(fx.vault.symbol(), "tVLT");
        assert_eq!(fx.vault.decimals(), 6);
        assert_eq!(fx.vault.asset().as_str(), "test-asset");
        assert_eq!(fx.vault.custody().as_str(), CUSTODY);
    }

    #[test]
    fn decimals_override_wins() {
        let fx = Fixture::with_config(
            VaultConfig::new("Test Vault", "tVLT", CUSTODY).with_decimals(9),
        );
        assert_eq!(fx.vault.decimals(), 9);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let fx = Fixture::new();
        let result = Vault::builder(
            VaultConfig::new("", "tVLT", CUSTODY),
            fx.asset.clone(),
            fx.shares.clone(),
        )
        .build();
        assert!(matches!(result, Err(VaultError::InvalidConfig(_))));
    }

    #[test]
    fn total_assets_tracks_custody_balance() {
        let fx = Fixture::new();
        assert_eq!(fx.vault.total_assets().unwrap(), 0);
        fx.asset.fund(CUSTODY, 500);
        assert_eq!(fx.vault.total_assets().unwrap(), 500);
    }

    #[test]
    fn bootstrap_previews_are_one_to_one() {
        let fx = Fixture::new();
        assert_eq!(fx.vault.preview_deposit(1_000).unwrap(), 1_000);
        assert_eq!(fx.vault.preview_mint(1_000).unwrap(), 1_000);
        assert_eq!(fx.vault.preview_withdraw(1_000).unwrap(), 1_000);
        assert_eq!(fx.vault.preview_redeem(1_000).unwrap(), 1_000);
        assert_eq!(fx.vault.convert_to_shares(7).unwrap(), 7);
        assert_eq!(fx.vault.convert_to_assets(7).unwrap(), 7);
    }

    #[test]
    fn previews_round_against_the_caller() {
        // 1000 shares against 1500 assets.
        let fx = Fixture::seeded(1_000, 1_500);
        assert_eq!(fx.vault.preview_deposit(100).unwrap(), 66);
        assert_eq!(fx.vault.preview_withdraw(100).unwrap(), 67);
        assert_eq!(fx.vault.preview_mint(1).unwrap(), 2);
        assert_eq!(fx.vault.preview_redeem(1).unwrap(), 1);
        assert_eq!(fx.vault.convert_to_shares(150).unwrap(), 100);
        assert_eq!(fx.vault.convert_to_assets(100).unwrap(), 150);
    }

    #[test]
    fn default_ceilings_are_unbounded() {
        let fx = Fixture::new();
        let who = AccountId::from("alice");
        assert_eq!(fx.vault.max_deposit(&who).unwrap(), u64::MAX);
        assert_eq!(fx.vault.max_mint(&who).unwrap(), u64::MAX);
        assert_eq!(fx.vault.max_withdraw(&who).unwrap(), u64::MAX);
        assert_eq!(fx.vault.max_redeem(&who).unwrap(), u64::MAX);
    }

    #[test]
    fn empty_custody_with_outstanding_shares() {
        let fx = Fixture::seeded(1_000, 0);
        assert_eq!(fx.vault.preview_deposit(10).unwrap(), 10);
        assert_eq!(fx.vault.preview_withdraw(10).unwrap(), 10);
        assert_eq!(fx.vault.preview_mint(10).unwrap(), 0);
        assert_eq!(fx.vault.preview_redeem(10).unwrap(), 0);
        assert_eq!(fx.vault.convert_to_shares(10).unwrap(), 10);
        assert_eq!(fx.vault.convert_to_assets(10).unwrap(), 0);
    }

    #[test]
    fn debug_output_omits_collaborators() {
        let fx = Fixture::new();
        let rendered = format!("{:?}", fx.vault);
        assert!(rendered.contains("tVLT"));
        assert!(rendered.contains(".."));
    }
}
