//! Test doubles shared by the unit tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::VaultConfig;
use crate::events::EventLog;
use crate::ledger::{AssetLedger, LedgerError, ShareLedger, ShareRegistry};
use crate::types::{AccountId, AssetId, Instrument};
use crate::vault::{Vault, VaultBuilder};

pub(crate) const CUSTODY: &str = "vault:custody";

/// A minimal in-memory asset ledger with 6 decimals.
#[derive(Default)]
pub(crate) struct TestAsset {
    balances: RwLock<BTreeMap<AccountId, u64>>,
    allowances: RwLock<BTreeMap<(AccountId, AccountId), u64>>,
}

impl TestAsset {
    pub(crate) fn fund(&self, account: &str, amount: u64) {
        *self.balances.write().entry(account.into()).or_default() += amount;
    }

    pub(crate) fn approve(&self, owner: &str, spender: &str, amount: u64) {
        self.allowances
            .write()
            .insert((owner.into(), spender.into()), amount);
    }

    pub(crate) fn balance(&self, account: &str) -> u64 {
        self.balance_of(&account.into())
    }

    fn debit(&self, from: &AccountId, amount: u64) -> Result<(), LedgerError> {
        let mut balances = self.balances.write();
        let balance = balances.get(from).copied().unwrap_or(0);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                instrument: Instrument::Asset,
                account: from.clone(),
                balance,
                required: amount,
            });
        }
        balances.insert(from.clone(), balance - amount);
        Ok(())
    }
}

impl AssetLedger for TestAsset {
    fn asset_id(&self) -> AssetId {
        AssetId::new("test-asset")
    }

    fn decimals(&self) -> u8 {
        6
    }

    fn balance_of(&self, account: &AccountId) -> u64 {
        self.balances.read().get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64 {
        self.allowances
            .read()
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(&self, from: &AccountId, to: &AccountId, amount: u64) -> Result<(), LedgerError> {
        self.debit(from, amount)?;
        *self.balances.write().entry(to.clone()).or_default() += amount;
        Ok(())
    }

    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let allowance = self.allowance(from, spender);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance {
                instrument: Instrument::Asset,
                owner: from.clone(),
                spender: spender.clone(),
                allowance,
                required: amount,
            });
        }
        self.transfer(from, to, amount)?;
        self.allowances
            .write()
            .insert((from.clone(), spender.clone()), allowance - amount);
        Ok(())
    }
}

/// A vault wired to in-memory ledgers and an event log.
pub(crate) struct Fixture {
    pub(crate) vault: Vault,
    pub(crate) asset: Arc<TestAsset>,
    pub(crate) shares: Arc<ShareRegistry>,
    pub(crate) events: Arc<EventLog>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::build(|b| b)
    }

    pub(crate) fn with_config(config: VaultConfig) -> Self {
        Self::assemble(config, |b| b)
    }

    pub(crate) fn build(customize: impl FnOnce(VaultBuilder) -> VaultBuilder) -> Self {
        Self::assemble(VaultConfig::new("Test Vault", "tVLT", CUSTODY), customize)
    }

    /// `shares` held by "seed" against `assets` in custody.
    pub(crate) fn seeded(shares: u64, assets: u64) -> Self {
        let fx = Self::new();
        if shares > 0 {
            fx.shares
                .mint(&"seed".into(), shares)
                .expect("seed mint");
        }
        fx.asset.fund(CUSTODY, assets);
        fx
    }

    fn assemble(
        config: VaultConfig,
        customize: impl FnOnce(VaultBuilder) -> VaultBuilder,
    ) -> Self {
        let asset = Arc::new(TestAsset::default());
        let shares = Arc::new(ShareRegistry::new());
        let events = Arc::new(EventLog::new());
        let builder = Vault::builder(config, asset.clone(), shares.clone()).events(events.clone());
        let vault = customize(builder).build().expect("fixture vault");
        Self {
            vault,
            asset,
            shares,
            events,
        }
    }
}
