//! # Managed Assets Policy
//!
//! For vaults whose pool is partly deployed elsewhere. The manager reports
//! how much is deployed, and total assets becomes custody plus that amount,
//! so the rate reflects the whole pool. Only the custody balance can be paid
//! out, which caps withdrawals and redemptions at what is liquid.
//!
//! Deposit ceilings are delegated to an inner policy.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use cistern_protocol::{AccountId, UnboundedPolicy, Vault, VaultError, VaultPolicy};

/// Adds an externally reported amount to the custody balance.
pub struct ManagedAssets {
    deployed: RwLock<u64>,
    inner: Arc<dyn VaultPolicy>,
}

impl std::fmt::Debug for ManagedAssets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedAssets")
            .field("deployed", &*self.deployed.read())
            .finish_non_exhaustive()
    }
}

impl Default for ManagedAssets {
    fn default() -> Self {
        Self::new()
    }
}

impl ManagedAssets {
    /// Nothing deployed, no deposit ceilings.
    pub fn new() -> Self {
        Self::over(Arc::new(UnboundedPolicy))
    }

    /// Nothing deployed, deposit ceilings from `inner`.
    pub fn over(inner: Arc<dyn VaultPolicy>) -> Self {
        Self {
            deployed: RwLock::new(0),
            inner,
        }
    }

    /// Records the amount currently deployed outside custody. Gains and
    /// losses on the deployment show up in the rate on the next call.
    pub fn report(&self, deployed: u64) {
        let mut current = self.deployed.write();
        info!(previous = *current, deployed, "managed assets reported");
        *current = deployed;
    }

    /// The last reported deployed amount.
    pub fn deployed(&self) -> u64 {
        *self.deployed.read()
    }

    fn liquid(&self, vault: &Vault) -> Result<u64, VaultError> {
        Ok(vault.total_assets()?.saturating_sub(self.deployed()))
    }
}

impl VaultPolicy for ManagedAssets {
    fn total_assets(&self, custody_balance: u64) -> Result<u64, VaultError> {
        custody_balance
            .checked_add(self.deployed())
            .ok_or_else(|| VaultError::ArithmeticOverflow("custody + deployed".into()))
    }

    fn max_deposit(&self, vault: &Vault, receiver: &AccountId) -> Result<u64, VaultError> {
        self.inner.max_deposit(vault, receiver)
    }

    fn max_mint(&self, vault: &Vault, receiver: &AccountId) -> Result<u64, VaultError> {
        self.inner.max_mint(vault, receiver)
    }

    fn max_withdraw(&self, vault: &Vault, owner: &AccountId) -> Result<u64, VaultError> {
        Ok(self.inner.max_withdraw(vault, owner)?.min(self.liquid(vault)?))
    }

    fn max_redeem(&self, vault: &Vault, owner: &AccountId) -> Result<u64, VaultError> {
        let liquid_shares = vault.convert_to_shares(self.liquid(vault)?)?;
        Ok(self.inner.max_redeem(vault, owner)?.min(liquid_shares))
    }
}
