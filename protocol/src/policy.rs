//! # Vault Policy
//!
//! The overridable queries of a vault: how many assets the pool is worth,
//! and how much a given receiver or owner may move in one flow.
//!
//! The defaults describe a plain vault: total assets is the custody balance
//! on the asset ledger, and every ceiling is unbounded.

use crate::error::VaultError;
use crate::types::AccountId;
use crate::vault::Vault;

/// Overridable vault queries.
///
/// Methods that receive `&Vault` may call its queries and previews, with
/// one exception: [`VaultPolicy::total_assets`] is handed the custody
/// balance instead of the vault, because the vault's own `total_assets`
/// is defined in terms of it.
pub trait VaultPolicy: Send + Sync {
    /// Total assets attributed to the pool, given the custody balance.
    fn total_assets(&self, custody_balance: u64) -> Result<u64, VaultError> {
        Ok(custody_balance)
    }

    /// Most assets `receiver` may deposit right now.
    fn max_deposit(&self, _vault: &Vault, _receiver: &AccountId) -> Result<u64, VaultError> {
        Ok(u64::MAX)
    }

    /// Most shares `receiver` may mint right now.
    fn max_mint(&self, _vault: &Vault, _receiver: &AccountId) -> Result<u64, VaultError> {
        Ok(u64::MAX)
    }

    /// Most assets `owner` may withdraw right now.
    fn max_withdraw(&self, _vault: &Vault, _owner: &AccountId) -> Result<u64, VaultError> {
        Ok(u64::MAX)
    }

    /// Most shares `owner` may redeem right now.
    fn max_redeem(&self, _vault: &Vault, _owner: &AccountId) -> Result<u64, VaultError> {
        Ok(u64::MAX)
    }
}

/// The default policy: custody balance, no ceilings.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnboundedPolicy;

impl VaultPolicy for UnboundedPolicy {}
