//! # Deposit Cap Policy
//!
//! Bounds how large a vault may grow. Two independent limits:
//!
//! - a cap on total assets, shared by every depositor;
//! - an optional cap on the shares any single receiver may hold.
//!
//! Withdrawals are never limited by this policy.

use serde::{Deserialize, Serialize};

use cistern_protocol::{AccountId, Vault, VaultError, VaultPolicy};

/// Caps total assets and, optionally, each receiver's share position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositCap {
    /// Most assets the pool may hold.
    pub asset_cap: u64,
    /// Most shares a single receiver may hold.
    #[serde(default)]
    pub receiver_share_cap: Option<u64>,
}

impl DepositCap {
    /// A cap on total assets only.
    pub fn new(asset_cap: u64) -> Self {
        Self {
            asset_cap,
            receiver_share_cap: None,
        }
    }

    /// Adds a per-receiver share cap.
    pub fn with_receiver_share_cap(mut self, shares: u64) -> Self {
        self.receiver_share_cap = Some(shares);
        self
    }

    fn share_room(&self, vault: &Vault, receiver: &AccountId) -> Option<u64> {
        self.receiver_share_cap
            .map(|cap| cap.saturating_sub(vault.share_balance(receiver)))
    }
}

impl VaultPolicy for DepositCap {
    fn max_deposit(&self, vault: &Vault, receiver: &AccountId) -> Result<u64, VaultError> {
        let totals = vault.totals()?;
        let asset_room = self.asset_cap.saturating_sub(totals.assets);
        let Some(share_room) = self.share_room(vault, receiver) else {
            return Ok(asset_room);
        };
        // Empty custody takes new assets 1:1.
        if totals.assets == 0 {
            return Ok(asset_room.min(share_room));
        }
        let share_room_in_assets = match vault.convert_to_assets(share_room) {
            Ok(assets) => assets,
            Err(VaultError::ArithmeticOverflow(_)) => u64::MAX,
            Err(e) => return Err(e),
        };
        Ok(asset_room.min(share_room_in_assets))
    }

    fn max_mint(&self, vault: &Vault, receiver: &AccountId) -> Result<u64, VaultError> {
        let asset_room = self.asset_cap.saturating_sub(vault.total_assets()?);
        let shares = vault.preview_deposit(asset_room)?;
        Ok(match self.share_room(vault, receiver) {
            Some(room) => shares.min(room),
            None => shares,
        })
    }
}
