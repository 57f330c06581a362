//! Settlement journal.
//!
//! A flow records every ledger effect it applies. If a later step fails,
//! the journal undoes the recorded effects in reverse order, so the flow
//! leaves no partial settlement behind. On success the journal is simply
//! dropped.
//!
//! The asset push at the end of withdraw/redeem is never journaled: it is
//! the last fallible step, and once it succeeds nothing can fail after it.

use tracing::error;

use super::Vault;
use crate::ledger::LedgerError;
use crate::types::AccountId;

/// One applied, reversible ledger effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    /// Assets moved from `from` into custody.
    AssetsPulled { from: AccountId, amount: u64 },
    /// Shares minted to `to`.
    SharesMinted { to: AccountId, amount: u64 },
    /// Share allowance consumed.
    AllowanceSpent {
        owner: AccountId,
        spender: AccountId,
        amount: u64,
    },
    /// Shares burned from `from`.
    SharesBurned { from: AccountId, amount: u64 },
}

#[derive(Debug, Default)]
pub(crate) struct Journal {
    effects: Vec<Effect>,
}

impl Journal {
    pub(crate) fn record(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    #[cfg(test)]
    pub(crate) fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Undoes every recorded effect, newest first.
    ///
    /// A compensation that itself fails is logged and skipped; the remaining
    /// effects are still undone.
    pub(crate) fn rollback(self, vault: &Vault) {
        for effect in self.effects.into_iter().rev() {
            if let Err(e) = undo(vault, &effect) {
                error!(?effect, error = %e, "failed to compensate settlement effect");
            }
        }
    }
}

fn undo(vault: &Vault, effect: &Effect) -> Result<(), LedgerError> {
    match effect {
        Effect::AssetsPulled { from, amount } => {
            vault.asset_ledger().transfer(vault.custody(), from, *amount)
        }
        Effect::SharesMinted { to, amount } => vault.share_ledger().burn(to, *amount),
        Effect::AllowanceSpent {
            owner,
            spender,
            amount,
        } => vault
            .share_ledger()
            .increase_allowance(owner, spender, *amount),
        Effect::SharesBurned { from, amount } => vault.share_ledger().mint(from, *amount),
    }
}
