//! # Hook Dispatch
//!
//! Two extension points sit at fixed positions inside the settlement flows:
//!
//! ```text
//! deposit / mint    : pull → mint → after_deposit → emit
//! withdraw / redeem : before_withdraw → burn → push → emit
//! ```
//!
//! `after_deposit` therefore sees post-mint totals, and `before_withdraw`
//! sees the pool before anything leaves it. Both run synchronously inside
//! the flow; returning an error aborts the flow and every effect it already
//! applied is undone.
//!
//! Derived behaviour is supplied by composition: implement [`VaultHooks`]
//! and hand it to [`crate::vault::VaultBuilder::hooks`].

use thiserror::Error;

use crate::types::AccountId;
use crate::vault::Vault;

/// A hook's refusal to let a settlement proceed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct HookError {
    /// Human-readable explanation.
    pub reason: String,
}

impl HookError {
    /// Creates a rejection with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Extension points invoked by the settlement flows. Both default to no-ops.
///
/// Hooks receive the vault itself so they can read totals and balances.
/// Calling a mutating flow on it from inside a hook fails with
/// [`crate::VaultError::Reentrancy`].
pub trait VaultHooks: Send + Sync {
    /// Called after `shares` have been minted to `receiver` against
    /// `assets` pulled into custody, before the settlement is emitted.
    fn after_deposit(
        &self,
        _vault: &Vault,
        _receiver: &AccountId,
        _assets: u64,
        _shares: u64,
    ) -> Result<(), HookError> {
        Ok(())
    }

    /// Called before `shares` are burned from `owner` and before `assets`
    /// leave custody.
    fn before_withdraw(
        &self,
        _vault: &Vault,
        _owner: &AccountId,
        _assets: u64,
        _shares: u64,
    ) -> Result<(), HookError> {
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl VaultHooks for NoopHooks {}
