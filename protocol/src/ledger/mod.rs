//! # Ledger Capabilities
//!
//! The vault never touches balances directly. It talks to two ledgers
//! through the narrow traits below, both supplied at construction:
//!
//! ```text
//! AssetLedger — the underlying asset: custody in, custody out
//! ShareLedger — the vault's own claim token: mint, burn, allowances
//! ```
//!
//! Either ledger may be arbitrary external code, including code that calls
//! back into the vault before returning. The vault's ordering and guard
//! rules (see [`crate::vault`]) are what make that safe; the traits make no
//! promises about it.
//!
//! [`ShareRegistry`] is the in-memory share ledger a vault owns by default.

pub mod shares;

pub use shares::{ShareBook, ShareRegistry};

use thiserror::Error;

use crate::types::{AccountId, AssetId, Instrument};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors a ledger reports back to the vault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The debited account holds less than the transfer amount.
    #[error("insufficient {instrument} balance: {account} holds {balance}, required {required}")]
    InsufficientBalance {
        /// Which instrument the ledger tracks.
        instrument: Instrument,
        /// The debited account.
        account: AccountId,
        /// Its balance.
        balance: u64,
        /// The amount requested.
        required: u64,
    },

    /// The spender's allowance does not cover the transfer amount.
    #[error("insufficient {instrument} allowance: {owner} granted {spender} {allowance}, required {required}")]
    InsufficientAllowance {
        /// Which instrument the ledger tracks.
        instrument: Instrument,
        /// The account whose funds would move.
        owner: AccountId,
        /// The account moving them.
        spender: AccountId,
        /// The allowance on record.
        allowance: u64,
        /// The amount requested.
        required: u64,
    },

    /// A balance, supply, or allowance would exceed `u64::MAX`.
    #[error("ledger overflow: {0}")]
    Overflow(String),

    /// The ledger refused the operation for its own reasons (paused,
    /// unauthorized caller, unknown account, ...).
    #[error("rejected: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// AssetLedger
// ---------------------------------------------------------------------------

/// The underlying fungible asset, as seen by the vault.
///
/// Implementations use interior mutability: every method takes `&self` so
/// that a ledger can be shared between the vault and whoever else needs it.
pub trait AssetLedger: Send + Sync {
    /// Identifier of this asset.
    fn asset_id(&self) -> AssetId;

    /// Display decimals of the asset.
    fn decimals(&self) -> u8;

    /// Balance held by `account`.
    fn balance_of(&self, account: &AccountId) -> u64;

    /// Amount `spender` may move out of `owner`'s balance.
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64;

    /// Moves `amount` from `from` to `to`. The vault only ever calls this
    /// with its own custody account as `from`.
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: u64) -> Result<(), LedgerError>;

    /// Moves `amount` from `from` to `to` on behalf of `spender`, consuming
    /// `spender`'s allowance.
    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), LedgerError>;
}

// ---------------------------------------------------------------------------
// ShareLedger
// ---------------------------------------------------------------------------

/// The vault's share token. Only the vault should mint or burn.
pub trait ShareLedger: Send + Sync {
    /// Shares outstanding.
    fn total_supply(&self) -> u64;

    /// Shares held by `account`.
    fn balance_of(&self, account: &AccountId) -> u64;

    /// Shares `spender` may withdraw or redeem on `owner`'s behalf.
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64;

    /// Creates `amount` shares for `to`.
    fn mint(&self, to: &AccountId, amount: u64) -> Result<(), LedgerError>;

    /// Destroys `amount` of `from`'s shares.
    fn burn(&self, from: &AccountId, amount: u64) -> Result<(), LedgerError>;

    /// Decrements `owner`'s allowance to `spender` by exactly `amount`.
    fn spend_allowance(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: u64,
    ) -> Result<(), LedgerError>;

    /// Adds `amount` to `owner`'s allowance to `spender`. The vault uses this
    /// to hand back an allowance it consumed for a flow that then aborted.
    fn increase_allowance(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: u64,
    ) -> Result<(), LedgerError>;
}
