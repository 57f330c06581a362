//! # Asset Token
//!
//! An in-memory fungible token that a vault can hold in custody. It is the
//! [`AssetLedger`] the node runs scenarios against, and the one the
//! integration tests fund accounts with.
//!
//! ## Security Model
//!
//! - **Mint gating**: only the issuer may mint. Minting straight into a
//!   vault's custody account is how accrual is simulated.
//! - **Burn authorization**: holders burn their own balance; there is no
//!   admin burn.
//! - **Allowances**: `transfer_from` consumes exactly the amount moved. An
//!   allowance of `u64::MAX` is not treated as infinite.
//! - **Supply tracking**: total supply and balances change under one write
//!   lock, and every addition is overflow-checked.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use cistern_protocol::ledger::{AssetLedger, LedgerError};
use cistern_protocol::{AccountId, AssetId, Instrument};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during token operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The caller is not the issuer of this token.
    #[error("unauthorized: {caller} is not the issuer of this token")]
    UnauthorizedMint {
        /// Who tried to mint.
        caller: AccountId,
    },

    /// A balance or the total supply would exceed `u64::MAX`.
    #[error("supply overflow: adding {amount} would exceed u64::MAX")]
    SupplyOverflow {
        /// The amount that was attempted.
        amount: u64,
    },

    /// The debited account does not hold enough.
    #[error("insufficient balance: {account} has {balance}, tried to move {amount}")]
    InsufficientBalance {
        /// The debited account.
        account: AccountId,
        /// Its balance.
        balance: u64,
        /// Amount the caller tried to move.
        amount: u64,
    },

    /// The spender's allowance does not cover the amount.
    #[error("insufficient allowance: {owner} granted {spender} {allowance}, tried to move {amount}")]
    InsufficientAllowance {
        /// Whose tokens would move.
        owner: AccountId,
        /// Who tried to move them.
        spender: AccountId,
        /// Allowance on record.
        allowance: u64,
        /// Amount the spender tried to move.
        amount: u64,
    },

    /// Name or symbol is empty.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
}

impl From<TokenError> for LedgerError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::InsufficientBalance {
                account,
                balance,
                amount,
            } => LedgerError::InsufficientBalance {
                instrument: Instrument::Asset,
                account,
                balance,
                required: amount,
            },
            TokenError::InsufficientAllowance {
                owner,
                spender,
                allowance,
                amount,
            } => LedgerError::InsufficientAllowance {
                instrument: Instrument::Asset,
                owner,
                spender,
                allowance,
                required: amount,
            },
            TokenError::SupplyOverflow { amount } => {
                LedgerError::Overflow(format!("asset balance + {}", amount))
            }
            other => LedgerError::Rejected(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Metadata for an issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Unique token identifier, assigned at creation.
    pub asset_id: AssetId,
    /// Human-readable name (e.g., "Cistern Dollar").
    pub name: String,
    /// Ticker symbol, upper-cased.
    pub symbol: String,
    /// Display decimals.
    pub decimals: u8,
    /// The only account allowed to mint.
    pub issuer: AccountId,
    /// When the token was created.
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone)]
struct TokenState {
    total_supply: u64,
    balances: HashMap<AccountId, u64>,
    allowances: HashMap<(AccountId, AccountId), u64>,
}

impl TokenState {
    fn balance(&self, account: &AccountId) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64 {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn debit(&mut self, from: &AccountId, amount: u64) -> Result<(), TokenError> {
        let balance = self.balance(from);
        if balance < amount {
            return Err(TokenError::InsufficientBalance {
                account: from.clone(),
                balance,
                amount,
            });
        }
        self.balances.insert(from.clone(), balance - amount);
        Ok(())
    }

    fn credit(&mut self, to: &AccountId, amount: u64) -> Result<(), TokenError> {
        let balance = self
            .balance(to)
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow { amount })?;
        self.balances.insert(to.clone(), balance);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AssetToken
// ---------------------------------------------------------------------------

/// An issued fungible token.
#[derive(Debug)]
pub struct AssetToken {
    info: TokenInfo,
    state: RwLock<TokenState>,
}

impl AssetToken {
    /// Issues a new token with zero supply.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidMetadata`] if the name or symbol is empty.
    pub fn create(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        issuer: impl Into<AccountId>,
    ) -> Result<Self, TokenError> {
        let name = name.into();
        let symbol = symbol.into();
        if name.trim().is_empty() {
            return Err(TokenError::InvalidMetadata("name must not be empty".into()));
        }
        if symbol.trim().is_empty() {
            return Err(TokenError::InvalidMetadata("symbol must not be empty".into()));
        }

        let info = TokenInfo {
            asset_id: AssetId::new(Uuid::new_v4().to_string()),
            name,
            symbol: symbol.to_uppercase(),
            decimals,
            issuer: issuer.into(),
            created_at: Utc::now(),
        };
        debug!(asset = %info.asset_id, symbol = %info.symbol, "asset token created");

        Ok(Self {
            info,
            state: RwLock::new(TokenState::default()),
        })
    }

    /// Token metadata.
    pub fn info(&self) -> &TokenInfo {
        &self.info
    }

    /// Mints `amount` to `to`. Only the issuer may mint.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::UnauthorizedMint`] if `caller` is not the issuer.
    /// Returns [`TokenError::SupplyOverflow`] if the mint would overflow u64.
    pub fn mint(&self, caller: &AccountId, to: &AccountId, amount: u64) -> Result<(), TokenError> {
        if *caller != self.info.issuer {
            return Err(TokenError::UnauthorizedMint {
                caller: caller.clone(),
            });
        }

        let mut state = self.state.write();
        let new_supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow { amount })?;
        // Balances never exceed supply, so this credit cannot overflow.
        state.credit(to, amount)?;
        state.total_supply = new_supply;

        debug!(asset = %self.info.asset_id, %to, amount, "minted");
        Ok(())
    }

    /// Burns `amount` of `from`'s own balance.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InsufficientBalance`] if the holder doesn't have enough.
    pub fn burn(&self, from: &AccountId, amount: u64) -> Result<(), TokenError> {
        let mut state = self.state.write();
        state.debit(from, amount)?;
        state.total_supply -= amount;
        Ok(())
    }

    /// Sets `spender`'s allowance over `owner`'s balance.
    pub fn approve(&self, owner: &AccountId, spender: &AccountId, amount: u64) {
        self.state
            .write()
            .allowances
            .insert((owner.clone(), spender.clone()), amount);
    }

    /// Moves `amount` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InsufficientBalance`] if `from` doesn't have enough.
    pub fn transfer(&self, from: &AccountId, to: &AccountId, amount: u64) -> Result<(), TokenError> {
        let mut state = self.state.write();
        state.debit(from, amount)?;
        state.credit(to, amount)
    }

    /// Moves `amount` from `from` to `to` on behalf of `spender`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InsufficientAllowance`] or
    /// [`TokenError::InsufficientBalance`]; nothing moves in either case.
    pub fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), TokenError> {
        let mut state = self.state.write();
        let allowance = state.allowance(from, spender);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: from.clone(),
                spender: spender.clone(),
                allowance,
                amount,
            });
        }
        state.debit(from, amount)?;
        state.credit(to, amount)?;
        state
            .allowances
            .insert((from.clone(), spender.clone()), allowance - amount);
        Ok(())
    }

    /// Balance of `account`.
    pub fn balance_of(&self, account: &AccountId) -> u64 {
        self.state.read().balance(account)
    }

    /// Allowance `owner` granted `spender`.
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64 {
        self.state.read().allowance(owner, spender)
    }

    /// Tokens in existence.
    pub fn total_supply(&self) -> u64 {
        self.state.read().total_supply
    }

    /// Number of accounts holding a non-zero balance.
    pub fn holder_count(&self) -> usize {
        self.state.read().balances.values().filter(|b| **b > 0).count()
    }
}

impl AssetLedger for AssetToken {
    fn asset_id(&self) -> AssetId {
        self.info.asset_id.clone()
    }

    fn decimals(&self) -> u8 {
        self.info.decimals
    }

    fn balance_of(&self, account: &AccountId) -> u64 {
        AssetToken::balance_of(self, account)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64 {
        AssetToken::allowance(self, owner, spender)
    }

    fn transfer(&self, from: &AccountId, to: &AccountId, amount: u64) -> Result<(), LedgerError> {
        AssetToken::transfer(self, from, to, amount).map_err(LedgerError::from)
    }

    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        AssetToken::transfer_from(self, spender, from, to, amount).map_err(LedgerError::from)
    }
}
