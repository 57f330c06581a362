//! # Shared Identifiers
//!
//! Small value types used across every module: account and asset
//! identifiers, the four settlement operations, and the two instruments
//! (underlying asset, vault share) an error can refer to.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// An account on either ledger.
///
/// Opaque to the vault. The ledgers decide what a valid account looks like;
/// the vault only compares identifiers for equality (caller vs. owner).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wraps an account identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// AssetId
// ---------------------------------------------------------------------------

/// Identifier of the underlying asset ledger a vault is bound to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Wraps an asset identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// The four settlement flows a vault exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Exact assets in, shares out (rounded down).
    Deposit,
    /// Exact shares out, assets in (rounded up).
    Mint,
    /// Exact assets out, shares burned (rounded up).
    Withdraw,
    /// Exact shares burned, assets out (rounded down).
    Redeem,
}

impl Operation {
    /// `true` for the two flows that pull assets into custody.
    pub fn is_inflow(&self) -> bool {
        matches!(self, Operation::Deposit | Operation::Mint)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Deposit => write!(f, "deposit"),
            Operation::Mint => write!(f, "mint"),
            Operation::Withdraw => write!(f, "withdraw"),
            Operation::Redeem => write!(f, "redeem"),
        }
    }
}

// ---------------------------------------------------------------------------
// Instrument
// ---------------------------------------------------------------------------

/// Which of the two fungible instruments an amount or error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    /// The underlying asset held in custody.
    Asset,
    /// The vault's own share token.
    Share,
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instrument::Asset => write!(f, "asset"),
            Instrument::Share => write!(f, "share"),
        }
    }
}
