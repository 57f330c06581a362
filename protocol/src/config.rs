//! # Vault Configuration & Constants
//!
//! Every magic number in Cistern lives here, next to the one piece of
//! configuration a vault needs: its identity. Identity is fixed when the
//! vault is built and never mutated afterwards, so this is also the only
//! place validation of that identity happens.

use serde::{Deserialize, Serialize};

use crate::error::VaultError;
use crate::types::AccountId;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The protocol version string reported by the node binary.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Identity Limits
// ---------------------------------------------------------------------------

/// Decimals used when neither the config nor the asset says otherwise.
/// 18 matches the overwhelming majority of fungible assets in the wild.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Upper bound on decimals. Beyond 38 even a single whole unit no longer
/// fits in a `u128`, so anything larger is a typo, not a design choice.
pub const MAX_DECIMALS: u8 = 38;

/// Maximum share-token name length in bytes.
pub const MAX_NAME_LENGTH: usize = 64;

/// Maximum share-token symbol length in bytes.
pub const MAX_SYMBOL_LENGTH: usize = 16;

// ---------------------------------------------------------------------------
// VaultConfig
// ---------------------------------------------------------------------------

/// The identity of a vault: share-token metadata and the custody account
/// that holds the underlying asset on the asset ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Human-readable share-token name (e.g., "Cistern USD Vault").
    pub name: String,
    /// Share-token ticker (e.g., "cUSD").
    pub symbol: String,
    /// Share decimals. Inherits the asset's decimals when omitted.
    #[serde(default)]
    pub decimals: Option<u8>,
    /// Account on the asset ledger that holds the pool's custody.
    pub custody_account: AccountId,
}

impl VaultConfig {
    /// Creates a config that inherits its decimals from the asset.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        custody_account: impl Into<AccountId>,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals: None,
            custody_account: custody_account.into(),
        }
    }

    /// Overrides the share decimals.
    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = Some(decimals);
        self
    }

    /// Checks the identity fields for obvious mistakes.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] if the name or symbol is empty or
    /// too long, the custody account is empty, or the decimals are out of range.
    pub fn validate(&self) -> Result<(), VaultError> {
        if self.name.trim().is_empty() {
            return Err(VaultError::InvalidConfig("name must not be empty".into()));
        }
        if self.name.len() > MAX_NAME_LENGTH {
            return Err(VaultError::InvalidConfig(format!(
                "name exceeds {} bytes",
                MAX_NAME_LENGTH
            )));
        }
        if self.symbol.trim().is_empty() {
            return Err(VaultError::InvalidConfig("symbol must not be empty".into()));
        }
        if self.symbol.len() > MAX_SYMBOL_LENGTH {
            return Err(VaultError::InvalidConfig(format!(
                "symbol exceeds {} bytes",
                MAX_SYMBOL_LENGTH
            )));
        }
        if self.custody_account.as_str().is_empty() {
            return Err(VaultError::InvalidConfig(
                "custody account must not be empty".into(),
            ));
        }
        if let Some(decimals) = self.decimals {
            if decimals > MAX_DECIMALS {
                return Err(VaultError::InvalidConfig(format!(
                    "decimals {} exceeds maximum {}",
                    decimals, MAX_DECIMALS
                )));
            }
        }
        Ok(())
    }

    /// Resolves the share decimals against the asset's decimals.
    pub fn resolve_decimals(&self, asset_decimals: u8) -> u8 {
        self.decimals.unwrap_or(asset_decimals)
    }
}
