//! Error types for vault operations.
//!
//! Every query, preview, and flow that can fail returns a [`VaultError`].
//! None of them are recovered internally: a flow that hits any of these
//! aborts as a whole and leaves the pool exactly as it found it.

use thiserror::Error;

use crate::conversion::ConversionError;
use crate::hooks::HookError;
use crate::ledger::LedgerError;
use crate::types::{AccountId, Instrument, Operation};

/// Errors that can abort a vault call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// The spender's allowance on `instrument` does not cover the amount.
    #[error("insufficient {instrument} allowance: {owner} granted {spender} {allowance}, required {required}")]
    InsufficientAllowance {
        /// Which ledger the allowance lives on.
        instrument: Instrument,
        /// Account whose funds would be spent.
        owner: AccountId,
        /// Account trying to spend them.
        spender: AccountId,
        /// Current allowance.
        allowance: u64,
        /// Amount the flow needed.
        required: u64,
    },

    /// The account holds less of `instrument` than the flow needs.
    #[error("insufficient {instrument} balance: {account} holds {balance}, required {required}")]
    InsufficientBalance {
        /// Which ledger the balance lives on.
        instrument: Instrument,
        /// The account that was short.
        account: AccountId,
        /// Current balance.
        balance: u64,
        /// Amount the flow needed.
        required: u64,
    },

    /// The conversion rounded to zero on the side the caller receives (or,
    /// for mint/withdraw, on the side the caller pays).
    #[error("{operation} of {amount} rounds to zero and was rejected")]
    ZeroEffectRejected {
        /// The flow that was rejected.
        operation: Operation,
        /// The amount the caller requested.
        amount: u64,
    },

    /// The requested amount is above the relevant `max*` ceiling.
    #[error("{operation} of {requested} exceeds the limit of {limit}")]
    ExceedsLimit {
        /// The flow that was rejected.
        operation: Operation,
        /// The amount the caller requested.
        requested: u64,
        /// The ceiling for this receiver or owner.
        limit: u64,
    },

    /// A conversion or balance computation left the representable range.
    #[error("arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// A hook aborted the flow.
    #[error("hook rejected the settlement: {0}")]
    HookRejected(#[from] HookError),

    /// A mutating flow was entered while another one on the same vault was
    /// still running.
    #[error("re-entrant call into the vault rejected")]
    Reentrancy,

    /// A ledger failed for a reason other than balance or allowance.
    #[error("ledger error: {0}")]
    Ledger(String),

    /// The vault identity failed validation.
    #[error("invalid vault configuration: {0}")]
    InvalidConfig(String),
}

impl From<ConversionError> for VaultError {
    fn from(e: ConversionError) -> Self {
        match e {
            ConversionError::Overflow(what) => VaultError::ArithmeticOverflow(what.to_string()),
        }
    }
}

impl From<LedgerError> for VaultError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientBalance {
                instrument,
                account,
                balance,
                required,
            } => VaultError::InsufficientBalance {
                instrument,
                account,
                balance,
                required,
            },
            LedgerError::InsufficientAllowance {
                instrument,
                owner,
                spender,
                allowance,
                required,
            } => VaultError::InsufficientAllowance {
                instrument,
                owner,
                spender,
                allowance,
                required,
            },
            LedgerError::Overflow(what) => VaultError::ArithmeticOverflow(what),
            LedgerError::Rejected(reason) => VaultError::Ledger(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_errors_map_to_vault_kinds() {
        let e: VaultError = ConversionError::Overflow("multiplication").into();
        assert_eq!(e, VaultError::ArithmeticOverflow("multiplication".into()));
    }

    #[test]
    fn ledger_shortfalls_keep_their_kind() {
        let e: VaultError = LedgerError::InsufficientBalance {
            instrument: Instrument::Share,
            account: "alice".into(),
            balance: 1,
            required: 2,
        }
        .into();
        assert!(matches!(
            e,
            VaultError::InsufficientBalance {
                instrument: Instrument::Share,
                balance: 1,
                required: 2,
                ..
            }
        ));

        let e: VaultError = LedgerError::Rejected("paused".into()).into();
        assert_eq!(e, VaultError::Ledger("paused".into()));
    }

    #[test]
    fn messages_name_the_operation() {
        let e = VaultError::ZeroEffectRejected {
            operation: Operation::Deposit,
            amount: 1,
        };
        assert_eq!(e.to_string(), "deposit of 1 rounds to zero and was rejected");
    }
}
