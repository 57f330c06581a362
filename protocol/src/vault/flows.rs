//! The four settlement flows.
//!
//! ```text
//! deposit  (assets in)  : guard → ceiling → shares ↓ → validate → pull → mint → after_deposit → emit
//! mint     (shares out) : guard → ceiling → assets ↑ → validate → pull → mint → after_deposit → emit
//! withdraw (assets out) : guard → ceiling → shares ↑ → validate → allowance → before_withdraw → burn → push → emit
//! redeem   (shares in)  : guard → ceiling → assets ↓ → validate → allowance → before_withdraw → burn → push → emit
//! ```
//!
//! The outflow order is the important one: shares are burned before any
//! asset leaves custody, so a receiver that calls back into the vault while
//! the push is in flight already sees the reduced supply.

use tracing::{debug, info, warn};

use super::journal::{Effect, Journal};
use super::Vault;
use crate::error::VaultError;
use crate::events::Settlement;
use crate::types::{AccountId, Instrument, Operation};

impl Vault {
    /// Deposits exactly `assets` from `caller` and mints the resulting
    /// shares to `receiver`. Returns the shares minted.
    ///
    /// `caller` must have approved the custody account for `assets` on the
    /// asset ledger.
    ///
    /// # Errors
    ///
    /// [`VaultError::ExceedsLimit`] above `max_deposit(receiver)`,
    /// [`VaultError::ZeroEffectRejected`] if the shares round to zero, plus
    /// any balance, allowance, ledger, or hook failure.
    pub fn deposit(
        &self,
        caller: &AccountId,
        assets: u64,
        receiver: &AccountId,
    ) -> Result<u64, VaultError> {
        let op = Operation::Deposit;
        self.run(op, caller, || {
            let limit = self.max_deposit(receiver)?;
            check_limit(op, assets, limit)?;
            let shares = self.preview_deposit(assets)?;
            if shares == 0 {
                return Err(zero(op, assets));
            }
            self.settle_inflow(op, caller, receiver, assets, shares)?;
            Ok(shares)
        })
    }

    /// Mints exactly `shares` to `receiver`, pulling the required assets
    /// from `caller`. Returns the assets pulled.
    ///
    /// # Errors
    ///
    /// [`VaultError::ExceedsLimit`] above `max_mint(receiver)`,
    /// [`VaultError::ZeroEffectRejected`] if the cost is zero, plus any
    /// balance, allowance, ledger, or hook failure.
    pub fn mint(
        &self,
        caller: &AccountId,
        shares: u64,
        receiver: &AccountId,
    ) -> Result<u64, VaultError> {
        let op = Operation::Mint;
        self.run(op, caller, || {
            let limit = self.max_mint(receiver)?;
            check_limit(op, shares, limit)?;
            let assets = self.preview_mint(shares)?;
            if assets == 0 {
                return Err(zero(op, shares));
            }
            self.settle_inflow(op, caller, receiver, assets, shares)?;
            Ok(assets)
        })
    }

    /// Sends exactly `assets` to `receiver`, burning the required shares
    /// from `owner`. Returns the shares burned.
    ///
    /// When `caller` is not `owner`, the burn consumes `caller`'s share
    /// allowance from `owner`.
    ///
    /// # Errors
    ///
    /// [`VaultError::ExceedsLimit`] above `max_withdraw(owner)`,
    /// [`VaultError::ZeroEffectRejected`] for a zero request, plus any
    /// balance, allowance, ledger, or hook failure.
    pub fn withdraw(
        &self,
        caller: &AccountId,
        assets: u64,
        receiver: &AccountId,
        owner: &AccountId,
    ) -> Result<u64, VaultError> {
        let op = Operation::Withdraw;
        self.run(op, caller, || {
            let limit = self.max_withdraw(owner)?;
            check_limit(op, assets, limit)?;
            let shares = self.preview_withdraw(assets)?;
            if shares == 0 {
                return Err(zero(op, assets));
            }
            self.settle_outflow(op, caller, receiver, owner, assets, shares)?;
            Ok(shares)
        })
    }

    /// Burns exactly `shares` from `owner` and sends the resulting assets to
    /// `receiver`. Returns the assets sent.
    ///
    /// # Errors
    ///
    /// [`VaultError::ExceedsLimit`] above `max_redeem(owner)`,
    /// [`VaultError::ZeroEffectRejected`] if the payout rounds to zero, plus
    /// any balance, allowance, ledger, or hook failure.
    pub fn redeem(
        &self,
        caller: &AccountId,
        shares: u64,
        receiver: &AccountId,
        owner: &AccountId,
    ) -> Result<u64, VaultError> {
        let op = Operation::Redeem;
        self.run(op, caller, || {
            let limit = self.max_redeem(owner)?;
            check_limit(op, shares, limit)?;
            let assets = self.preview_redeem(shares)?;
            if assets == 0 {
                return Err(zero(op, shares));
            }
            self.settle_outflow(op, caller, receiver, owner, assets, shares)?;
            Ok(assets)
        })
    }

    /// Runs `flow` under the re-entrancy guard and logs a rejection.
    fn run<F>(&self, op: Operation, caller: &AccountId, flow: F) -> Result<u64, VaultError>
    where
        F: FnOnce() -> Result<u64, VaultError>,
    {
        let result = self.guard.enter().and_then(|_entered| flow());
        if let Err(e) = &result {
            warn!(operation = %op, %caller, error = %e, "settlement rejected");
        }
        result
    }

    // -- inflow ------------------------------------------------------------

    fn settle_inflow(
        &self,
        op: Operation,
        caller: &AccountId,
        receiver: &AccountId,
        assets: u64,
        shares: u64,
    ) -> Result<(), VaultError> {
        debug!(operation = %op, %caller, %receiver, assets, shares, "settling inflow");

        let balance = self.asset.balance_of(caller);
        if balance < assets {
            return Err(VaultError::InsufficientBalance {
                instrument: Instrument::Asset,
                account: caller.clone(),
                balance,
                required: assets,
            });
        }
        let allowance = self.asset.allowance(caller, &self.custody);
        if allowance < assets {
            return Err(VaultError::InsufficientAllowance {
                instrument: Instrument::Asset,
                owner: caller.clone(),
                spender: self.custody.clone(),
                allowance,
                required: assets,
            });
        }

        let mut journal = Journal::default();
        if let Err(e) = self.apply_inflow(&mut journal, caller, receiver, assets, shares) {
            journal.rollback(self);
            return Err(e);
        }

        self.publish(Settlement::now(
            op,
            caller.clone(),
            receiver.clone(),
            receiver.clone(),
            assets,
            shares,
        ));
        Ok(())
    }

    fn apply_inflow(
        &self,
        journal: &mut Journal,
        caller: &AccountId,
        receiver: &AccountId,
        assets: u64,
        shares: u64,
    ) -> Result<(), VaultError> {
        self.asset
            .transfer_from(&self.custody, caller, &self.custody, assets)?;
        journal.record(Effect::AssetsPulled {
            from: caller.clone(),
            amount: assets,
        });

        self.shares.mint(receiver, shares)?;
        journal.record(Effect::SharesMinted {
            to: receiver.clone(),
            amount: shares,
        });

        self.hooks.after_deposit(self, receiver, assets, shares)?;
        Ok(())
    }

    // -- outflow -----------------------------------------------------------

    fn settle_outflow(
        &self,
        op: Operation,
        caller: &AccountId,
        receiver: &AccountId,
        owner: &AccountId,
        assets: u64,
        shares: u64,
    ) -> Result<(), VaultError> {
        debug!(operation = %op, %caller, %receiver, %owner, assets, shares, "settling outflow");

        let delegated = caller != owner;
        if delegated {
            let allowance = self.shares.allowance(owner, caller);
            if allowance < shares {
                return Err(VaultError::InsufficientAllowance {
                    instrument: Instrument::Share,
                    owner: owner.clone(),
                    spender: caller.clone(),
                    allowance,
                    required: shares,
                });
            }
        }
        let balance = self.shares.balance_of(owner);
        if balance < shares {
            return Err(VaultError::InsufficientBalance {
                instrument: Instrument::Share,
                account: owner.clone(),
                balance,
                required: shares,
            });
        }
        let custody_balance = self.asset.balance_of(&self.custody);
        if custody_balance < assets {
            return Err(VaultError::InsufficientBalance {
                instrument: Instrument::Asset,
                account: self.custody.clone(),
                balance: custody_balance,
                required: assets,
            });
        }

        let mut journal = Journal::default();
        if let Err(e) =
            self.apply_outflow(&mut journal, delegated, caller, receiver, owner, assets, shares)
        {
            journal.rollback(self);
            return Err(e);
        }

        self.publish(Settlement::now(
            op,
            caller.clone(),
            owner.clone(),
            receiver.clone(),
            assets,
            shares,
        ));
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_outflow(
        &self,
        journal: &mut Journal,
        delegated: bool,
        caller: &AccountId,
        receiver: &AccountId,
        owner: &AccountId,
        assets: u64,
        shares: u64,
    ) -> Result<(), VaultError> {
        if delegated {
            self.shares.spend_allowance(owner, caller, shares)?;
            journal.record(Effect::AllowanceSpent {
                owner: owner.clone(),
                spender: caller.clone(),
                amount: shares,
            });
        }

        self.hooks.before_withdraw(self, owner, assets, shares)?;

        self.shares.burn(owner, shares)?;
        journal.record(Effect::SharesBurned {
            from: owner.clone(),
            amount: shares,
        });

        // Last fallible step. Nothing after it needs undoing.
        self.asset.transfer(&self.custody, receiver, assets)?;
        Ok(())
    }

    fn publish(&self, settlement: Settlement) {
        info!(
            operation = %settlement.operation,
            initiator = %settlement.initiator,
            owner = %settlement.owner,
            receiver = %settlement.receiver,
            assets = settlement.assets,
            shares = settlement.shares,
            "settlement completed"
        );
        self.events.emit(&settlement.to_event());
    }
}

fn check_limit(operation: Operation, requested: u64, limit: u64) -> Result<(), VaultError> {
    if requested > limit {
        return Err(VaultError::ExceedsLimit {
            operation,
            requested,
            limit,
        });
    }
    Ok(())
}

fn zero(operation: Operation, amount: u64) -> VaultError {
    VaultError::ZeroEffectRejected { operation, amount }
}
