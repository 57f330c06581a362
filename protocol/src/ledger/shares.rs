//! # Share Registry
//!
//! The in-memory [`ShareLedger`] a vault owns. Balances, total supply, and
//! allowances live in a single [`ShareBook`] behind a `parking_lot::RwLock`,
//! so supply and balances always move together under one write lock.
//!
//! The registry also carries the ordinary token surface holders need
//! (`approve`, `transfer`), which the vault itself never calls.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{LedgerError, ShareLedger};
use crate::types::{AccountId, Instrument};

/// Serializable state of the share token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareBook {
    /// Shares outstanding. Always equal to the sum of `balances`.
    pub total_supply: u64,
    /// Per-holder balances. Zero balances are pruned.
    pub balances: BTreeMap<AccountId, u64>,
    /// `owner -> (spender -> allowance)`.
    pub allowances: BTreeMap<AccountId, BTreeMap<AccountId, u64>>,
}

impl ShareBook {
    fn balance(&self, account: &AccountId) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64 {
        self.allowances
            .get(owner)
            .and_then(|m| m.get(spender))
            .copied()
            .unwrap_or(0)
    }

    fn set_balance(&mut self, account: &AccountId, amount: u64) {
        if amount == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.clone(), amount);
        }
    }

    fn set_allowance(&mut self, owner: &AccountId, spender: &AccountId, amount: u64) {
        self.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
    }

    fn debit(&mut self, account: &AccountId, amount: u64) -> Result<(), LedgerError> {
        let balance = self.balance(account);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                instrument: Instrument::Share,
                account: account.clone(),
                balance,
                required: amount,
            });
        }
        self.set_balance(account, balance - amount);
        Ok(())
    }

    fn credit(&mut self, account: &AccountId, amount: u64) -> Result<(), LedgerError> {
        let balance = self.balance(account);
        let new_balance = balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(format!("share balance of {}", account)))?;
        self.set_balance(account, new_balance);
        Ok(())
    }
}

/// In-memory share ledger.
#[derive(Debug, Default)]
pub struct ShareRegistry {
    book: RwLock<ShareBook>,
}

impl ShareRegistry {
    /// Creates an empty registry with zero supply.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `owner`'s allowance to `spender` to exactly `amount`.
    pub fn approve(&self, owner: &AccountId, spender: &AccountId, amount: u64) {
        self.book.write().set_allowance(owner, spender, amount);
    }

    /// Moves shares between holders. Supply is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientBalance`] if `from` holds fewer
    /// than `amount` shares.
    pub fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let mut book = self.book.write();
        book.debit(from, amount)?;
        // Balances sum to supply, so the credit cannot overflow.
        book.credit(to, amount)
    }

    /// Returns a copy of the current book.
    pub fn snapshot(&self) -> ShareBook {
        self.book.read().clone()
    }

    /// Number of accounts holding a non-zero balance.
    pub fn holder_count(&self) -> usize {
        self.book.read().balances.len()
    }
}

impl ShareLedger for ShareRegistry {
    fn total_supply(&self) -> u64 {
        self.book.read().total_supply
    }

    fn balance_of(&self, account: &AccountId) -> u64 {
        self.book.read().balance(account)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64 {
        self.book.read().allowance(owner, spender)
    }

    fn mint(&self, to: &AccountId, amount: u64) -> Result<(), LedgerError> {
        let mut book = self.book.write();
        let new_supply = book
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow("share supply".into()))?;
        book.credit(to, amount)?;
        book.total_supply = new_supply;
        Ok(())
    }

    fn burn(&self, from: &AccountId, amount: u64) -> Result<(), LedgerError> {
        let mut book = self.book.write();
        book.debit(from, amount)?;
        // Supply >= any single balance, so this cannot underflow.
        book.total_supply -= amount;
        Ok(())
    }

    fn spend_allowance(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let mut book = self.book.write();
        let allowance = book.allowance(owner, spender);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance {
                instrument: Instrument::Share,
                owner: owner.clone(),
                spender: spender.clone(),
                allowance,
                required: amount,
            });
        }
        book.set_allowance(owner, spender, allowance - amount);
        Ok(())
    }

    fn increase_allowance(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let mut book = self.book.write();
        let allowance = book
            .allowance(owner, spender)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow("share allowance".into()))?;
        book.set_allowance(owner, spender, allowance);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::from("alice")
    }

    fn bob() -> AccountId {
        AccountId::from("bob")
    }

    #[test]
    fn mint_increases_supply_and_balance() {
        let reg = ShareRegistry::new();
        reg.mint(&alice(), 1_000).unwrap();
        assert_eq!(reg.total_supply(), 1_000);
        assert_eq!(reg.balance_of(&alice()), 1_000);
    }

    #[test]
    fn mint_overflow_rejected_without_side_effects() {
        let reg = ShareRegistry::new();
        reg.mint(&alice(), u64::MAX).unwrap();
        let result = reg.mint(&bob(), 1);
        assert!(matches!(result, Err(LedgerError::Overflow(_))));
        assert_eq!(reg.balance_of(&bob()), 0);
        assert_eq!(reg.total_supply(), u64::MAX);
    }

    #[test]
    fn burn_decreases_supply_and_balance() {
        let reg = ShareRegistry::new();
        reg.mint(&alice(), 1_000).unwrap();
        reg.burn(&alice(), 400).unwrap();
        assert_eq!(reg.total_supply(), 600);
        assert_eq!(reg.balance_of(&alice()), 600);
    }

    #[test]
    fn burn_more_than_balance_rejected() {
        let reg = ShareRegistry::new();
        reg.mint(&alice(), 100).unwrap();
        let result = reg.burn(&alice(), 200);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance {
                balance: 100,
                required: 200,
                ..
            })
        ));
        assert_eq!(reg.total_supply(), 100);
    }

    #[test]
    fn spend_allowance_decrements_exactly() {
        let reg = ShareRegistry::new();
        reg.approve(&alice(), &bob(), 50);
        reg.spend_allowance(&alice(), &bob(), 30).unwrap();
        assert_eq!(reg.allowance(&alice(), &bob()), 20);

        let result = reg.spend_allowance(&alice(), &bob(), 21);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientAllowance { allowance: 20, .. })
        ));
        assert_eq!(reg.allowance(&alice(), &bob()), 20);
    }

    #[test]
    fn increase_allowance_restores_spent_amount() {
        let reg = ShareRegistry::new();
        reg.approve(&alice(), &bob(), 50);
        reg.spend_allowance(&alice(), &bob(), 50).unwrap();
        reg.increase_allowance(&alice(), &bob(), 50).unwrap();
        assert_eq!(reg.allowance(&alice(), &bob()), 50);
    }

    #[test]
    fn transfer_keeps_supply_constant() {
        let reg = ShareRegistry::new();
        reg.mint(&alice(), 100).unwrap();
        reg.transfer(&alice(), &bob(), 40).unwrap();
        assert_eq!(reg.balance_of(&alice()), 60);
        assert_eq!(reg.balance_of(&bob()), 40);
        assert_eq!(reg.total_supply(), 100);
        assert_eq!(reg.holder_count(), 2);
    }

    #[test]
    fn zero_balances_are_pruned() {
        let reg = ShareRegistry::new();
        reg.mint(&alice(), 10).unwrap();
        reg.burn(&alice(), 10).unwrap();
        assert_eq!(reg.holder_count(), 0);
    }

    #[test]
    fn snapshot_serializes() {
        let reg = ShareRegistry::new();
        reg.mint(&alice(), 42).unwrap();
        reg.approve(&alice(), &bob(), 7);

        let json = serde_json::to_string(&reg.snapshot()).expect("serialize");
        let book: ShareBook = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(book.total_supply, 42);
        assert_eq!(book.balances.get(&alice()), Some(&42));
        assert_eq!(book.allowances[&alice()][&bob()], 7);
    }
}
