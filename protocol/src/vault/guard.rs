//! Re-entrancy guard.
//!
//! Every mutating flow holds the guard for its whole duration. The guard is
//! a `parking_lot::ReentrantMutex` around an "entered" flag:
//!
//! - another thread calling into the vault blocks until the running flow
//!   finishes, so flows from different threads are serialized;
//! - the same thread calling back in (from a ledger or a hook) gets the lock
//!   again, and is then told apart by the flag. Queries are allowed through,
//!   mutating flows are rejected with [`VaultError::Reentrancy`].

use std::cell::Cell;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::error::VaultError;

#[derive(Debug, Default)]
pub(crate) struct ReentrancyGuard {
    lock: ReentrantMutex<Cell<bool>>,
}

/// Proof that the current thread is inside a mutating flow. Clears the
/// flag on drop.
pub(crate) struct Entered<'a> {
    held: ReentrantMutexGuard<'a, Cell<bool>>,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        self.held.set(false);
    }
}

impl ReentrancyGuard {
    /// Enters a mutating flow.
    pub(crate) fn enter(&self) -> Result<Entered<'_>, VaultError> {
        let held = self.lock.lock();
        if held.get() {
            return Err(VaultError::Reentrancy);
        }
        held.set(true);
        Ok(Entered { held })
    }

    /// Holds the lock for a read-only query.
    pub(crate) fn observe(&self) -> ReentrantMutexGuard<'_, Cell<bool>> {
        self.lock.lock()
    }

    /// `true` while the current thread is inside a mutating flow.
    #[cfg(test)]
    pub(crate) fn is_entered(&self) -> bool {
        self.lock.lock().get()
    }
}
