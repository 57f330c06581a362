//! # Settlement Events
//!
//! Every successful flow produces exactly one [`Settlement`] recording who
//! started it, whose position moved and by how much. The vault emits it as a
//! [`VaultEvent`] into its [`EventSink`]. Settlements are not stored
//! by the vault; keeping them is the sink's business.
//!
//! Two sinks ship with the crate:
//!
//! - [`TracingSink`] — structured `tracing` events, the default.
//! - [`EventLog`] — an in-memory collector for tests and reports.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Operation};

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

/// The net effect of one completed flow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Which flow produced this settlement.
    pub operation: Operation,
    /// The account that invoked the flow.
    pub initiator: AccountId,
    /// Whose shares were minted (deposit/mint) or burned (withdraw/redeem).
    pub owner: AccountId,
    /// Who received the output: shares for deposit/mint, assets for
    /// withdraw/redeem.
    pub receiver: AccountId,
    /// Underlying assets moved.
    pub assets: u64,
    /// Shares minted or burned.
    pub shares: u64,
    /// When the flow completed.
    pub settled_at: DateTime<Utc>,
}

impl Settlement {
    /// Records a settlement completed now.
    pub fn now(
        operation: Operation,
        initiator: AccountId,
        owner: AccountId,
        receiver: AccountId,
        assets: u64,
        shares: u64,
    ) -> Self {
        Self {
            operation,
            initiator,
            owner,
            receiver,
            assets,
            shares,
            settled_at: Utc::now(),
        }
    }

    /// The event this settlement is published as.
    pub fn to_event(&self) -> VaultEvent {
        if self.operation.is_inflow() {
            VaultEvent::Deposit {
                initiator: self.initiator.clone(),
                owner: self.owner.clone(),
                assets: self.assets,
                shares: self.shares,
            }
        } else {
            VaultEvent::Withdraw {
                initiator: self.initiator.clone(),
                receiver: self.receiver.clone(),
                owner: self.owner.clone(),
                assets: self.assets,
                shares: self.shares,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// VaultEvent
// ---------------------------------------------------------------------------

/// The two published event shapes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum VaultEvent {
    /// Emitted by deposit and mint. `owner` is the share receiver.
    Deposit {
        /// Who paid the assets.
        initiator: AccountId,
        /// Who received the shares.
        owner: AccountId,
        /// Assets pulled into custody.
        assets: u64,
        /// Shares minted.
        shares: u64,
    },
    /// Emitted by withdraw and redeem.
    Withdraw {
        /// Who invoked the flow.
        initiator: AccountId,
        /// Who received the assets.
        receiver: AccountId,
        /// Whose shares were burned.
        owner: AccountId,
        /// Assets sent out of custody.
        assets: u64,
        /// Shares burned.
        shares: u64,
    },
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Destination for settlement events. Emission cannot fail.
pub trait EventSink: Send + Sync {
    /// Publishes one event.
    fn emit(&self, event: &VaultEvent);
}

/// Publishes events as structured `tracing` records at `INFO`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &VaultEvent) {
        match event {
            VaultEvent::Deposit {
                initiator,
                owner,
                assets,
                shares,
            } => tracing::info!(
                target: "cistern::events",
                %initiator,
                %owner,
                assets,
                shares,
                "Deposit"
            ),
            VaultEvent::Withdraw {
                initiator,
                receiver,
                owner,
                assets,
                shares,
            } => tracing::info!(
                target: "cistern::events",
                %initiator,
                %receiver,
                %owner,
                assets,
                shares,
                "Withdraw"
            ),
        }
    }
}

/// Collects events in memory, in emission order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<VaultEvent>>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every event emitted so far.
    pub fn events(&self) -> Vec<VaultEvent> {
        self.events.lock().clone()
    }

    /// The most recent event, if any.
    pub fn last(&self) -> Option<VaultEvent> {
        self.events.lock().last().cloned()
    }

    /// Number of events emitted so far.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// `true` if nothing has been emitted.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Removes and returns every collected event.
    pub fn drain(&self) -> Vec<VaultEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: &VaultEvent) {
        self.events.lock().push(event.clone());
    }
}
