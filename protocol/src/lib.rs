// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Cistern Protocol — Core Library
//!
//! Cistern is the accounting core of a pooled-asset vault: many depositors
//! hand a single fungible asset to the vault, the vault issues shares, and
//! shares can later be redeemed for a proportional slice of whatever the pool
//! holds at that moment (including anything it accrued in the meantime).
//!
//! The interesting part is not the bookkeeping, it's the conversion and
//! execution engine. Exchange rates are recomputed from two moving totals on
//! every call, every rounding error lands in the pool's favour, and the four
//! settlement flows are sequenced so that collaborators calling back into the
//! vault can never observe (let alone exploit) a half-finished settlement.
//!
//! ## Architecture
//!
//! - **conversion** — Pure asset↔share arithmetic with explicit rounding.
//! - **ledger** — Capability traits for the asset and share ledgers, plus the
//!   in-memory share ledger the vault owns.
//! - **vault** — The vault itself: queries, previews, and the four flows.
//! - **hooks** — Extension points invoked inside deposit and withdraw flows.
//! - **policy** — Overridable queries: total assets and the `max*` ceilings.
//! - **events** — Settlement records and the sinks they are emitted into.
//! - **error** — The error kinds every flow can abort with.
//! - **config** — Vault identity configuration and protocol constants.
//!
//! ## Design Philosophy
//!
//! 1. The exchange rate is never cached. Totals are read, used, forgotten.
//! 2. All money math is checked. Wrapping arithmetic and money do not mix.
//! 3. A flow either settles completely or leaves every balance untouched.
//! 4. Collaborators are traits supplied at construction, so every one of them
//!    can be swapped for a test double.

pub mod config;
pub mod conversion;
pub mod error;
pub mod events;
pub mod hooks;
pub mod ledger;
pub mod policy;
pub mod types;
pub mod vault;

#[cfg(test)]
pub(crate) mod testkit;

pub use config::VaultConfig;
pub use conversion::{Rounding, Totals};
pub use error::VaultError;
pub use events::{EventLog, EventSink, Settlement, TracingSink, VaultEvent};
pub use hooks::{HookError, NoopHooks, VaultHooks};
pub use ledger::{AssetLedger, LedgerError, ShareLedger, ShareRegistry};
pub use policy::{UnboundedPolicy, VaultPolicy};
pub use types::{AccountId, AssetId, Instrument, Operation};
pub use vault::{Vault, VaultBuilder};
