//! # Cistern Contracts
//!
//! Collaborators that plug into a [`cistern_protocol::Vault`]. The core
//! knows them only through its traits; everything here is one possible
//! implementation:
//!
//! - **Asset Token** — an in-memory fungible ledger with issuer-gated
//!   minting, usable as the vault's underlying asset.
//! - **Deposit Cap** — a policy bounding total assets and per-receiver
//!   positions.
//! - **Managed Assets** — a policy that counts assets deployed outside
//!   custody toward the rate, while capping payouts at what is liquid.
//! - **Hooks** — an invocation recorder, a minimum-position invariant, and
//!   a chain that composes hooks.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow. Wrapping arithmetic and
//!    money do not mix.
//! 2. Everything is `Send + Sync` with interior mutability, so a single
//!    instance can be shared between a vault and the code that drives it.
//! 3. Every public data type is serializable (serde) for reports.

pub mod asset_token;
pub mod deposit_cap;
pub mod hooks;
pub mod managed_assets;

pub use asset_token::{AssetToken, TokenError, TokenInfo};
pub use deposit_cap::DepositCap;
pub use hooks::{HookCall, HookChain, HookPoint, HookRecorder, MinimumPosition};
pub use managed_assets::ManagedAssets;
