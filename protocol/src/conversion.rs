//! # Conversion Engine
//!
//! Stateless asset↔share arithmetic. Every function here is a pure function
//! of an amount, a [`Totals`] snapshot, and a [`Rounding`] direction. The
//! vault reads fresh totals on every call and feeds them in; nothing is
//! cached.
//!
//! ## Rounding Rules (always favour the pool)
//!
//! | Flow     | Converts        | Rounding | Caller effect              |
//! |----------|-----------------|----------|----------------------------|
//! | deposit  | assets → shares | Down     | receives fewer shares      |
//! | mint     | shares → assets | Up       | pays more assets           |
//! | withdraw | assets → shares | Up       | burns more shares          |
//! | redeem   | shares → assets | Down     | receives fewer assets      |
//!
//! ## Bootstrap
//!
//! While no shares exist the rate is 1:1, regardless of any residual assets
//! sitting in custody.
//!
//! ## Empty Custody
//!
//! Shares outstanding against an empty custody have no asset→share rate.
//! New assets then enter at 1:1, and existing shares are worth nothing in
//! the other direction.
//!
//! ## Width
//!
//! Amounts are `u64`. Products are formed in `u128` with checked operations
//! and narrowed back with `u64::try_from`, so an out-of-range result is an
//! error rather than a silently wrapped value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures of the conversion arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// An intermediate or final value left the representable range.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which party absorbs the remainder of an integer division.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Floor. Used where the caller receives.
    Down,
    /// Ceiling. Used where the caller pays.
    Up,
}

/// A point-in-time snapshot of the two quantities that define the rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Underlying assets attributed to the pool.
    pub assets: u64,
    /// Shares outstanding.
    pub shares: u64,
}

impl Totals {
    /// Creates a snapshot.
    pub fn new(assets: u64, shares: u64) -> Self {
        Self { assets, shares }
    }

    /// `true` while no shares exist and the 1:1 bootstrap rate applies.
    pub fn is_bootstrap(&self) -> bool {
        self.shares == 0
    }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

/// Computes `x * y / denominator` in 128-bit space with the given rounding.
///
/// # Errors
///
/// Returns [`ConversionError::Overflow`] if `denominator` is zero or the
/// quotient does not fit in a `u64`.
pub fn mul_div(
    x: u64,
    y: u64,
    denominator: u64,
    rounding: Rounding,
) -> Result<u64, ConversionError> {
    if denominator == 0 {
        return Err(ConversionError::Overflow("division by zero"));
    }

    let product = (x as u128)
        .checked_mul(y as u128)
        .ok_or(ConversionError::Overflow("multiplication"))?;
    let denominator = denominator as u128;

    let mut quotient = product / denominator;
    if rounding == Rounding::Up && product % denominator != 0 {
        quotient = quotient
            .checked_add(1)
            .ok_or(ConversionError::Overflow("ceiling adjustment"))?;
    }

    u64::try_from(quotient).map_err(|_| ConversionError::Overflow("narrowing to u64"))
}

/// Shares corresponding to `assets` at the current rate.
///
/// `totals.shares == 0 || totals.assets == 0 ? assets : assets * totals.shares / totals.assets`
///
/// # Errors
///
/// Returns [`ConversionError::Overflow`] when the result is out of range.
pub fn shares_for_assets(
    assets: u64,
    totals: Totals,
    rounding: Rounding,
) -> Result<u64, ConversionError> {
    if totals.is_bootstrap() || totals.assets == 0 {
        return Ok(assets);
    }
    mul_div(assets, totals.shares, totals.assets, rounding)
}

/// Assets corresponding to `shares` at the current rate.
///
/// `totals.shares == 0 ? shares : shares * totals.assets / totals.shares`
///
/// # Errors
///
/// Returns [`ConversionError::Overflow`] when the result is out of range.
pub fn assets_for_shares(
    shares: u64,
    totals: Totals,
    rounding: Rounding,
) -> Result<u64, ConversionError> {
    if totals.is_bootstrap() {
        return Ok(shares);
    }
    mul_div(shares, totals.assets, totals.shares, rounding)
}
