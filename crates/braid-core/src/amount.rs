//! Conversion between whole-coin amounts and strands.
//!
//! User-facing surfaces (CLI flags, web forms, node RPC) express amounts
//! as floating-point BRAID; the engine works exclusively in integer
//! strands (1 BRAID = 10^8 strands). Conversion happens once at each
//! boundary and is validated here.

use crate::constants::COIN;
use crate::error::AmountError;

/// Convert a whole-coin amount to strands, rounding to the nearest strand.
///
/// Rejects NaN, infinities, negative amounts, and amounts too large to
/// hold in a `u64`.
///
/// # Examples
///
/// ```
/// use braid_core::amount::from_braid;
///
/// assert_eq!(from_braid(1.0).unwrap(), 100_000_000);
/// assert_eq!(from_braid(0.00000001).unwrap(), 1);
/// assert!(from_braid(f64::NAN).is_err());
/// ```
pub fn from_braid(braid: f64) -> Result<u64, AmountError> {
    if !braid.is_finite() {
        return Err(AmountError::NotFinite);
    }
    if braid < 0.0 {
        return Err(AmountError::Negative);
    }
    let strands = (braid * COIN as f64).round();
    if strands > u64::MAX as f64 {
        return Err(AmountError::OutOfRange);
    }
    Ok(strands as u64)
}

/// Convert strands to a whole-coin amount.
///
/// Lossy above 2^53 strands; used only for display and JSON output.
pub fn to_braid(strands: u64) -> f64 {
    strands as f64 / COIN as f64
}
