//! Exact conversion between human-readable decimal amounts and the integer
//! base-unit ("wei"-style) representation a token contract uses.
//!
//! All arithmetic is arbitrary-precision decimal. Native floats cannot
//! represent values scaled by 10^18 exactly, so they never appear here.

use alloy::primitives::U256;
use bigdecimal::{BigDecimal, RoundingMode, Zero};
use num_bigint::{BigInt, Sign};

use crate::errors::ClientError;

/// Largest decimal precision for which one whole token still fits in 256
/// bits (10^77 < 2^256).
pub const MAX_DECIMALS: u32 = 77;

fn check_decimals(decimals: u32) -> Result<(), ClientError> {
    if decimals > MAX_DECIMALS {
        return Err(ClientError::InvalidDecimals(format!(
            "{decimals} exceeds the supported maximum of {MAX_DECIMALS}"
        )));
    }
    Ok(())
}

/// Converts a display amount to integer base units at the given precision.
///
/// Exact for amounts representable at `decimals`; anything finer is truncated
/// toward zero so the conversion never authorizes more than was requested.
/// Negative amounts and results that overflow 256 bits are rejected.
pub fn to_base_units(amount: &BigDecimal, decimals: u32) -> Result<U256, ClientError> {
    check_decimals(decimals)?;
    if amount < &BigDecimal::zero() {
        return Err(ClientError::InvalidAmount(format!("amount {amount} is negative")));
    }

    // BigDecimal::new interprets a negative scale as multiplication by 10^|scale|.
    let scale_factor = BigDecimal::new(BigInt::from(1), -(decimals as i64));
    let scaled = (amount * scale_factor).with_scale_round(0, RoundingMode::Down);
    let (int, _) = scaled.into_bigint_and_exponent();

    let uint = int
        .to_biguint()
        .ok_or_else(|| ClientError::InvalidAmount(format!("amount {amount} is negative")))?;
    let bytes = uint.to_bytes_be();
    if bytes.len() > 32 {
        return Err(ClientError::InvalidAmount(format!(
            "amount {amount} at {decimals} decimals does not fit in 256 bits"
        )));
    }
    Ok(U256::from_be_slice(&bytes))
}

/// Converts integer base units back to a display amount at the given
/// precision. Loss-free: the full 256-bit value is preserved.
pub fn from_base_units(units: U256, decimals: u32) -> Result<BigDecimal, ClientError> {
    check_decimals(decimals)?;
    let int = BigInt::from_bytes_be(Sign::Plus, &units.to_be_bytes::<32>());
    Ok(BigDecimal::new(int, decimals as i64))
}
