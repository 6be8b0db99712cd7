//! Amount encoding
//!
//! Amounts travel through the store as decimal strings. Balances are signed:
//! a till that hands out more cash than it received simply goes negative.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::DomainError;

/// Maximum decimal places accepted on a movement (8)
pub const MAX_SCALE: u32 = 8;

/// Largest absolute delta a single movement may carry (1 trillion).
///
/// Keeps running balances far below `Decimal::MAX` so store increments and
/// read-side sums cannot overflow on any realistic transaction volume.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Reject deltas whose absolute value exceeds [`MAX_AMOUNT`].
pub fn validate_magnitude(field: &str, value: Decimal) -> Result<(), DomainError> {
    if value.abs() > Decimal::from(MAX_AMOUNT) {
        return Err(DomainError::invalid_amount(
            field,
            format!("exceeds maximum allowed value ({MAX_AMOUNT})"),
        ));
    }
    Ok(())
}

/// Reject deltas with more precision than the ledger keeps.
pub fn validate_scale(field: &str, value: Decimal) -> Result<(), DomainError> {
    if value.scale() > MAX_SCALE {
        return Err(DomainError::invalid_amount(
            field,
            format!(
                "too many decimal places (max {MAX_SCALE}, got {})",
                value.scale()
            ),
        ));
    }
    Ok(())
}

/// Parse an amount as written by the store.
///
/// Plain decimal notation is the norm; scientific notation is accepted
/// because float increments on some store versions can emit it.
pub fn parse_stored_amount(raw: &str) -> Result<Decimal, rust_decimal::Error> {
    let raw = raw.trim();
    Decimal::from_str(raw).or_else(|e| {
        if raw.contains(['e', 'E']) {
            Decimal::from_scientific(raw)
        } else {
            Err(e)
        }
    })
}

/// Canonical string form used when sending a delta to the store.
pub fn encode_amount(value: Decimal) -> String {
    value.normalize().to_string()
}
