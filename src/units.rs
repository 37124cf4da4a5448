//! Ether/Wei conversion
//!
//! Amounts travel as decimal-integer strings in Wei. These helpers are the only
//! place where human ETH amounts are turned into Wei and back, and they use
//! exact decimal arithmetic throughout.

use rust_decimal::prelude::*;

use crate::error::DashboardError;

/// Number of decimal places between ETH and Wei
pub const WEI_DECIMALS: u32 = 18;

/// Convert an operator-entered ETH amount (e.g. `"1.5"`) into a Wei string
///
/// Rejects empty, non-numeric, non-positive, overflowing amounts and amounts
/// with more precision than one Wei.
pub fn eth_to_wei(amount_eth: &str) -> Result<String, DashboardError> {
    let trimmed = amount_eth.trim();
    if trimmed.is_empty() {
        return Err(DashboardError::Validation("Amount is required".to_string()));
    }

    if fractional_digits(trimmed) > WEI_DECIMALS as usize {
        return Err(too_precise(trimmed));
    }

    let eth = Decimal::from_str_exact(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| DashboardError::Validation(format!("Invalid ETH amount: {}", trimmed)))?;

    if eth <= Decimal::ZERO {
        return Err(DashboardError::Validation(format!(
            "Amount must be greater than zero: {}",
            trimmed
        )));
    }

    let wei_per_eth = Decimal::from(10u64.pow(WEI_DECIMALS));
    let wei = eth.checked_mul(wei_per_eth).ok_or_else(|| {
        DashboardError::Validation(format!("ETH amount too large: {}", trimmed))
    })?;

    if !wei.fract().is_zero() {
        return Err(too_precise(trimmed));
    }

    Ok(wei.trunc().normalize().to_string())
}

/// Significant digits after the decimal point of a plain decimal literal
///
/// Trailing zeros do not count. Scientific notation is left to the parser.
fn fractional_digits(amount: &str) -> usize {
    if amount.contains(['e', 'E']) {
        return 0;
    }
    amount
        .split_once('.')
        .map(|(_, fraction)| fraction.trim_end_matches('0').len())
        .unwrap_or(0)
}

fn too_precise(amount: &str) -> DashboardError {
    DashboardError::Validation(format!(
        "ETH amount has more than {} decimal places: {}",
        WEI_DECIMALS, amount
    ))
}

/// Interpret a Wei integer string as ETH, or `None` if it is not an integer
/// that fits the decimal range
pub fn wei_to_eth(amount_wei: &str) -> Option<Decimal> {
    let trimmed = amount_wei.trim();
    let wei: i128 = trimmed.strip_prefix('+').unwrap_or(trimmed).parse().ok()?;
    Decimal::try_from_i128_with_scale(wei, WEI_DECIMALS).ok()
}
