//! Conversion between native-unit decimal strings and minor units.

use alloy::primitives::utils::{format_units, parse_units, ParseUnits};
use alloy::primitives::U256;

use super::AmountError;

/// Number of decimal places between the native unit and its minor unit.
pub const NATIVE_DECIMALS: u8 = 18;

/// Convert a decimal native-unit string (e.g. `"1.5"`) to minor units.
///
/// Accepts up to 18 fractional digits. Signs, exponents and any other
/// non-digit characters are rejected.
pub fn to_minor_units(input: &str) -> Result<U256, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Parse("Amount is empty".to_string()));
    }

    let mut parts = trimmed.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();

    let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    let fraction_empty = fraction.map_or(true, str::is_empty);
    if !is_digits(whole) || !fraction.map_or(true, is_digits) || (whole.is_empty() && fraction_empty) {
        return Err(AmountError::Parse(format!("'{}' is not a valid amount", trimmed)));
    }

    if fraction.map_or(0, str::len) > NATIVE_DECIMALS as usize {
        return Err(AmountError::Parse(format!(
            "'{}' has more than {} decimal places",
            trimmed, NATIVE_DECIMALS
        )));
    }

    let normalized = format!(
        "{}.{}",
        if whole.is_empty() { "0" } else { whole },
        fraction.filter(|f| !f.is_empty()).unwrap_or("0")
    );

    match parse_units(&normalized, NATIVE_DECIMALS) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(_)) => Err(AmountError::Parse(format!(
            "'{}' must not be negative",
            trimmed
        ))),
        Err(e) => Err(AmountError::Parse(format!("'{}': {}", trimmed, e))),
    }
}

/// Render minor units as a native-unit decimal string without trailing zeros.
pub fn format_amount(amount: U256) -> String {
    match format_units(amount, NATIVE_DECIMALS) {
        Ok(formatted) if formatted.contains('.') => {
            formatted.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        Ok(formatted) => formatted,
        Err(_) => amount.to_string(),
    }
}
