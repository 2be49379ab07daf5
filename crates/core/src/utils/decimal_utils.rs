use std::str::FromStr;

use rust_decimal::Decimal;

use crate::constants::DISPLAY_DECIMAL_PRECISION;

/// Parses a loosely formatted number as exported by trading platforms.
///
/// Thousands separators and whitespace are removed first. Scientific notation
/// is accepted. Anything else that fails to parse yields zero.
pub fn parse_lenient_decimal(value: &str) -> Decimal {
    let cleaned: String = value
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .unwrap_or(Decimal::ZERO)
}

/// Rounds a monetary value for output.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp(DISPLAY_DECIMAL_PRECISION)
}
