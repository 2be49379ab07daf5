//! Conversion helpers between domain values and their SQLite column encodings.
//!
//! Money and quantities are stored as decimal text, structured extras as JSON text.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Parses stored decimal text, falling back to an `f64` read for scientific
/// notation and to zero for anything unreadable.
pub fn parse_decimal_tolerant(value_str: &str, field_name: &str) -> Decimal {
    match Decimal::from_str(value_str) {
        Ok(d) => d,
        Err(e_decimal) => match f64::from_str(value_str) {
            Ok(f_val) => Decimal::from_f64(f_val).unwrap_or_else(|| {
                log::error!(
                    "Failed to convert {} '{}' (parsed as f64: {}) to Decimal.",
                    field_name,
                    value_str,
                    f_val
                );
                Decimal::ZERO
            }),
            Err(e_f64) => {
                log::error!(
                    "Failed to parse {} '{}': as Decimal (err: {}), and as f64 (err: {}). Falling back to ZERO.",
                    field_name, value_str, e_decimal, e_f64
                );
                Decimal::ZERO
            }
        },
    }
}

pub fn parse_optional_decimal(value: Option<&str>, field_name: &str) -> Option<Decimal> {
    value.map(|s| parse_decimal_tolerant(s, field_name))
}

pub fn to_utc(value: NaiveDateTime) -> DateTime<Utc> {
    value.and_utc()
}

/// Serializes `value` to JSON text, or `None` when `is_empty` says there is nothing to keep.
pub fn to_json_column<T: Serialize>(value: &T, is_empty: bool) -> Option<String> {
    if is_empty {
        return None;
    }
    match serde_json::to_string(value) {
        Ok(json) => Some(json),
        Err(e) => {
            log::error!("Failed to serialize JSON column: {}", e);
            None
        }
    }
}

/// Reads a JSON text column, falling back to the default value when absent or unreadable.
pub fn from_json_column<T: DeserializeOwned + Default>(value: Option<&str>, field_name: &str) -> T {
    match value {
        Some(json) => serde_json::from_str(json).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable {} JSON: {}", field_name, e);
            T::default()
        }),
        None => T::default(),
    }
}
