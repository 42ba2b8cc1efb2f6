//! Field-level checks shared by the input structs.

use crate::error::{AppError, AppResult};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Reject empty or whitespace-only required text.
pub fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Parse an enumerated value, turning the parse failure into a 400.
pub fn parse_enum<T: FromStr<Err = String>>(value: &str) -> AppResult<T> {
    value.parse::<T>().map_err(AppError::Validation)
}

/// Minimal shape check: one `@`, a non-empty local part, a dotted domain,
/// no whitespace.
pub fn validate_email(field: &str, value: &str) -> AppResult<()> {
    let value = value.trim();
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::Validation(format!("{} is not a valid email address", field)));
    }
    Ok(())
}

/// French postal codes are exactly five digits.
pub fn validate_postal_code(field: &str, value: &str) -> AppResult<()> {
    let value = value.trim();
    if value.len() != 5 || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(format!("{} must be 5 digits", field)));
    }
    Ok(())
}

/// Largest amount a `NUMERIC(10, 2)` money column holds.
pub fn max_amount() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Money input: between 0 and [`max_amount`], at most two decimals.
pub fn validate_amount(field: &str, value: Decimal) -> AppResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AppError::Validation(format!("{} must not be negative", field)));
    }
    if value > max_amount() {
        return Err(AppError::Validation(format!(
            "{} must not exceed {}",
            field,
            max_amount()
        )));
    }
    if value.normalize().scale() > 2 {
        return Err(AppError::Validation(format!(
            "{} must have at most 2 decimal places",
            field
        )));
    }
    Ok(())
}

/// Trim optional text and collapse blank strings to `None`.
pub fn clean_optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
