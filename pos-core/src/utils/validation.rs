//! Input validation helpers
//!
//! Centralized text length constants and validation functions.

use rust_decimal::Decimal;
use shared::error::{AppError, AppResult, ErrorCode};

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product, category, customer
pub const MAX_NAME_LEN: usize = 200;

/// Notes, descriptions, reasons
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_field(field, format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::invalid_field(
            field,
            format!("{field} is too long ({} chars, max {max_len})", value.len()),
        ));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> AppResult<()> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::invalid_field(
            field,
            format!("{field} is too long ({} chars, max {max_len})", v.len()),
        ));
    }
    Ok(())
}

/// Validate a money amount is not negative
pub fn validate_non_negative(value: Decimal, field: &str) -> AppResult<()> {
    if value < Decimal::ZERO {
        return Err(AppError::with_message(
            ErrorCode::InvalidAmount,
            format!("{field} must not be negative, got {value}"),
        )
        .with_detail("field", field));
    }
    Ok(())
}
