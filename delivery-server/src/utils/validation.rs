//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Limits are chosen based on reasonable UX limits for names, addresses and
//! notes; the embedded store enforces no length limits of its own.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Customer and product names
pub const MAX_NAME_LEN: usize = 200;

/// Notes, reasons, dispute text
pub const MAX_NOTE_LEN: usize = 1000;

/// Phone numbers and other short identifiers
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Free-text addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// Image paths / URLs
pub const MAX_URL_LEN: usize = 2048;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate a monetary amount: finite and non-negative.
pub fn validate_amount(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() {
        return Err(AppError::validation(format!("{field} must be a number")));
    }
    if value < 0.0 {
        return Err(AppError::validation(format!("{field} must not be negative")));
    }
    Ok(())
}

/// Validate a line-item quantity (>= 1, bounded)
pub fn validate_quantity(qty: i64, field: &str) -> Result<(), AppError> {
    if qty < 1 {
        return Err(AppError::validation(format!("{field} must be at least 1")));
    }
    if qty > 1000 {
        return Err(AppError::validation(format!("{field} is unreasonably large")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_rejects_empty_and_whitespace() {
        assert!(validate_required_text("", "name", MAX_NAME_LEN).is_err());
        assert!(validate_required_text("   ", "name", MAX_NAME_LEN).is_err());
        assert!(validate_required_text("ok", "name", MAX_NAME_LEN).is_ok());
    }

    #[test]
    fn required_text_rejects_overlong() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(validate_required_text(&long, "name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn amount_rejects_nan_and_negative() {
        assert!(validate_amount(f64::NAN, "amount").is_err());
        assert!(validate_amount(f64::INFINITY, "amount").is_err());
        assert!(validate_amount(-0.01, "amount").is_err());
        assert!(validate_amount(0.0, "amount").is_ok());
        assert!(validate_amount(78.0, "amount").is_ok());
    }

    #[test]
    fn quantity_bounds() {
        assert!(validate_quantity(0, "qty").is_err());
        assert!(validate_quantity(-3, "qty").is_err());
        assert!(validate_quantity(1, "qty").is_ok());
        assert!(validate_quantity(1001, "qty").is_err());
    }
}
