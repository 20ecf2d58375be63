//! Shared range-checking helpers for constraint parameters.

use crate::error::RelayError;

/// Validate that a fraction falls within `[0.0, 1.0]`.
///
/// Returns a validation error naming the field if out of range (or NaN).
pub fn validate_unit_range(value: f64, name: &str) -> Result<(), RelayError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(RelayError::validation(format!(
            "{name} must be between 0.0 and 1.0, got {value}"
        )));
    }
    Ok(())
}

/// Validate that an integer parameter falls within `[min, max]` (inclusive).
pub fn validate_int_range(value: u32, min: u32, max: u32, name: &str) -> Result<(), RelayError> {
    if value < min || value > max {
        return Err(RelayError::validation(format!(
            "{name} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}
