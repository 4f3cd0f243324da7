//! Input validation helpers shared by the intake engines.

use crate::RelayError;

/// Trim a required identifier, rejecting blank values.
///
/// # Errors
/// Returns `MissingField` if the value is empty or whitespace.
pub fn required_id(value: &str, field: &'static str) -> Result<String, RelayError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RelayError::MissingField { field });
    }
    Ok(trimmed.to_string())
}

/// Trim an optional identifier. A supplied but blank value is an error.
///
/// # Errors
/// Returns `MissingField` if the value is present but blank.
pub fn optional_id(
    value: Option<&str>,
    field: &'static str,
) -> Result<Option<String>, RelayError> {
    value.map(|v| required_id(v, field)).transpose()
}

/// Reject text whose UTF-8 encoding exceeds `limit` bytes.
///
/// # Errors
/// Returns `TooLarge` when over the limit.
pub const fn ensure_size(value: &str, field: &'static str, limit: usize) -> Result<(), RelayError> {
    if value.len() > limit {
        return Err(RelayError::TooLarge { field, limit });
    }
    Ok(())
}
