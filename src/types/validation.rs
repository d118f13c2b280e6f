//! Field validation for stored content.

use serde::{Deserialize, Serialize};

/// A field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Name of the offending field.
    pub field: String,
    /// Human-readable reason.
    pub reason: String,
}

impl ValidationError {
    /// Create a validation error for a field.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Trim `value` and check its length in characters is within `min..=max`.
///
/// Returns the trimmed value on success.
pub fn checked_text(field: &str, value: &str, min: usize, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "must not be blank"));
    }
    let len = trimmed.chars().count();
    if len < min || len > max {
        return Err(ValidationError::new(
            field,
            format!("must be between {} and {} characters (got {})", min, max, len),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_in_range_and_trims() {
        assert_eq!(checked_text("text", "  hello  ", 5, 10).unwrap(), "hello");
    }

    #[test]
    fn test_rejects_blank() {
        let err = checked_text("text", "   ", 1, 10).unwrap_err();
        assert_eq!(err.field, "text");
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        // five characters, ten bytes
        assert!(checked_text("text", "ñññññ", 5, 5).is_ok());
        assert!(checked_text("text", "abcd", 5, 500).is_err());
    }
}
