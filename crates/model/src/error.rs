//! Validation Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A validation error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for validation.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a model failed validation.
///
/// Every variant names the offending field so callers can point a user at it.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required field is empty or blank.
    #[display("{field}: value is missing")]
    Missing { field: &'static str },
    /// A numeric field is outside its permitted range.
    #[display("{field}: {reason}")]
    OutOfRange { field: &'static str, reason: &'static str },
    /// The value does not look like an ISBN at all, or its check digit is wrong.
    #[display("{field}: invalid ISBN {value:?}")]
    InvalidIsbn { field: &'static str, value: String },
    /// The value contains a control character.
    #[display("{field}: contains a control character")]
    ControlCharacter { field: &'static str },
}

impl ErrorKind {
    /// The name of the field that failed validation.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field }
            | Self::OutOfRange { field, .. }
            | Self::InvalidIsbn { field, .. }
            | Self::ControlCharacter { field } => field,
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Same input, same answer.
        false
    }
}

/// Reject values holding control characters; the store joins multi-valued
/// fields with one.
pub(crate) fn check_printable(field: &'static str, value: &str) -> Result<()> {
    if value.chars().any(char::is_control) {
        exn::bail!(ErrorKind::ControlCharacter { field });
    }
    Ok(())
}
