//! Form validation shared by the draft types.
//!
//! Drafts are validated before anything is sent to the backend; a failure
//! maps to [`ErrorCode::InvalidRequest`](super::ErrorCode::InvalidRequest)
//! with the offending field in the details.

use std::fmt;

use serde_json::json;

use super::error::Error;

/// Maximum length for short text fields (names, titles, categories).
pub const SHORT_TEXT_MAX: usize = 120;
/// Maximum length for long text fields (descriptions, reasons).
pub const LONG_TEXT_MAX: usize = 4_000;

/// Client-side validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was missing or blank.
    Required {
        /// Name of the field.
        field: &'static str,
    },
    /// A field exceeded its maximum length.
    TooLong {
        /// Name of the field.
        field: &'static str,
        /// Longest accepted length.
        max: usize,
    },
    /// A field held a malformed value.
    Invalid {
        /// Name of the field.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },
    /// A patch supplied no fields.
    EmptyPatch,
}

impl ValidationError {
    /// Name of the offending field, if the error concerns one.
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::Required { field } | Self::TooLong { field, .. } | Self::Invalid { field, .. } => {
                Some(field)
            }
            Self::EmptyPatch => None,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required { field } => write!(f, "{field} is required"),
            Self::TooLong { field, max } => write!(f, "{field} must be at most {max} characters"),
            Self::Invalid { field, reason } => write!(f, "{field} is invalid: {reason}"),
            Self::EmptyPatch => write!(f, "no fields to update"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        let field = err.field();
        let base = Self::invalid_request(err.to_string());
        match field {
            Some(name) => base.with_details(json!({ "field": name })),
            None => base,
        }
    }
}

/// Trim a required text field and enforce its maximum length.
pub(crate) fn required_text(
    field: &'static str,
    raw: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

/// Validate an optional text field from a patch.
pub(crate) fn optional_text(
    field: &'static str,
    raw: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    raw.map(|value| required_text(field, value, max)).transpose()
}
