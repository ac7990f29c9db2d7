//! Domain-level error types.
//!
//! These errors are transport agnostic. Callers (views, CLIs, tests) branch
//! on [`ErrorCode`] and show [`ErrorCode::user_message`] or the error message;
//! nothing here is fatal to the process and every failure leaves the caller
//! free to retry the whole operation.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request failed local validation and was never sent.
    InvalidRequest,
    /// Authentication failed or is missing.
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    Forbidden,
    /// The requested resource does not exist.
    NotFound,
    /// A club with the same name already exists.
    DuplicateClubName,
    /// The user already holds a pending or active membership for the club.
    DuplicateMembership,
    /// The user is already registered for the event.
    DuplicateRegistration,
    /// The user already has a club-manager application on file.
    DuplicateApplication,
    /// The entity is not in a state that allows the requested transition.
    InvalidTransition,
    /// The event has no seats left.
    CapacityExceeded,
    /// The payment provider declined or could not complete the charge.
    PaymentDeclined,
    /// A collaborator could not be reached.
    ServiceUnavailable,
    /// An unexpected error occurred inside the domain or the backend.
    InternalError,
}

impl ErrorCode {
    /// Whether the code reports a uniqueness or state conflict rather than a
    /// generic failure.
    pub const fn is_conflict(self) -> bool {
        matches!(
            self,
            Self::DuplicateClubName
                | Self::DuplicateMembership
                | Self::DuplicateRegistration
                | Self::DuplicateApplication
                | Self::InvalidTransition
        )
    }

    /// Whether re-submitting the same operation can reasonably succeed.
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Unauthorized
                | Self::PaymentDeclined
                | Self::ServiceUnavailable
                | Self::InternalError
        )
    }

    /// Human-readable text for this category of failure.
    ///
    /// # Examples
    /// ```
    /// use clubhub::domain::ErrorCode;
    ///
    /// assert_eq!(
    ///     ErrorCode::DuplicateClubName.user_message(),
    ///     "Club with this name already exists",
    /// );
    /// ```
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "Please correct the highlighted fields",
            Self::Unauthorized => "Please sign in to continue",
            Self::Forbidden => "You do not have access to this page",
            Self::NotFound => "The requested item could not be found",
            Self::DuplicateClubName => "Club with this name already exists",
            Self::DuplicateMembership => "You already have an active membership for this club!",
            Self::DuplicateRegistration => "You are already registered for this event",
            Self::DuplicateApplication => "You have already applied to become a club manager",
            Self::InvalidTransition => "This item can no longer be changed that way",
            Self::CapacityExceeded => "This event is full",
            Self::PaymentDeclined => "Payment failed",
            Self::ServiceUnavailable => "Network error, please try again",
            Self::InternalError => "Something went wrong, please try again",
        }
    }

    /// Stable snake_case identifier.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::DuplicateClubName => "duplicate_club_name",
            Self::DuplicateMembership => "duplicate_membership",
            Self::DuplicateRegistration => "duplicate_registration",
            Self::DuplicateApplication => "duplicate_application",
            Self::InvalidTransition => "invalid_transition",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::PaymentDeclined => "payment_declined",
            Self::ServiceUnavailable => "service_unavailable",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` is never blank; blank input falls back to the code's
///   [`ErrorCode::user_message`].
///
/// # Examples
/// ```
/// use clubhub::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("club 42 is missing");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert_eq!(err.message(), "club 42 is missing");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[expect(
    clippy::error_impl_error,
    reason = "callers refer to this as domain::Error"
)]
pub struct Error {
    code: ErrorCode,
    message: String,
    details: Option<Value>,
    trace_id: Option<String>,
}

impl Error {
    /// Create a new error for `code`.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let raw: String = message.into();
        let message = if raw.trim().is_empty() {
            code.user_message().to_owned()
        } else {
            raw
        };
        Self {
            code,
            message,
            details: None,
            trace_id: None,
        }
    }

    /// Stable machine-readable error code.
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Diagnostic message describing this specific failure.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary structured details.
    pub const fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Correlation identifier of the workflow run that failed, if any.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use clubhub::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::invalid_request("bad")
    ///     .with_details(json!({ "field": "name" }));
    /// assert!(err.details().is_some());
    /// ```
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach a correlation identifier.
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Whether this is a uniqueness or state conflict.
    pub fn is_conflict(&self) -> bool {
        self.code.is_conflict()
    }

    /// Whether the caller may simply re-submit.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Text to show the user: the provider's decline reason for payment
    /// failures, the category message otherwise.
    pub fn user_message(&self) -> String {
        match self.code {
            ErrorCode::PaymentDeclined => {
                format!("{}: {}", self.code.user_message(), self.message)
            }
            ErrorCode::InvalidRequest => self.message.clone(),
            code => code.user_message().to_owned(),
        }
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Convenience constructor for [`ErrorCode::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::DuplicateClubName`].
    pub fn duplicate_club_name(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DuplicateClubName, message)
    }

    /// Convenience constructor for [`ErrorCode::DuplicateMembership`].
    pub fn duplicate_membership(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DuplicateMembership, message)
    }

    /// Convenience constructor for [`ErrorCode::DuplicateRegistration`].
    pub fn duplicate_registration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DuplicateRegistration, message)
    }

    /// Convenience constructor for [`ErrorCode::DuplicateApplication`].
    pub fn duplicate_application(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DuplicateApplication, message)
    }

    /// Convenience constructor for [`ErrorCode::InvalidTransition`].
    pub fn invalid_transition(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTransition, message)
    }

    /// Convenience constructor for [`ErrorCode::CapacityExceeded`].
    pub fn capacity_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CapacityExceeded, message)
    }

    /// Convenience constructor for [`ErrorCode::PaymentDeclined`].
    pub fn payment_declined(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PaymentDeclined, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}
