//! Mapping of port errors onto the domain error taxonomy.

use serde_json::json;

use super::error::Error;
use super::ports::{AuthError, BackendError, CheckoutJournalError, PaymentProviderError};

/// Map a backend failure. `on_conflict` decides what a uniqueness violation
/// means for the calling operation.
pub(crate) fn map_backend_error(
    error: BackendError,
    on_conflict: impl FnOnce(String) -> Error,
) -> Error {
    match error {
        BackendError::Connection { message } => {
            Error::service_unavailable(format!("backend unavailable: {message}"))
        }
        BackendError::Unauthorized { message } => Error::unauthorized(message),
        BackendError::Forbidden { message } => Error::forbidden(message),
        BackendError::NotFound { message } => Error::not_found(message),
        BackendError::Conflict { message } => on_conflict(message),
        BackendError::Rejected { status, message } => {
            Error::invalid_request(message).with_details(json!({ "status": status }))
        }
        BackendError::Server { status, message } => {
            Error::internal(format!("backend error: {message}")).with_details(json!({
                "status": status
            }))
        }
        BackendError::Decode { message } => {
            Error::internal(format!("unexpected backend response: {message}"))
        }
    }
}

/// Map a backend failure where a conflict has no specific meaning.
pub(crate) fn map_backend(error: BackendError) -> Error {
    map_backend_error(error, Error::invalid_transition)
}

/// Map an identity provider failure.
pub(crate) fn map_auth_error(error: AuthError) -> Error {
    match error {
        AuthError::InvalidCredentials { message } => Error::unauthorized(message)
            .with_details(json!({ "authError": "invalid_credentials" })),
        AuthError::Network { message } => Error::service_unavailable(message)
            .with_details(json!({ "authError": "network_error" })),
        AuthError::PopupCancelled => Error::unauthorized("sign-in popup was closed")
            .with_details(json!({ "authError": "popup_cancelled" })),
        AuthError::Provider { message } => {
            Error::unauthorized(message).with_details(json!({ "authError": "provider_error" }))
        }
    }
}

/// Map a payment provider failure. Declines keep the provider's reason.
pub(crate) fn map_provider_error(error: PaymentProviderError) -> Error {
    match error {
        PaymentProviderError::Declined { reason } => Error::payment_declined(reason),
        PaymentProviderError::Connection { message } => {
            Error::service_unavailable(format!("payment provider unavailable: {message}"))
        }
        PaymentProviderError::Rejected { message } => Error::payment_declined(message),
        PaymentProviderError::Decode { message } => {
            Error::internal(format!("unexpected payment provider response: {message}"))
        }
    }
}

/// Map a journal failure.
pub(crate) fn map_journal_error(error: CheckoutJournalError) -> Error {
    Error::internal(error.to_string())
}
