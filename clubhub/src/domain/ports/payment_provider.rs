//! Port for the external payment-capture provider.
//!
//! Every call carries the checkout's [`IdempotencyKey`] so a replay after a
//! crash or a user re-initiating the flow never charges twice.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::idempotency::IdempotencyKey;
use crate::domain::{DisplayName, Email, Money};

use super::define_port_error;

define_port_error! {
    /// Payment provider failures.
    pub enum PaymentProviderError {
        /// The charge was declined; `reason` is shown to the user.
        Declined { reason: String } => "payment declined: {reason}",
        /// The provider could not be reached.
        Connection { message: String } => "payment provider unreachable: {message}",
        /// The provider refused the request (bad key, invalid amount).
        Rejected { message: String } => "payment provider rejected the request: {message}",
        /// The response could not be decoded.
        Decode { message: String } => "payment provider response could not be decoded: {message}",
    }
}

/// Single-use secret for confirming one intent.
///
/// Redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientSecret(String);

impl ClientSecret {
    /// Wrap a raw secret.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw secret.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Intent identifier embedded in a `<intent>_secret_<nonce>` secret.
    pub fn intent_id(&self) -> Option<&str> {
        self.0
            .split_once("_secret_")
            .map(|(id, _)| id)
            .filter(|id| !id.is_empty())
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret(<redacted>)")
    }
}

/// A created payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    /// Secret the client confirms the intent with.
    pub client_secret: ClientSecret,
    /// Amount the intent was created for.
    pub amount: Money,
}

/// Tokenised payment instrument (for example a card payment-method id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInstrument(String);

impl PaymentInstrument {
    /// Wrap a provider token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Billing details sent with a charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingDetails {
    /// Cardholder name.
    pub name: DisplayName,
    /// Receipt address.
    pub email: Email,
}

/// Provider-side state of a confirmed intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    /// Money captured.
    Succeeded,
    /// Still settling at the provider.
    Processing,
    /// The bank wants extra authentication.
    RequiresAction,
    /// Charge refused.
    Failed,
}

/// Result of a confirmation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeConfirmation {
    /// Provider transaction identifier, e.g. `pi_123`.
    pub transaction_id: String,
    /// Provider-side state.
    pub status: ChargeStatus,
}

/// External payment-capture provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create an intent for `amount`.
    async fn create_intent(
        &self,
        amount: Money,
        key: &IdempotencyKey,
    ) -> Result<PaymentIntent, PaymentProviderError>;

    /// Confirm the charge for `intent`.
    async fn confirm_charge(
        &self,
        intent: &PaymentIntent,
        instrument: &PaymentInstrument,
        billing: &BillingDetails,
        key: &IdempotencyKey,
    ) -> Result<ChargeConfirmation, PaymentProviderError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("pi_123_secret_abc", Some("pi_123"))]
    #[case("_secret_abc", None)]
    #[case("opaque", None)]
    fn intent_ids_come_from_the_secret(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(ClientSecret::new(raw).intent_id(), expected);
    }

    #[rstest]
    fn secrets_are_redacted() {
        let secret = ClientSecret::new("pi_1_secret_2");
        assert_eq!(format!("{secret:?}"), "ClientSecret(<redacted>)");
    }
}
