//! DTOs for the intent endpoint and the provider's confirmation API.

use serde::{Deserialize, Serialize};

use crate::domain::ports::{ChargeConfirmation, ChargeStatus, ClientSecret};

#[derive(Debug, Serialize)]
pub(super) struct CreateIntentBody {
    /// Amount in major units, as the intent endpoint expects.
    pub(super) price: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateIntentResponseDto {
    pub(super) client_secret: Option<String>,
}

impl CreateIntentResponseDto {
    pub(super) fn into_secret(self) -> Result<ClientSecret, String> {
        self.client_secret
            .filter(|secret| !secret.is_empty())
            .map(ClientSecret::new)
            .ok_or_else(|| "intent response has no clientSecret".to_owned())
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ConfirmResponseDto {
    pub(super) id: String,
    pub(super) status: String,
    #[serde(default)]
    pub(super) last_payment_error: Option<ProviderErrorDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProviderErrorDto {
    #[serde(default)]
    pub(super) message: Option<String>,
    #[serde(default)]
    pub(super) code: Option<String>,
    #[serde(default)]
    pub(super) decline_code: Option<String>,
}

impl ProviderErrorDto {
    /// Reason shown to the user.
    pub(super) fn reason(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.decline_code.clone())
            .or_else(|| self.code.clone())
            .unwrap_or_else(|| "Your card was declined.".to_owned())
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelopeDto {
    pub(super) error: ProviderErrorDto,
}

impl ConfirmResponseDto {
    pub(super) fn into_confirmation(self) -> ChargeConfirmation {
        let status = match self.status.as_str() {
            "succeeded" => ChargeStatus::Succeeded,
            "processing" => ChargeStatus::Processing,
            "requires_action" | "requires_confirmation" => ChargeStatus::RequiresAction,
            _ => ChargeStatus::Failed,
        };
        ChargeConfirmation {
            transaction_id: self.id,
            status,
        }
    }
}
