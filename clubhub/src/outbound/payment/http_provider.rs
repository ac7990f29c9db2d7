//! Reqwest-backed payment provider adapter.
//!
//! Intents are created through the backend's `/create-payment-intent`
//! endpoint, which holds the provider's secret key. Charges are confirmed
//! directly against the provider with the intent's client secret. Both calls
//! carry the checkout's idempotency key.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use super::dto::{ConfirmResponseDto, CreateIntentBody, CreateIntentResponseDto, ErrorEnvelopeDto};
use crate::domain::Money;
use crate::domain::idempotency::IdempotencyKey;
use crate::domain::ports::{
    AccessTokenSource, BillingDetails, ChargeConfirmation, ChargeStatus, PaymentInstrument,
    PaymentIntent, PaymentProvider, PaymentProviderError,
};

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Endpoints and credentials for [`HttpPaymentProvider`].
pub struct HttpPaymentEndpoints {
    /// Backend base URL hosting `/create-payment-intent`.
    pub backend_url: Url,
    /// Provider API base URL, e.g. `https://api.stripe.com/v1`.
    pub provider_url: Url,
    /// Publishable key used to confirm intents.
    pub publishable_key: Option<String>,
}

/// Payment provider adapter speaking HTTP to the backend and the provider.
pub struct HttpPaymentProvider {
    client: Client,
    endpoints: HttpPaymentEndpoints,
    tokens: Arc<dyn AccessTokenSource>,
}

impl HttpPaymentProvider {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    /// ```rust,ignore
    /// let provider = HttpPaymentProvider::new(endpoints, timeout, tokens);
    /// assert!(provider.is_ok() || provider.is_err());
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoints: HttpPaymentEndpoints,
        timeout: Duration,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoints,
            tokens,
        })
    }

    fn url(base: &Url, segments: &[&str]) -> Result<Url, PaymentProviderError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| PaymentProviderError::rejected(format!("{base} cannot be a base URL")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PaymentProviderError> {
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        serde_json::from_slice(body.as_ref()).map_err(|error| {
            PaymentProviderError::decode(format!("invalid payment JSON payload: {error}"))
        })
    }
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    async fn create_intent(
        &self,
        amount: Money,
        key: &IdempotencyKey,
    ) -> Result<PaymentIntent, PaymentProviderError> {
        if amount.is_zero() {
            return Err(PaymentProviderError::rejected(
                "intents require a positive amount",
            ));
        }
        let url = Self::url(&self.endpoints.backend_url, &["create-payment-intent"])?;
        let builder = self
            .client
            .post(url)
            .header(IDEMPOTENCY_HEADER, key.to_string())
            .json(&CreateIntentBody {
                price: amount.to_major_f64(),
            });
        let request = match self.tokens.access_token() {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        };
        let response = request.send().await.map_err(map_transport_error)?;
        let decoded: CreateIntentResponseDto = Self::read(response).await?;
        let client_secret = decoded
            .into_secret()
            .map_err(PaymentProviderError::decode)?;
        debug!(%amount, "payment intent created");
        Ok(PaymentIntent {
            client_secret,
            amount,
        })
    }

    async fn confirm_charge(
        &self,
        intent: &PaymentIntent,
        instrument: &PaymentInstrument,
        billing: &BillingDetails,
        key: &IdempotencyKey,
    ) -> Result<ChargeConfirmation, PaymentProviderError> {
        let intent_id = intent.client_secret.intent_id().ok_or_else(|| {
            PaymentProviderError::rejected("client secret does not name an intent")
        })?;
        let url = Self::url(
            &self.endpoints.provider_url,
            &["payment_intents", intent_id, "confirm"],
        )?;
        let form = [
            ("client_secret", intent.client_secret.expose()),
            ("payment_method", instrument.as_str()),
            ("receipt_email", billing.email.as_ref()),
            (
                "payment_method_data[billing_details][name]",
                billing.name.as_ref(),
            ),
        ];
        let builder = self
            .client
            .post(url)
            .header(IDEMPOTENCY_HEADER, key.to_string())
            .form(&form);
        let request = match &self.endpoints.publishable_key {
            Some(publishable) => builder.bearer_auth(publishable),
            None => builder,
        };
        let response = request.send().await.map_err(map_transport_error)?;
        let decoded: ConfirmResponseDto = Self::read(response).await?;
        if decoded.status == "requires_payment_method" {
            let reason = decoded
                .last_payment_error
                .as_ref()
                .map_or_else(|| "Your card was declined.".to_owned(), |error| error.reason());
            warn!(intent = %intent_id, %reason, "charge declined");
            return Err(PaymentProviderError::declined(reason));
        }
        let confirmation = decoded.into_confirmation();
        if confirmation.status != ChargeStatus::Succeeded {
            debug!(intent = %intent_id, status = ?confirmation.status, "charge not settled");
        }
        Ok(confirmation)
    }
}

fn map_transport_error(error: reqwest::Error) -> PaymentProviderError {
    error!(error = %error, "payment transport failure");
    PaymentProviderError::connection(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PaymentProviderError {
    let provider_error = serde_json::from_slice::<ErrorEnvelopeDto>(body)
        .ok()
        .map(|envelope| envelope.error);
    match status {
        StatusCode::PAYMENT_REQUIRED => PaymentProviderError::declined(
            provider_error.map_or_else(|| "Your card was declined.".to_owned(), |error| error.reason()),
        ),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => {
            PaymentProviderError::connection(format!("status {}", status.as_u16()))
        }
        _ if status.is_client_error() => PaymentProviderError::rejected(
            provider_error.map_or_else(
                || format!("status {}", status.as_u16()),
                |error| format!("status {}: {}", status.as_u16(), error.reason()),
            ),
        ),
        _ => PaymentProviderError::connection(format!("status {}", status.as_u16())),
    }
}
