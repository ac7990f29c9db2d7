//! Runtime settings loaded via OrthoConfig.

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::AccessToken;

const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
const DEFAULT_PAYMENT_PROVIDER_URL: &str = "https://api.stripe.com/v1";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings for the ClubHub engine. Every field reads from `CLUBHUB_*`
/// environment variables or a config file.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CLUBHUB")]
pub struct ClubHubSettings {
    /// Base URL of the ClubHub backend API.
    pub backend_url: Option<String>,
    /// Base URL of the payment provider API.
    pub payment_provider_url: Option<String>,
    /// Publishable key used to confirm charges.
    pub payment_publishable_key: Option<String>,
    /// Per-request timeout for backend and provider calls.
    pub request_timeout_secs: Option<u64>,
    /// Directory for the durable checkout journal. Checkouts are kept in
    /// memory when unset.
    pub checkout_journal_dir: Option<String>,
    /// Bearer token operator tools send to the backend when no user is
    /// signed in.
    pub service_token: Option<String>,
}

impl ClubHubSettings {
    /// Backend base URL, falling back to the local development server.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the configured value is not a URL.
    pub fn backend_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.backend_url.as_deref().unwrap_or(DEFAULT_BACKEND_URL))
    }

    /// Payment provider base URL.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the configured value is not a URL.
    pub fn payment_provider_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(
            self.payment_provider_url
                .as_deref()
                .unwrap_or(DEFAULT_PAYMENT_PROVIDER_URL),
        )
    }

    /// Request timeout; zero is treated as unset.
    pub fn request_timeout(&self) -> Duration {
        let secs = self
            .request_timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Journal directory, when one is configured.
    pub fn checkout_journal_dir(&self) -> Option<Utf8PathBuf> {
        self.checkout_journal_dir
            .as_deref()
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
            .map(Utf8PathBuf::from)
    }

    /// Service token, when a non-blank one is configured.
    #[must_use]
    pub fn service_token(&self) -> Option<AccessToken> {
        self.service_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(AccessToken::new)
    }
}
