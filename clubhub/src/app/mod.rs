//! Composition root: settings, telemetry and wiring of services over the
//! outbound adapters.

pub mod config;
pub mod telemetry;

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use thiserror::Error;
use tracing::info;

use crate::domain::checkout::{CheckoutConfig, CheckoutSequencer};
use crate::domain::ports::{
    AccessTokenSource, CheckoutJournal, CheckoutJournalError, NoAccessToken, StaticAccessToken,
};
use crate::domain::{
    ApplicationService, ClubService, EventService, MembershipService, QueryClient, SessionHandle,
    SessionStore, UserAdminService,
};
use crate::outbound::cache::InMemoryQueryCache;
use crate::outbound::journal::{FileCheckoutJournal, InMemoryCheckoutJournal};
use crate::outbound::payment::{HttpPaymentEndpoints, HttpPaymentProvider};
use crate::outbound::rest::RestBackend;

pub use config::ClubHubSettings;

/// Payment sequencer over the REST backend and HTTP provider.
pub type Checkout = CheckoutSequencer<RestBackend, HttpPaymentProvider, dyn CheckoutJournal>;

/// Failures while wiring adapters from settings.
#[derive(Debug, Error)]
pub enum AppError {
    /// A configured URL does not parse.
    #[error("invalid {setting} URL: {source}")]
    InvalidUrl {
        /// Name of the setting holding the URL.
        setting: &'static str,
        /// Underlying parse failure.
        #[source]
        source: url::ParseError,
    },
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    /// The checkout journal could not be opened.
    #[error("failed to open checkout journal: {0}")]
    Journal(#[from] CheckoutJournalError),
}

/// Open the journal the settings name, or an in-memory one.
///
/// # Errors
///
/// Returns [`AppError::Journal`] when the directory cannot be opened.
pub fn open_journal(settings: &ClubHubSettings) -> Result<Arc<dyn CheckoutJournal>, AppError> {
    match settings.checkout_journal_dir() {
        Some(dir) => {
            let journal = FileCheckoutJournal::open(dir)?;
            info!(dir = %journal.root(), "checkout journal opened");
            Ok(Arc::new(journal))
        }
        None => {
            info!("checkout journal kept in memory");
            Ok(Arc::new(InMemoryCheckoutJournal::new()))
        }
    }
}

/// Build the REST backend adapter.
///
/// # Errors
///
/// Returns an error for an unparsable backend URL or HTTP client failure.
pub fn rest_backend(
    settings: &ClubHubSettings,
    tokens: Arc<dyn AccessTokenSource>,
) -> Result<RestBackend, AppError> {
    let base_url = settings
        .backend_url()
        .map_err(|source| AppError::InvalidUrl {
            setting: "backend",
            source,
        })?;
    Ok(RestBackend::new(base_url, settings.request_timeout(), tokens)?)
}

/// Token source for tools that act without a signed-in user.
///
/// Requests go out unauthenticated when no service token is configured.
#[must_use]
pub fn service_tokens(settings: &ClubHubSettings) -> Arc<dyn AccessTokenSource> {
    match settings.service_token() {
        Some(token) => Arc::new(StaticAccessToken::new(token)),
        None => Arc::new(NoAccessToken),
    }
}

/// Build the payment sequencer.
///
/// # Errors
///
/// Returns an error when an adapter cannot be built from `settings`.
pub fn checkout(
    settings: &ClubHubSettings,
    backend: Arc<RestBackend>,
    tokens: Arc<dyn AccessTokenSource>,
    queries: QueryClient,
    clock: Arc<dyn Clock>,
) -> Result<Checkout, AppError> {
    let endpoints = HttpPaymentEndpoints {
        backend_url: backend.base_url().clone(),
        provider_url: settings
            .payment_provider_url()
            .map_err(|source| AppError::InvalidUrl {
                setting: "payment provider",
                source,
            })?,
        publishable_key: settings.payment_publishable_key.clone(),
    };
    let provider = HttpPaymentProvider::new(endpoints, settings.request_timeout(), tokens)?;
    Ok(CheckoutSequencer::new(
        backend,
        Arc::new(provider),
        open_journal(settings)?,
        queries,
        clock,
        CheckoutConfig::from_env(),
    ))
}

/// Every service of the engine, wired over one backend and one cache.
pub struct ClubHub<I> {
    /// Session lifecycle and the current principal.
    pub session: SessionStore<I, RestBackend>,
    /// Club lifecycle.
    pub clubs: ClubService<RestBackend>,
    /// Membership lifecycle.
    pub memberships: MembershipService<RestBackend, RestBackend>,
    /// Event lifecycle and registrations.
    pub events: EventService<RestBackend, RestBackend, RestBackend>,
    /// Club-manager applications.
    pub applications: ApplicationService<RestBackend>,
    /// User administration, payments and platform stats.
    pub admin: UserAdminService<RestBackend, RestBackend, RestBackend>,
    /// Paid joins and registrations.
    pub checkout: Checkout,
    /// Shared query cache.
    pub queries: QueryClient,
}

impl<I> ClubHub<I> {
    /// Wire the engine over `identity`. Backend calls carry the session's
    /// bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error when an adapter cannot be built from `settings`.
    pub fn connect(settings: &ClubHubSettings, identity: Arc<I>) -> Result<Self, AppError> {
        let handle = SessionHandle::new();
        let tokens: Arc<dyn AccessTokenSource> = Arc::new(handle.clone());
        let backend = Arc::new(rest_backend(settings, Arc::clone(&tokens))?);
        let queries = QueryClient::new(Arc::new(InMemoryQueryCache::new()));
        let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

        Ok(Self {
            session: SessionStore::new(identity, Arc::clone(&backend), handle, queries.clone()),
            clubs: ClubService::new(Arc::clone(&backend), queries.clone()),
            memberships: MembershipService::new(
                Arc::clone(&backend),
                Arc::clone(&backend),
                queries.clone(),
                Arc::clone(&clock),
            ),
            events: EventService::new(
                Arc::clone(&backend),
                Arc::clone(&backend),
                Arc::clone(&backend),
                queries.clone(),
                Arc::clone(&clock),
            ),
            applications: ApplicationService::new(
                Arc::clone(&backend),
                queries.clone(),
                Arc::clone(&clock),
            ),
            admin: UserAdminService::new(
                Arc::clone(&backend),
                Arc::clone(&backend),
                Arc::clone(&backend),
                queries.clone(),
            ),
            checkout: checkout(settings, backend, tokens, queries.clone(), clock)?,
            queries,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Wiring smoke tests; no network is touched.

    use super::*;
    use crate::test_support::identity::FakeIdentityProvider;
    use tempfile::TempDir;

    fn settings(journal: Option<String>) -> ClubHubSettings {
        ClubHubSettings {
            backend_url: Some("http://localhost:5000".to_owned()),
            payment_provider_url: None,
            payment_publishable_key: Some("pk_test_1".to_owned()),
            request_timeout_secs: Some(5),
            checkout_journal_dir: journal,
            service_token: None,
        }
    }

    #[tokio::test]
    async fn engine_wires_with_an_in_memory_journal() {
        let hub = ClubHub::connect(&settings(None), Arc::new(FakeIdentityProvider::default()))
            .expect("engine wires");

        assert!(hub.checkout.all_checkouts().await.expect("listed").is_empty());
        assert!(hub.session.current_principal().user().is_none());
    }

    #[tokio::test]
    async fn file_journals_are_created_on_demand() {
        let tmp = TempDir::new().expect("temp dir");
        let dir = tmp.path().join("checkouts");
        let configured = settings(Some(dir.to_string_lossy().into_owned()));

        let journal = open_journal(&configured).expect("journal opens");

        assert!(journal.list().await.expect("listed").is_empty());
        assert!(dir.is_dir());
    }

    #[test]
    fn bad_urls_name_the_setting() {
        let mut configured = settings(None);
        configured.backend_url = Some("not a url".to_owned());

        let error = rest_backend(&configured, Arc::new(NoAccessToken))
            .expect_err("invalid url");

        assert!(error.to_string().contains("backend"));
    }

    #[test]
    fn service_tokens_follow_the_settings() {
        let mut configured = settings(None);
        assert!(service_tokens(&configured).access_token().is_none());

        configured.service_token = Some("svc_token_1".to_owned());
        let token = service_tokens(&configured).access_token().expect("token");

        assert_eq!(token.expose(), "svc_token_1");
    }
}
