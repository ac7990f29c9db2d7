//! Shared harness for integration tests: every service wired over the
//! in-memory backend, a caching query client, a pinned clock and a fake
//! payment provider.
#![expect(
    dead_code,
    reason = "each integration test binary uses a different subset of the harness"
)]

use std::sync::Arc;

use clubhub::domain::checkout::{CheckoutConfig, CheckoutSequencer};
use clubhub::domain::ports::{BillingDetails, PaymentInstrument};
use clubhub::domain::{
    ClubDraft, ClubService, DisplayName, EventService, JoinPolicy, MembershipService, Money,
    QueryClient, UserAdminService,
};
use clubhub::outbound::cache::InMemoryQueryCache;
use clubhub::outbound::journal::InMemoryCheckoutJournal;
use clubhub::outbound::memory::InMemoryBackend;
use clubhub::test_support::fixtures::{FixtureClock, email, fixture_clock};
use clubhub::test_support::payments::FakePaymentProvider;
use mockable::Clock;
use rstest::fixture;

pub type Sequencer =
    CheckoutSequencer<InMemoryBackend, FakePaymentProvider, InMemoryCheckoutJournal>;

/// Services over one backend, one cache and one clock.
pub struct World {
    pub backend: Arc<InMemoryBackend>,
    pub cache: Arc<InMemoryQueryCache>,
    pub provider: Arc<FakePaymentProvider>,
    pub journal: Arc<InMemoryCheckoutJournal>,
    pub clock: Arc<FixtureClock>,
    pub queries: QueryClient,
    pub clubs: ClubService<InMemoryBackend>,
    pub memberships: MembershipService<InMemoryBackend, InMemoryBackend>,
    pub events: EventService<InMemoryBackend, InMemoryBackend, InMemoryBackend>,
    pub admin: UserAdminService<InMemoryBackend, InMemoryBackend, InMemoryBackend>,
    pub checkout: Sequencer,
}

#[fixture]
pub fn world() -> World {
    build()
}

/// Wire a fresh [`World`] outside an rstest fixture.
pub fn build() -> World {
    let clock = fixture_clock();
    let shared_clock: Arc<dyn Clock> = clock.clone();
    let backend = Arc::new(InMemoryBackend::new(Arc::clone(&shared_clock)));
    let cache = Arc::new(InMemoryQueryCache::new());
    let queries = QueryClient::new(cache.clone());
    let provider = Arc::new(FakePaymentProvider::new("pi_123"));
    let journal = Arc::new(InMemoryCheckoutJournal::new());

    World {
        clubs: ClubService::new(Arc::clone(&backend), queries.clone()),
        memberships: MembershipService::new(
            Arc::clone(&backend),
            Arc::clone(&backend),
            queries.clone(),
            Arc::clone(&shared_clock),
        ),
        events: EventService::new(
            Arc::clone(&backend),
            Arc::clone(&backend),
            Arc::clone(&backend),
            queries.clone(),
            Arc::clone(&shared_clock),
        ),
        admin: UserAdminService::new(
            Arc::clone(&backend),
            Arc::clone(&backend),
            Arc::clone(&backend),
            queries.clone(),
        ),
        checkout: CheckoutSequencer::new(
            Arc::clone(&backend),
            Arc::clone(&provider),
            Arc::clone(&journal),
            queries.clone(),
            shared_clock,
            CheckoutConfig::default(),
        ),
        backend,
        cache,
        provider,
        journal,
        clock,
        queries,
    }
}

/// Club form with sensible defaults.
pub fn club_draft(name: &str, fee: Money, join_policy: JoinPolicy) -> ClubDraft {
    ClubDraft {
        name: name.to_owned(),
        description: format!("{name} meets every week"),
        category: "Hobbies".to_owned(),
        location: "Community Hall".to_owned(),
        banner_image: Some("https://img.example.com/banner.png".to_owned()),
        membership_fee: fee,
        join_policy,
    }
}

/// Test card token accepted by the fake provider.
pub fn card() -> PaymentInstrument {
    PaymentInstrument::new("pm_card_visa")
}

/// Billing details for `raw_email`.
pub fn billing(raw_email: &str) -> BillingDetails {
    let address = email(raw_email);
    BillingDetails {
        name: DisplayName::from_email(&address),
        email: address,
    }
}
