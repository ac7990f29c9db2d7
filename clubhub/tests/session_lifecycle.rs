//! Session resolution against the in-memory user directory, role changes
//! made by an admin, and cache freshness across invalidations.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use clubhub::domain::ports::AccessTokenSource;
use clubhub::domain::{
    ClubQuery, Error, QueryKey, QueryScope, Role, SessionHandle, SessionStore, SignUpRequest,
};
use clubhub::outbound::memory::InMemoryBackend;
use clubhub::test_support::fixtures::{email, super_admin, uncached_queries};
use clubhub::test_support::identity::FakeIdentityProvider;
use rstest::rstest;

mod support;

use support::{World, world};

type Store = SessionStore<FakeIdentityProvider, InMemoryBackend>;

fn store(world: &World) -> Store {
    SessionStore::new(
        Arc::new(FakeIdentityProvider::default()),
        Arc::clone(&world.backend),
        SessionHandle::new(),
        world.queries.clone(),
    )
}

#[rstest]
#[tokio::test]
async fn sign_up_creates_a_member_and_sign_out_returns_to_guest(world: World) {
    let sessions = store(&world);
    let request = SignUpRequest::try_from_parts("ann@example.com", "Secret123", "Ann", None)
        .expect("valid form");

    let principal = sessions.sign_up(&request).await.expect("signed up");

    assert_eq!(principal.role(), Some(Role::Member));
    assert_eq!(world.backend.users().len(), 1);
    assert!(sessions.handle().access_token().is_some());

    sessions.sign_out().await.expect("signed out");

    assert!(sessions.current_principal().user().is_none());
    assert!(sessions.handle().access_token().is_none());
}

#[rstest]
#[tokio::test]
async fn promotions_apply_on_the_next_resolution(world: World) {
    let sessions = store(&world);
    let request = SignUpRequest::try_from_parts("mia@example.com", "Secret123", "Mia", None)
        .expect("valid form");
    sessions.sign_up(&request).await.expect("signed up");

    world
        .admin
        .set_user_role(
            &super_admin("root@example.com"),
            &email("mia@example.com"),
            Role::ClubManager,
        )
        .await
        .expect("promoted");
    let refreshed = sessions.refresh().await.expect("refreshed");

    assert_eq!(refreshed.role(), Some(Role::ClubManager));
    assert_eq!(world.backend.users().len(), 1);
}

#[rstest]
#[tokio::test]
async fn results_loaded_across_an_invalidation_are_not_cached(world: World) {
    let loads = AtomicUsize::new(0);
    let key = QueryKey::Clubs(ClubQuery::approved());
    let load = || async {
        loads.fetch_add(1, Ordering::SeqCst);
        Ok::<_, Error>(vec!["Chess Club".to_owned()])
    };

    world
        .queries
        .fetch(key.clone(), || async {
            let value = load().await;
            // A mutation lands while this read is in flight.
            world.queries.invalidate(&[QueryScope::Clubs]);
            value
        })
        .await
        .expect("first load");
    world
        .queries
        .fetch(key.clone(), load)
        .await
        .expect("second load");
    world
        .queries
        .fetch(key, load)
        .await
        .expect("cached");

    assert_eq!(loads.load(Ordering::SeqCst), 2);
    assert_eq!(world.cache.len(), 1);
}

#[tokio::test]
async fn uncached_clients_always_reload() {
    let queries = uncached_queries();
    let loads = AtomicUsize::new(0);

    for _ in 0..2 {
        queries
            .fetch(QueryKey::PlatformStats, || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>(0_u64)
            })
            .await
            .expect("loaded");
    }

    assert_eq!(loads.load(Ordering::SeqCst), 2);
}
