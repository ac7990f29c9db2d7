//! Query identities and the read-through cache client.
//!
//! Reads are cached under a [`QueryKey`] (entity kind plus filter). Each key
//! belongs to one [`QueryScope`]; a mutation invalidates the scopes whose
//! entities it changed, so dependent views refetch.

use std::future::Future;
use std::sync::Arc;

use super::error::Error;
use super::event::EventQuery;
use super::ids::{ClubId, EventId};
use super::moderation::ModerationStatus;
use super::ports::QueryCache;
use super::club::ClubQuery;
use super::user::Email;

/// Identity of one cached read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// A club listing.
    Clubs(ClubQuery),
    /// One club.
    Club(ClubId),
    /// Owner statistics for a club.
    ClubStats(ClubId),
    /// A user's memberships.
    UserMemberships(Email),
    /// Memberships of a club.
    ClubMembers(ClubId),
    /// An event listing.
    Events(EventQuery),
    /// One event.
    Event(EventId),
    /// A user's registrations.
    UserRegistrations(Email),
    /// Registrations for an event.
    EventRegistrations(EventId),
    /// A user's payment history.
    UserPayments(Email),
    /// The whole ledger.
    AllPayments,
    /// Platform totals.
    PlatformStats,
    /// User directory, optionally filtered.
    Users(Option<String>),
    /// One user's profile.
    UserProfile(Email),
    /// Club-manager applications, optionally by status.
    Applications(Option<ModerationStatus>),
}

impl QueryKey {
    /// Scope invalidations are tracked under.
    pub const fn scope(&self) -> QueryScope {
        match self {
            Self::Clubs(_) | Self::Club(_) => QueryScope::Clubs,
            Self::UserMemberships(_) | Self::ClubMembers(_) => QueryScope::Memberships,
            Self::Events(_) | Self::Event(_) => QueryScope::Events,
            Self::UserRegistrations(_) | Self::EventRegistrations(_) => QueryScope::Registrations,
            Self::UserPayments(_) | Self::AllPayments => QueryScope::Payments,
            Self::ClubStats(_) | Self::PlatformStats => QueryScope::Stats,
            Self::Users(_) | Self::UserProfile(_) => QueryScope::Users,
            Self::Applications(_) => QueryScope::Applications,
        }
    }
}

/// Group of cached reads invalidated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryScope {
    /// Club listings and single clubs.
    Clubs,
    /// Membership lists.
    Memberships,
    /// Event listings and single events.
    Events,
    /// Registration lists.
    Registrations,
    /// Payment history and the ledger.
    Payments,
    /// Club and platform statistics.
    Stats,
    /// User directory and profiles.
    Users,
    /// Club-manager applications.
    Applications,
}

impl QueryScope {
    /// Scopes touched by a change to a club.
    pub const CLUB_CHANGED: &'static [Self] = &[Self::Clubs, Self::Stats];
    /// Scopes touched by joining, leaving or reviewing a membership.
    pub const MEMBERSHIP_CHANGED: &'static [Self] = &[Self::Clubs, Self::Memberships, Self::Stats];
    /// Scopes touched by a change to an event.
    pub const EVENT_CHANGED: &'static [Self] = &[Self::Events, Self::Stats];
    /// Scopes touched by registering or cancelling.
    pub const REGISTRATION_CHANGED: &'static [Self] =
        &[Self::Events, Self::Registrations, Self::Stats];
    /// Scopes touched by a new ledger entry.
    pub const PAYMENT_RECORDED: &'static [Self] = &[Self::Payments, Self::Stats];
    /// Scopes touched by a user record change.
    pub const USER_CHANGED: &'static [Self] = &[Self::Users, Self::Stats];
    /// Scopes touched by an application change.
    pub const APPLICATION_CHANGED: &'static [Self] = &[Self::Applications];
    /// Every scope; used when the signed-in user changes.
    pub const ALL: &'static [Self] = &[
        Self::Clubs,
        Self::Memberships,
        Self::Events,
        Self::Registrations,
        Self::Payments,
        Self::Stats,
        Self::Users,
        Self::Applications,
    ];
}

/// Read-through cache shared by the services.
///
/// Cloning is cheap; clones share the same cache.
#[derive(Clone)]
pub struct QueryClient {
    cache: Arc<dyn QueryCache>,
}

impl QueryClient {
    /// Wrap a cache adapter.
    pub fn new(cache: Arc<dyn QueryCache>) -> Self {
        Self { cache }
    }

    /// Return the cached value for `key`, or run `loader` and cache its
    /// result. A result whose scope was invalidated while loading is
    /// returned to the caller but not cached.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, loader: F) -> Result<T, Error>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        if let Some(hit) = self
            .cache
            .get(&key)
            .and_then(|value| value.downcast_ref::<T>().cloned())
        {
            return Ok(hit);
        }
        let ticket = self.cache.begin_fetch(&key);
        let value = loader().await?;
        if !self.cache.complete_fetch(ticket, Arc::new(value.clone())) {
            tracing::debug!(key = ?key, "discarded stale query result");
        }
        Ok(value)
    }

    /// Discard cached reads in `scopes`.
    pub fn invalidate(&self, scopes: &[QueryScope]) {
        let dropped = self.cache.invalidate(scopes);
        tracing::debug!(?scopes, dropped, "invalidated cached queries");
    }
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient").finish_non_exhaustive()
    }
}
