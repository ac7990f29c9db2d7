//! In-memory backend adapter.
//!
//! Implements every backend resource port over process memory with the same
//! uniqueness contract as the REST backend: duplicate club names, live
//! memberships, active seats, open manager applications and existing user
//! records are reported as [`BackendError::Conflict`], and payments are
//! idempotent on their key. Used by integration tests and offline demos.

mod resources;

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mockable::{Clock, DefaultClock};

use crate::domain::ports::BackendError;
use crate::domain::{
    ApplicationId, Club, ClubId, ClubManagerApplication, Email, Event, EventId,
    EventRegistration, Membership, MembershipId, Payment, RegistrationId, User,
};

#[derive(Debug, Default)]
struct BackendState {
    users: BTreeMap<Email, User>,
    clubs: BTreeMap<ClubId, Club>,
    memberships: BTreeMap<MembershipId, Membership>,
    events: BTreeMap<EventId, Event>,
    registrations: BTreeMap<RegistrationId, EventRegistration>,
    applications: BTreeMap<ApplicationId, ClubManagerApplication>,
    payments: Vec<Payment>,
    failures: VecDeque<BackendError>,
}

/// Backend holding every resource in memory.
pub struct InMemoryBackend {
    state: Mutex<BackendState>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend").finish_non_exhaustive()
    }
}

impl InMemoryBackend {
    /// An empty backend stamping records with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(BackendState::default()),
            clock,
        }
    }

    fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the next backend call with `error`. Queued failures are consumed
    /// in order, one per call.
    pub fn fail_next(&self, error: BackendError) {
        self.state().failures.push_back(error);
    }

    /// Seed a user record.
    pub fn insert_user(&self, user: User) {
        self.state().users.insert(user.email.clone(), user);
    }

    /// Seed a club.
    pub fn insert_club(&self, club: Club) {
        self.state().clubs.insert(club.id.clone(), club);
    }

    /// Seed an event.
    pub fn insert_event(&self, event: Event) {
        self.state().events.insert(event.id.clone(), event);
    }

    /// Every user record.
    pub fn users(&self) -> Vec<User> {
        self.state().users.values().cloned().collect()
    }

    /// Every club.
    pub fn clubs(&self) -> Vec<Club> {
        self.state().clubs.values().cloned().collect()
    }

    /// Every membership.
    pub fn memberships(&self) -> Vec<Membership> {
        self.state().memberships.values().cloned().collect()
    }

    /// Every registration.
    pub fn registrations(&self) -> Vec<EventRegistration> {
        self.state().registrations.values().cloned().collect()
    }

    /// Every recorded payment, in recording order.
    pub fn payments(&self) -> Vec<Payment> {
        self.state().payments.clone()
    }
}
