//! Event lifecycle: creation, moderation, owner edits and seat
//! registration.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use super::authorization::{Capability, require};
use super::moderation::Transition;
use super::port_errors::{map_backend, map_backend_error};
use super::ports::{ClubRepository, EventRepository, RegistrationRepository};
use super::query::{QueryClient, QueryKey, QueryScope};
use super::{
    Club, ClubId, Email, Error, Event, EventDraft, EventId, EventPatch, EventQuery,
    EventRegistration, ModerationDecision, NewRegistration, Principal, RegistrationId,
    RegistrationOutcome, RegistrationStatus,
};

const DUPLICATE_REGISTRATION: &str = "You are already registered for this event";

/// Map a registration-creation conflict.
pub(crate) fn duplicate_registration(_message: String) -> Error {
    Error::duplicate_registration(DUPLICATE_REGISTRATION)
}

/// Fail when `user` already holds a seat.
pub(crate) fn ensure_not_registered(
    user: &Email,
    registrations: &[EventRegistration],
) -> Result<(), Error> {
    if registrations
        .iter()
        .any(|registration| &registration.user_email == user && registration.is_active())
    {
        return Err(Error::duplicate_registration(DUPLICATE_REGISTRATION));
    }
    Ok(())
}

/// Fail when every seat is taken.
pub(crate) fn ensure_capacity(event: &Event, registrations: &[EventRegistration]) -> Result<(), Error> {
    let taken = registrations
        .iter()
        .filter(|registration| registration.is_active())
        .count();
    if event.is_full(u64::try_from(taken).unwrap_or(u64::MAX)) {
        return Err(Error::capacity_exceeded(format!(
            "event {} has no seats left",
            event.id
        )));
    }
    Ok(())
}

/// Event lifecycle service.
pub struct EventService<C, E, R> {
    clubs: Arc<C>,
    events: Arc<E>,
    registrations: Arc<R>,
    queries: QueryClient,
    clock: Arc<dyn Clock>,
}

impl<C, E, R> EventService<C, E, R> {
    /// Create a service over the club, event and registration repositories.
    pub fn new(
        clubs: Arc<C>,
        events: Arc<E>,
        registrations: Arc<R>,
        queries: QueryClient,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            clubs,
            events,
            registrations,
            queries,
            clock,
        }
    }
}

impl<C, E, R> EventService<C, E, R>
where
    C: ClubRepository,
    E: EventRepository,
    R: RegistrationRepository,
{
    async fn load_club(&self, id: &ClubId) -> Result<Club, Error> {
        self.clubs
            .find_club(id)
            .await
            .map_err(map_backend)?
            .ok_or_else(|| Error::not_found(format!("club {id} not found")))
    }

    async fn load_event(&self, id: &EventId) -> Result<Event, Error> {
        self.events
            .find_event(id)
            .await
            .map_err(map_backend)?
            .ok_or_else(|| Error::not_found(format!("event {id} not found")))
    }

    async fn owned_event(&self, user: &Email, id: &EventId) -> Result<Event, Error> {
        let event = self.load_event(id).await?;
        let club = self.load_club(&event.club_id).await?;
        if !club.is_owned_by(user) {
            return Err(Error::forbidden(format!("event {id} is not yours to manage")));
        }
        Ok(event)
    }

    async fn seats(&self, id: &EventId) -> Result<Vec<EventRegistration>, Error> {
        self.registrations
            .registrations_for_event(id)
            .await
            .map_err(map_backend)
    }

    /// Submit an event for a club the caller owns. The club must be
    /// approved; the event starts `pending`.
    pub async fn create_event(
        &self,
        principal: &Principal,
        draft: &EventDraft,
    ) -> Result<Event, Error> {
        let user = require(principal, Capability::CreateEvent)?;
        let new_event = draft.validate()?;
        let club = self.load_club(&new_event.club_id).await?;
        if !club.is_owned_by(&user.email) {
            return Err(Error::forbidden(format!("club {} is not yours", club.id)));
        }
        if !club.is_approved() {
            return Err(Error::invalid_transition(format!(
                "club {} must be approved before it can host events",
                club.id
            )));
        }
        let event = self
            .events
            .create_event(&new_event)
            .await
            .map_err(map_backend)?;
        self.queries.invalidate(QueryScope::EVENT_CHANGED);
        info!(event_id = %event.id, club_id = %event.club_id, "event submitted for moderation");
        Ok(event)
    }

    /// Approve or reject an event. Re-applying the current outcome writes
    /// nothing.
    pub async fn moderate_event(
        &self,
        principal: &Principal,
        id: &EventId,
        decision: ModerationDecision,
    ) -> Result<Event, Error> {
        require(principal, Capability::ModerateEvents)?;
        let mut event = self.load_event(id).await?;
        match event.status.apply(decision)? {
            Transition::Unchanged => Ok(event),
            Transition::Changed(status) => {
                self.events
                    .set_event_status(id, status)
                    .await
                    .map_err(map_backend)?;
                event.status = status;
                self.queries.invalidate(QueryScope::EVENT_CHANGED);
                info!(event_id = %id, %status, "event moderated");
                Ok(event)
            }
        }
    }

    /// Change content fields of an event the caller owns.
    pub async fn update_event_fields(
        &self,
        principal: &Principal,
        id: &EventId,
        patch: &EventPatch,
    ) -> Result<Event, Error> {
        let user = require(principal, Capability::CreateEvent)?;
        let validated = patch.validate()?;
        let mut event = self.owned_event(&user.email, id).await?;
        self.events
            .update_event(id, &validated)
            .await
            .map_err(map_backend)?;
        event.apply_patch(&validated);
        self.queries.invalidate(QueryScope::EVENT_CHANGED);
        info!(event_id = %id, "event updated");
        Ok(event)
    }

    /// Delete an event the caller owns.
    pub async fn delete_event(&self, principal: &Principal, id: &EventId) -> Result<(), Error> {
        let user = require(principal, Capability::CreateEvent)?;
        self.owned_event(&user.email, id).await?;
        let removed = self.events.delete_event(id).await.map_err(map_backend)?;
        if removed == 0 {
            return Err(Error::not_found(format!("event {id} not found")));
        }
        self.queries.invalidate(QueryScope::EVENT_CHANGED);
        info!(event_id = %id, "event deleted");
        Ok(())
    }

    /// List events matching `query`.
    pub async fn list_events(&self, query: EventQuery) -> Result<Vec<Event>, Error> {
        let events = Arc::clone(&self.events);
        let filter = query.clone();
        self.queries
            .fetch(QueryKey::Events(query), || async move {
                events.list_events(&filter).await.map_err(map_backend)
            })
            .await
    }

    /// Fetch one event.
    pub async fn get_event(&self, id: &EventId) -> Result<Event, Error> {
        self.queries
            .fetch(QueryKey::Event(id.clone()), || self.load_event(id))
            .await
    }

    /// Take a seat at an event.
    ///
    /// Free events register immediately without touching the payment
    /// provider. Paid events write nothing and ask for a checkout instead.
    pub async fn register_for_event(
        &self,
        principal: &Principal,
        event_id: &EventId,
    ) -> Result<RegistrationOutcome, Error> {
        let user = require(principal, Capability::RegisterForEvent)?;
        let event = self.load_event(event_id).await?;
        if !event.is_approved() {
            return Err(Error::invalid_transition(format!(
                "event {event_id} is not open for registration"
            )));
        }
        let seats = self.seats(event_id).await?;
        ensure_not_registered(&user.email, &seats)?;
        ensure_capacity(&event, &seats)?;
        if event.requires_payment() {
            return Ok(RegistrationOutcome::PaymentRequired {
                event_id: event.id,
                amount: event.event_fee,
            });
        }

        let request = NewRegistration {
            user_email: user.email.clone(),
            event_id: event.id.clone(),
            club_id: event.club_id.clone(),
            payment_id: None,
            registered_at: self.clock.utc(),
        };
        let registration = self
            .registrations
            .create_registration(&request)
            .await
            .map_err(|err| map_backend_error(err, duplicate_registration))
            .inspect_err(|err| {
                warn!(user = %user.email, event_id = %event_id, code = %err.code(), "registration failed");
            })?;
        self.queries.invalidate(QueryScope::REGISTRATION_CHANGED);
        info!(registration_id = %registration.id, event_id = %event_id, "registered for event");
        Ok(RegistrationOutcome::Registered(registration))
    }

    /// Give up a seat. The registration is kept as `cancelled`; cancelling
    /// twice is a no-op.
    pub async fn cancel_registration(
        &self,
        principal: &Principal,
        id: &RegistrationId,
    ) -> Result<EventRegistration, Error> {
        let user = require(principal, Capability::RegisterForEvent)?;
        let mut registration = self
            .registrations
            .find_registration(id)
            .await
            .map_err(map_backend)?
            .ok_or_else(|| Error::not_found(format!("registration {id} not found")))?;
        if registration.user_email != user.email {
            return Err(Error::forbidden(format!(
                "registration {id} belongs to someone else"
            )));
        }
        if registration.status == RegistrationStatus::Cancelled {
            return Ok(registration);
        }
        self.registrations
            .set_registration_status(id, RegistrationStatus::Cancelled)
            .await
            .map_err(map_backend)?;
        registration.status = RegistrationStatus::Cancelled;
        self.queries.invalidate(QueryScope::REGISTRATION_CHANGED);
        info!(registration_id = %id, "registration cancelled");
        Ok(registration)
    }

    /// Registrations of the signed-in user.
    pub async fn my_registrations(
        &self,
        principal: &Principal,
    ) -> Result<Vec<EventRegistration>, Error> {
        let user = require(principal, Capability::ViewOwnDashboard)?;
        let registrations = Arc::clone(&self.registrations);
        let email = user.email.clone();
        self.queries
            .fetch(QueryKey::UserRegistrations(user.email.clone()), || async move {
                registrations
                    .registrations_for_user(&email)
                    .await
                    .map_err(map_backend)
            })
            .await
    }

    /// Attendees of an event the caller owns.
    pub async fn event_registrations(
        &self,
        principal: &Principal,
        event_id: &EventId,
    ) -> Result<Vec<EventRegistration>, Error> {
        let user = require(principal, Capability::ManageClubMembers)?;
        self.owned_event(&user.email, event_id).await?;
        let registrations = Arc::clone(&self.registrations);
        let id = event_id.clone();
        self.queries
            .fetch(QueryKey::EventRegistrations(event_id.clone()), || async move {
                registrations
                    .registrations_for_event(&id)
                    .await
                    .map_err(map_backend)
            })
            .await
    }
}

#[cfg(test)]
#[path = "event_service_tests.rs"]
mod tests;
