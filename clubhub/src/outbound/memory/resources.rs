//! Backend resource port implementations over [`InMemoryBackend`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{BackendState, InMemoryBackend};
use crate::domain::ports::{
    ApplicationRepository, BackendError, ClubRepository, EventRepository, MembershipRepository,
    PaymentLedger, RegistrationRepository, StatsQuery, UserDirectory,
};
use crate::domain::{
    AccessUpdate, ApplicationId, Club, ClubId, ClubManagerApplication, ClubPatch, ClubQuery,
    ClubStats, Email, Event, EventId, EventPatch, EventQuery, EventRegistration, Membership,
    MembershipId, MembershipStatus, ModerationStatus, NewApplication, NewClub, NewEvent,
    NewMembership, NewPayment, NewRegistration, Payment, PaymentId, PlatformStats, ProfilePatch,
    RegistrationId, RegistrationStatus, User,
};

impl BackendState {
    fn take_failure(&mut self) -> Result<(), BackendError> {
        self.failures.pop_front().map_or(Ok(()), Err)
    }

    fn name_taken(&self, name: &str, except: Option<&ClubId>) -> bool {
        let wanted = name.trim().to_lowercase();
        self.clubs
            .values()
            .filter(|club| Some(&club.id) != except)
            .any(|club| club.name.trim().to_lowercase() == wanted)
    }
}

fn count(items: impl Iterator) -> u64 {
    u64::try_from(items.count()).unwrap_or(u64::MAX)
}

fn missing(resource: &str, id: impl std::fmt::Display) -> BackendError {
    BackendError::not_found(format!("{resource} {id} not found"))
}

#[async_trait]
impl UserDirectory for InMemoryBackend {
    async fn create_user(&self, user: &User) -> Result<(), BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        if state.users.contains_key(&user.email) {
            return Err(BackendError::conflict(format!(
                "user {} already exists",
                user.email
            )));
        }
        let mut stored = user.clone();
        stored.created_at = Some(self.clock.utc());
        state.users.insert(stored.email.clone(), stored);
        Ok(())
    }

    async fn find_user(&self, email: &Email) -> Result<Option<User>, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        Ok(state.users.get(email).cloned())
    }

    async fn list_users(&self, search: Option<String>) -> Result<Vec<User>, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        let needle = search.map(|term| term.to_lowercase());
        Ok(state
            .users
            .values()
            .filter(|user| {
                needle.as_deref().is_none_or(|term| {
                    user.email.as_ref().to_lowercase().contains(term)
                        || user.display_name.as_ref().to_lowercase().contains(term)
                })
            })
            .cloned()
            .collect())
    }

    async fn update_access(
        &self,
        email: &Email,
        update: AccessUpdate,
    ) -> Result<(), BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        let user = state
            .users
            .get_mut(email)
            .ok_or_else(|| missing("user", email))?;
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(status) = update.status {
            user.status = status;
        }
        Ok(())
    }

    async fn update_profile(
        &self,
        email: &Email,
        patch: &ProfilePatch,
    ) -> Result<(), BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        let user = state
            .users
            .get_mut(email)
            .ok_or_else(|| missing("user", email))?;
        if let Some(name) = &patch.display_name {
            user.display_name = name.clone();
        }
        if let Some(photo) = &patch.photo_url {
            user.photo_url = Some(photo.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl ClubRepository for InMemoryBackend {
    async fn create_club(&self, owner: &Email, club: &NewClub) -> Result<Club, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        if state.name_taken(&club.name, None) {
            return Err(BackendError::conflict("Club with this name already exists"));
        }
        let created = Club {
            id: ClubId::generate(),
            name: club.name.clone(),
            description: club.description.clone(),
            category: club.category.clone(),
            location: club.location.clone(),
            banner_image: club.banner_image.clone(),
            membership_fee: club.membership_fee,
            owner_email: owner.clone(),
            status: ModerationStatus::Pending,
            join_policy: club.join_policy,
            created_at: Some(self.clock.utc()),
        };
        state.clubs.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn find_club(&self, id: &ClubId) -> Result<Option<Club>, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        Ok(state.clubs.get(id).cloned())
    }

    async fn list_clubs(&self, query: &ClubQuery) -> Result<Vec<Club>, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        let mut clubs: Vec<Club> = state
            .clubs
            .values()
            .filter(|club| query.matches(club))
            .cloned()
            .collect();
        query.sort.unwrap_or_default().sort(&mut clubs);
        Ok(clubs)
    }

    async fn set_club_status(
        &self,
        id: &ClubId,
        status: ModerationStatus,
    ) -> Result<(), BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        let club = state.clubs.get_mut(id).ok_or_else(|| missing("club", id))?;
        club.status = status;
        Ok(())
    }

    async fn update_club(&self, id: &ClubId, patch: &ClubPatch) -> Result<(), BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        if let Some(name) = &patch.name
            && state.name_taken(name, Some(id))
        {
            return Err(BackendError::conflict("Club with this name already exists"));
        }
        let club = state.clubs.get_mut(id).ok_or_else(|| missing("club", id))?;
        club.apply_patch(patch);
        Ok(())
    }

    async fn club_stats(&self, id: &ClubId) -> Result<ClubStats, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        if !state.clubs.contains_key(id) {
            return Err(missing("club", id));
        }
        let today = self.clock.utc().date_naive();
        let members = || state.memberships.values().filter(|m| &m.club_id == id);
        let events = || state.events.values().filter(|event| &event.club_id == id);
        Ok(ClubStats {
            revenue: state
                .payments
                .iter()
                .filter(|payment| payment.target.club_id() == id)
                .map(|payment| payment.amount)
                .sum(),
            members_total: count(members().filter(|m| m.status == MembershipStatus::Active)),
            members_pending: count(members().filter(|m| m.status == MembershipStatus::Pending)),
            events_upcoming: count(events().filter(|event| event.is_upcoming(today))),
            events_total: count(events()),
        })
    }
}

#[async_trait]
impl EventRepository for InMemoryBackend {
    async fn create_event(&self, event: &NewEvent) -> Result<Event, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        if !state.clubs.contains_key(&event.club_id) {
            return Err(missing("club", &event.club_id));
        }
        let created = Event {
            id: EventId::generate(),
            club_id: event.club_id.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            event_date: event.event_date,
            location: event.location.clone(),
            is_paid: event.is_paid,
            event_fee: event.event_fee,
            max_attendees: event.max_attendees,
            status: ModerationStatus::Pending,
            created_at: Some(self.clock.utc()),
        };
        state.events.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn find_event(&self, id: &EventId) -> Result<Option<Event>, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        Ok(state.events.get(id).cloned())
    }

    async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|event| query.matches(event))
            .cloned()
            .collect();
        events.sort_by(|left, right| left.event_date.cmp(&right.event_date));
        Ok(events)
    }

    async fn set_event_status(
        &self,
        id: &EventId,
        status: ModerationStatus,
    ) -> Result<(), BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        let event = state.events.get_mut(id).ok_or_else(|| missing("event", id))?;
        event.status = status;
        Ok(())
    }

    async fn update_event(&self, id: &EventId, patch: &EventPatch) -> Result<(), BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        let event = state.events.get_mut(id).ok_or_else(|| missing("event", id))?;
        event.apply_patch(patch);
        Ok(())
    }

    async fn delete_event(&self, id: &EventId) -> Result<u64, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        Ok(u64::from(state.events.remove(id).is_some()))
    }
}

#[async_trait]
impl MembershipRepository for InMemoryBackend {
    async fn create_membership(
        &self,
        membership: &NewMembership,
    ) -> Result<Membership, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        let duplicate = state.memberships.values().any(|existing| {
            existing.user_email == membership.user_email
                && existing.club_id == membership.club_id
                && existing.status.is_live()
        });
        if duplicate {
            return Err(BackendError::conflict(format!(
                "{} already holds a membership of club {}",
                membership.user_email, membership.club_id
            )));
        }
        let created = Membership {
            id: MembershipId::generate(),
            user_email: membership.user_email.clone(),
            club_id: membership.club_id.clone(),
            status: membership.status,
            payment_id: membership.payment_id.clone(),
            joined_at: membership.joined_at,
        };
        state.memberships.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn find_membership(
        &self,
        id: &MembershipId,
    ) -> Result<Option<Membership>, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        Ok(state.memberships.get(id).cloned())
    }

    async fn memberships_for_user(&self, email: &Email) -> Result<Vec<Membership>, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        Ok(state
            .memberships
            .values()
            .filter(|membership| &membership.user_email == email)
            .cloned()
            .collect())
    }

    async fn memberships_for_club(
        &self,
        club_id: &ClubId,
    ) -> Result<Vec<Membership>, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        Ok(state
            .memberships
            .values()
            .filter(|membership| &membership.club_id == club_id)
            .cloned()
            .collect())
    }

    async fn set_membership_status(
        &self,
        id: &MembershipId,
        status: MembershipStatus,
    ) -> Result<(), BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        let membership = state
            .memberships
            .get_mut(id)
            .ok_or_else(|| missing("membership", id))?;
        membership.status = status;
        Ok(())
    }

    async fn delete_membership(&self, id: &MembershipId) -> Result<u64, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        Ok(u64::from(state.memberships.remove(id).is_some()))
    }
}

#[async_trait]
impl RegistrationRepository for InMemoryBackend {
    async fn create_registration(
        &self,
        registration: &NewRegistration,
    ) -> Result<EventRegistration, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        let duplicate = state.registrations.values().any(|existing| {
            existing.user_email == registration.user_email
                && existing.event_id == registration.event_id
                && existing.is_active()
        });
        if duplicate {
            return Err(BackendError::conflict(format!(
                "{} is already registered for event {}",
                registration.user_email, registration.event_id
            )));
        }
        let created = EventRegistration {
            id: RegistrationId::generate(),
            user_email: registration.user_email.clone(),
            event_id: registration.event_id.clone(),
            club_id: registration.club_id.clone(),
            status: RegistrationStatus::Registered,
            payment_id: registration.payment_id.clone(),
            registered_at: registration.registered_at,
        };
        state
            .registrations
            .insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn find_registration(
        &self,
        id: &RegistrationId,
    ) -> Result<Option<EventRegistration>, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        Ok(state.registrations.get(id).cloned())
    }

    async fn registrations_for_user(
        &self,
        email: &Email,
    ) -> Result<Vec<EventRegistration>, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        Ok(state
            .registrations
            .values()
            .filter(|registration| &registration.user_email == email)
            .cloned()
            .collect())
    }

    async fn registrations_for_event(
        &self,
        event_id: &EventId,
    ) -> Result<Vec<EventRegistration>, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        Ok(state
            .registrations
            .values()
            .filter(|registration| &registration.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn set_registration_status(
        &self,
        id: &RegistrationId,
        status: RegistrationStatus,
    ) -> Result<(), BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        let registration = state
            .registrations
            .get_mut(id)
            .ok_or_else(|| missing("registration", id))?;
        registration.status = status;
        Ok(())
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryBackend {
    async fn create_application(
        &self,
        application: &NewApplication,
    ) -> Result<ClubManagerApplication, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        let open = state.applications.values().any(|existing| {
            existing.applicant_email == application.applicant_email
                && existing.status != ModerationStatus::Rejected
        });
        if open {
            return Err(BackendError::conflict(format!(
                "{} already has an application on file",
                application.applicant_email
            )));
        }
        let created = ClubManagerApplication {
            id: ApplicationId::generate(),
            applicant_email: application.applicant_email.clone(),
            name: application.name.clone(),
            reason: application.reason.clone(),
            photo_url: application.photo_url.clone(),
            status: ModerationStatus::Pending,
            applied_at: application.applied_at,
            approved_at: None,
        };
        state
            .applications
            .insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn find_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<ClubManagerApplication>, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        Ok(state.applications.get(id).cloned())
    }

    async fn list_applications(
        &self,
        status: Option<ModerationStatus>,
    ) -> Result<Vec<ClubManagerApplication>, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        let mut applications: Vec<_> = state
            .applications
            .values()
            .filter(|application| status.is_none_or(|wanted| application.status == wanted))
            .cloned()
            .collect();
        applications.sort_by_key(|application| application.applied_at);
        Ok(applications)
    }

    async fn set_application_status(
        &self,
        id: &ApplicationId,
        status: ModerationStatus,
        approved_at: Option<DateTime<Utc>>,
    ) -> Result<(), BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        let application = state
            .applications
            .get_mut(id)
            .ok_or_else(|| missing("application", id))?;
        application.status = status;
        application.approved_at = approved_at;
        Ok(())
    }
}

#[async_trait]
impl PaymentLedger for InMemoryBackend {
    async fn record_payment(&self, payment: &NewPayment) -> Result<Payment, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        if let Some(existing) = state
            .payments
            .iter()
            .find(|recorded| recorded.idempotency_key.as_ref() == Some(&payment.idempotency_key))
        {
            return Ok(existing.clone());
        }
        let recorded = Payment {
            id: PaymentId::generate(),
            user_email: payment.user_email.clone(),
            amount: payment.amount,
            target: payment.target.clone(),
            payment_method: payment.payment_method.clone(),
            transaction_id: payment.transaction_id.clone(),
            idempotency_key: Some(payment.idempotency_key.clone()),
            created_at: Some(self.clock.utc()),
        };
        state.payments.push(recorded.clone());
        Ok(recorded)
    }

    async fn payments_for_user(&self, email: &Email) -> Result<Vec<Payment>, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        Ok(state
            .payments
            .iter()
            .filter(|payment| &payment.user_email == email)
            .cloned()
            .collect())
    }

    async fn all_payments(&self) -> Result<Vec<Payment>, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        Ok(state.payments.clone())
    }
}

#[async_trait]
impl StatsQuery for InMemoryBackend {
    async fn platform_stats(&self) -> Result<PlatformStats, BackendError> {
        let mut state = self.state();
        state.take_failure()?;
        Ok(PlatformStats {
            total_revenue: state.payments.iter().map(|payment| payment.amount).sum(),
            total_users: count(state.users.values()),
            total_clubs: count(state.clubs.values()),
            total_events: count(state.events.values()),
        })
    }
}

#[cfg(test)]
mod tests {
    //! Uniqueness contract coverage.

    use super::*;
    use crate::domain::idempotency::IdempotencyKey;
    use crate::domain::{JoinPolicy, Money, PaymentTarget};
    use crate::test_support::fixtures::{club, club_id, email, fixture_clock, fixture_now};

    fn backend() -> InMemoryBackend {
        InMemoryBackend::new(fixture_clock())
    }

    fn new_club(name: &str) -> NewClub {
        NewClub {
            name: name.to_owned(),
            description: String::new(),
            category: "Sports".to_owned(),
            location: "Harbour".to_owned(),
            banner_image: None,
            membership_fee: Money::ZERO,
            join_policy: JoinPolicy::Open,
        }
    }

    #[tokio::test]
    async fn club_names_are_unique_ignoring_case() {
        let backend = backend();
        backend
            .create_club(&email("ann@example.com"), &new_club("Chess Club"))
            .await
            .expect("created");

        let error = backend
            .create_club(&email("bob@example.com"), &new_club("chess club "))
            .await
            .expect_err("duplicate");

        assert!(error.is_conflict());
    }

    #[tokio::test]
    async fn rejected_memberships_do_not_block_a_new_one() {
        let backend = backend();
        let request = NewMembership {
            user_email: email("ann@example.com"),
            club_id: club_id("c1"),
            status: MembershipStatus::Pending,
            payment_id: None,
            joined_at: fixture_now(),
        };
        let first = backend.create_membership(&request).await.expect("created");
        assert!(
            backend
                .create_membership(&request)
                .await
                .expect_err("live duplicate")
                .is_conflict()
        );

        backend
            .set_membership_status(&first.id, MembershipStatus::Rejected)
            .await
            .expect("rejected");

        backend
            .create_membership(&request)
            .await
            .expect("rejoin after rejection");
    }

    #[tokio::test]
    async fn payments_replay_on_the_same_key() {
        let backend = backend();
        let payment = NewPayment {
            user_email: email("ann@example.com"),
            amount: Money::from_major(50),
            target: PaymentTarget::Membership {
                club_id: club_id("c1"),
            },
            payment_method: "card".to_owned(),
            transaction_id: "pi_123".to_owned(),
            idempotency_key: IdempotencyKey::random(),
        };

        let first = backend.record_payment(&payment).await.expect("recorded");
        let replay = backend.record_payment(&payment).await.expect("replayed");

        assert_eq!(first.id, replay.id);
        assert_eq!(backend.payments().len(), 1);
    }

    #[tokio::test]
    async fn queued_failures_are_consumed_once() {
        let backend = backend();
        backend.fail_next(BackendError::connection("refused"));

        assert!(backend.find_club(&club_id("c1")).await.is_err());
        assert!(backend.find_club(&club_id("c1")).await.is_ok());
    }

    #[tokio::test]
    async fn club_stats_count_members_and_revenue() {
        let backend = backend();
        backend.insert_club(club(
            "c1",
            "ann@example.com",
            ModerationStatus::Approved,
            Money::from_major(50),
        ));
        for (who, status) in [
            ("bob@example.com", MembershipStatus::Active),
            ("cat@example.com", MembershipStatus::Pending),
        ] {
            backend
                .create_membership(&NewMembership {
                    user_email: email(who),
                    club_id: club_id("c1"),
                    status,
                    payment_id: None,
                    joined_at: fixture_now(),
                })
                .await
                .expect("created");
        }

        let stats = backend.club_stats(&club_id("c1")).await.expect("stats");

        assert_eq!((stats.members_total, stats.members_pending), (1, 1));
        assert_eq!(stats.revenue, Money::ZERO);
    }
}
