//! Backend resource port implementations over [`RestBackend`].
//!
//! Filters are sent as query parameters and applied again to the decoded
//! rows, so a backend that ignores a parameter cannot widen a result.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use tracing::debug;

use super::client::RestBackend;
use super::dto::{
    AccessBody, ApplicationDto, ApplicationStatusBody, ClubDto, ClubPatchBody, ClubStatsDto,
    EventDto, EventPatchBody, InsertedDto, MembershipDto, NewApplicationBody, NewClubBody,
    NewEventBody, NewMembershipBody, NewPaymentBody, NewRegistrationBody, NewUserBody,
    PaymentDto, PlatformStatsDto, ProfileBody, RegistrationDto, StatusBody, UserDto,
    WriteResultDto,
};
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

const USERS: &str = "users";
const CLUBS: &str = "clubs";
const EVENTS: &str = "events";
const MEMBERSHIPS: &str = "memberships";
const REGISTRATIONS: &str = "event-registrations";
const APPLICATIONS: &str = "club-managers";
const PAYMENTS: &str = "payments";
const ADMIN: &str = "admin";

fn decoded<T>(result: Result<T, String>) -> Result<T, BackendError> {
    result.map_err(BackendError::decode)
}

fn inserted_id(ack: InsertedDto, resource: &str) -> Result<String, BackendError> {
    decoded(ack.into_id(resource))
}

fn parse_id<T, E: std::fmt::Display>(
    raw: String,
    parse: impl FnOnce(String) -> Result<T, E>,
) -> Result<T, BackendError> {
    parse(raw).map_err(|error| BackendError::decode(format!("invalid insertedId: {error}")))
}

/// Reject updates the backend reports as matching nothing.
fn ensure_matched(outcome: &WriteResultDto, resource: &str, id: &str) -> Result<(), BackendError> {
    if outcome.matched_count == Some(0) {
        return Err(BackendError::not_found(format!("{resource} {id}")));
    }
    Ok(())
}

#[async_trait]
impl UserDirectory for RestBackend {
    async fn create_user(&self, user: &User) -> Result<(), BackendError> {
        let _: InsertedDto = self
            .send_json(Method::POST, &[USERS], &NewUserBody::from(user))
            .await?;
        Ok(())
    }

    async fn find_user(&self, email: &Email) -> Result<Option<User>, BackendError> {
        let found: Option<UserDto> = self.get_optional(&[USERS, email.as_ref()]).await?;
        Ok(found.map(UserDto::into_domain))
    }

    async fn list_users(&self, search: Option<String>) -> Result<Vec<User>, BackendError> {
        let query = search
            .map(|term| vec![("search", term)])
            .unwrap_or_default();
        let rows: Vec<UserDto> = self.get(&[USERS], &query).await?;
        Ok(rows.into_iter().map(UserDto::into_domain).collect())
    }

    async fn update_access(
        &self,
        email: &Email,
        update: AccessUpdate,
    ) -> Result<(), BackendError> {
        let body = AccessBody {
            role: update.role,
            status: update.status,
        };
        let outcome: WriteResultDto = self
            .send_json(Method::PATCH, &[USERS, ADMIN, email.as_ref()], &body)
            .await?;
        ensure_matched(&outcome, "user", email.as_ref())
    }

    async fn update_profile(
        &self,
        email: &Email,
        patch: &ProfilePatch,
    ) -> Result<(), BackendError> {
        let outcome: WriteResultDto = self
            .send_json(
                Method::PATCH,
                &[USERS, email.as_ref()],
                &ProfileBody::from(patch),
            )
            .await?;
        ensure_matched(&outcome, "user", email.as_ref())
    }
}

fn club_query_params(query: &ClubQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(status) = query.status {
        params.push(("status", status.as_str().to_owned()));
    }
    if let Some(search) = &query.search {
        params.push(("search", search.clone()));
    }
    if let Some(category) = &query.category {
        params.push(("category", category.clone()));
    }
    if let Some(owner) = &query.owner {
        params.push(("email", owner.to_string()));
    }
    if let Some(sort) = query.sort {
        params.push(("sort", sort.as_query_value().to_owned()));
    }
    params
}

#[async_trait]
impl ClubRepository for RestBackend {
    async fn create_club(&self, owner: &Email, club: &NewClub) -> Result<Club, BackendError> {
        let ack: InsertedDto = self
            .send_json(Method::POST, &[CLUBS], &NewClubBody::new(owner, club))
            .await?;
        let id = parse_id(inserted_id(ack, "club")?, ClubId::new)?;
        Ok(Club {
            id,
            name: club.name.clone(),
            description: club.description.clone(),
            category: club.category.clone(),
            location: club.location.clone(),
            banner_image: club.banner_image.clone(),
            membership_fee: club.membership_fee,
            owner_email: owner.clone(),
            status: ModerationStatus::Pending,
            join_policy: club.join_policy,
            created_at: None,
        })
    }

    async fn find_club(&self, id: &ClubId) -> Result<Option<Club>, BackendError> {
        let found: Option<ClubDto> = self.get_optional(&[CLUBS, id.as_str()]).await?;
        found.map(|dto| decoded(dto.into_domain())).transpose()
    }

    async fn list_clubs(&self, query: &ClubQuery) -> Result<Vec<Club>, BackendError> {
        let rows: Vec<ClubDto> = self.get(&[CLUBS], &club_query_params(query)).await?;
        let mut clubs = rows
            .into_iter()
            .map(|dto| decoded(dto.into_domain()))
            .collect::<Result<Vec<_>, _>>()?;
        clubs.retain(|club| query.matches(club));
        query.sort.unwrap_or_default().sort(&mut clubs);
        Ok(clubs)
    }

    async fn set_club_status(
        &self,
        id: &ClubId,
        status: ModerationStatus,
    ) -> Result<(), BackendError> {
        let outcome: WriteResultDto = self
            .send_json(Method::PATCH, &[CLUBS, id.as_str()], &StatusBody { status })
            .await?;
        ensure_matched(&outcome, "club", id.as_str())
    }

    async fn update_club(&self, id: &ClubId, patch: &ClubPatch) -> Result<(), BackendError> {
        let outcome: WriteResultDto = self
            .send_json(
                Method::PATCH,
                &[CLUBS, id.as_str()],
                &ClubPatchBody::from(patch),
            )
            .await?;
        ensure_matched(&outcome, "club", id.as_str())
    }

    async fn club_stats(&self, id: &ClubId) -> Result<ClubStats, BackendError> {
        let stats: ClubStatsDto = self
            .get(&[CLUBS, id.as_str(), "manager-stats"], &[])
            .await?;
        decoded(stats.into_domain())
    }
}

fn event_query_params(query: &EventQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(status) = query.status {
        params.push(("status", status.as_str().to_owned()));
    }
    if let Some(club_id) = &query.club_id {
        params.push(("clubId", club_id.to_string()));
    }
    params
}

#[async_trait]
impl EventRepository for RestBackend {
    async fn create_event(&self, event: &NewEvent) -> Result<Event, BackendError> {
        let ack: InsertedDto = self
            .send_json(Method::POST, &[EVENTS], &NewEventBody::from(event))
            .await?;
        let id = parse_id(inserted_id(ack, "event")?, EventId::new)?;
        Ok(Event {
            id,
            club_id: event.club_id.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            event_date: event.event_date,
            location: event.location.clone(),
            is_paid: event.is_paid,
            event_fee: event.event_fee,
            max_attendees: event.max_attendees,
            status: ModerationStatus::Pending,
            created_at: None,
        })
    }

    async fn find_event(&self, id: &EventId) -> Result<Option<Event>, BackendError> {
        let found: Option<EventDto> = self.get_optional(&[EVENTS, id.as_str()]).await?;
        found.map(|dto| decoded(dto.into_domain())).transpose()
    }

    async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>, BackendError> {
        let rows: Vec<EventDto> = self.get(&[EVENTS], &event_query_params(query)).await?;
        let mut events = rows
            .into_iter()
            .map(|dto| decoded(dto.into_domain()))
            .collect::<Result<Vec<_>, _>>()?;
        events.retain(|event| query.matches(event));
        events.sort_by(|left, right| left.event_date.cmp(&right.event_date));
        Ok(events)
    }

    async fn set_event_status(
        &self,
        id: &EventId,
        status: ModerationStatus,
    ) -> Result<(), BackendError> {
        let outcome: WriteResultDto = self
            .send_json(Method::PATCH, &[EVENTS, id.as_str()], &StatusBody { status })
            .await?;
        ensure_matched(&outcome, "event", id.as_str())
    }

    async fn update_event(&self, id: &EventId, patch: &EventPatch) -> Result<(), BackendError> {
        let outcome: WriteResultDto = self
            .send_json(
                Method::PATCH,
                &[EVENTS, id.as_str()],
                &EventPatchBody::from(patch),
            )
            .await?;
        ensure_matched(&outcome, "event", id.as_str())
    }

    async fn delete_event(&self, id: &EventId) -> Result<u64, BackendError> {
        match self.delete::<WriteResultDto>(&[EVENTS, id.as_str()]).await {
            Ok(outcome) => Ok(outcome.deleted_count.unwrap_or(1)),
            Err(BackendError::NotFound { .. }) => Ok(0),
            Err(error) => Err(error),
        }
    }
}

#[async_trait]
impl MembershipRepository for RestBackend {
    async fn create_membership(
        &self,
        membership: &NewMembership,
    ) -> Result<Membership, BackendError> {
        let ack: InsertedDto = self
            .send_json(
                Method::POST,
                &[MEMBERSHIPS],
                &NewMembershipBody::from(membership),
            )
            .await?;
        let id = parse_id(inserted_id(ack, "membership")?, MembershipId::new)?;
        Ok(Membership {
            id,
            user_email: membership.user_email.clone(),
            club_id: membership.club_id.clone(),
            status: membership.status,
            payment_id: membership.payment_id.clone(),
            joined_at: membership.joined_at,
        })
    }

    async fn find_membership(
        &self,
        id: &MembershipId,
    ) -> Result<Option<Membership>, BackendError> {
        let found: Option<MembershipDto> =
            self.get_optional(&[MEMBERSHIPS, id.as_str()]).await?;
        Ok(found.map(MembershipDto::into_domain))
    }

    async fn memberships_for_user(&self, email: &Email) -> Result<Vec<Membership>, BackendError> {
        let rows: Vec<MembershipDto> = self
            .get(&[MEMBERSHIPS], &[("email", email.to_string())])
            .await?;
        Ok(rows
            .into_iter()
            .map(MembershipDto::into_domain)
            .filter(|membership| &membership.user_email == email)
            .collect())
    }

    async fn memberships_for_club(
        &self,
        club_id: &ClubId,
    ) -> Result<Vec<Membership>, BackendError> {
        let rows: Vec<MembershipDto> = self
            .get(&[MEMBERSHIPS], &[("clubId", club_id.to_string())])
            .await?;
        Ok(rows
            .into_iter()
            .map(MembershipDto::into_domain)
            .filter(|membership| &membership.club_id == club_id)
            .collect())
    }

    async fn set_membership_status(
        &self,
        id: &MembershipId,
        status: MembershipStatus,
    ) -> Result<(), BackendError> {
        let outcome: WriteResultDto = self
            .send_json(
                Method::PATCH,
                &[MEMBERSHIPS, id.as_str()],
                &StatusBody { status },
            )
            .await?;
        ensure_matched(&outcome, "membership", id.as_str())
    }

    async fn delete_membership(&self, id: &MembershipId) -> Result<u64, BackendError> {
        match self
            .delete::<WriteResultDto>(&[MEMBERSHIPS, id.as_str()])
            .await
        {
            Ok(outcome) => Ok(outcome.deleted_count.unwrap_or(1)),
            Err(BackendError::NotFound { .. }) => Ok(0),
            Err(error) => Err(error),
        }
    }
}

#[async_trait]
impl RegistrationRepository for RestBackend {
    async fn create_registration(
        &self,
        registration: &NewRegistration,
    ) -> Result<EventRegistration, BackendError> {
        let ack: InsertedDto = self
            .send_json(
                Method::POST,
                &[REGISTRATIONS],
                &NewRegistrationBody::from(registration),
            )
            .await?;
        let id = parse_id(inserted_id(ack, "registration")?, RegistrationId::new)?;
        Ok(EventRegistration {
            id,
            user_email: registration.user_email.clone(),
            event_id: registration.event_id.clone(),
            club_id: registration.club_id.clone(),
            status: RegistrationStatus::Registered,
            payment_id: registration.payment_id.clone(),
            registered_at: registration.registered_at,
        })
    }

    async fn find_registration(
        &self,
        id: &RegistrationId,
    ) -> Result<Option<EventRegistration>, BackendError> {
        let found: Option<RegistrationDto> =
            self.get_optional(&[REGISTRATIONS, id.as_str()]).await?;
        Ok(found.map(RegistrationDto::into_domain))
    }

    async fn registrations_for_user(
        &self,
        email: &Email,
    ) -> Result<Vec<EventRegistration>, BackendError> {
        let rows: Vec<RegistrationDto> = self
            .get(&[REGISTRATIONS], &[("email", email.to_string())])
            .await?;
        Ok(rows
            .into_iter()
            .map(RegistrationDto::into_domain)
            .filter(|registration| &registration.user_email == email)
            .collect())
    }

    async fn registrations_for_event(
        &self,
        event_id: &EventId,
    ) -> Result<Vec<EventRegistration>, BackendError> {
        let rows: Vec<RegistrationDto> = self
            .get(&[REGISTRATIONS], &[("eventId", event_id.to_string())])
            .await?;
        Ok(rows
            .into_iter()
            .map(RegistrationDto::into_domain)
            .filter(|registration| &registration.event_id == event_id)
            .collect())
    }

    async fn set_registration_status(
        &self,
        id: &RegistrationId,
        status: RegistrationStatus,
    ) -> Result<(), BackendError> {
        let outcome: WriteResultDto = self
            .send_json(
                Method::PATCH,
                &[REGISTRATIONS, id.as_str()],
                &StatusBody { status },
            )
            .await?;
        ensure_matched(&outcome, "registration", id.as_str())
    }
}

#[async_trait]
impl ApplicationRepository for RestBackend {
    async fn create_application(
        &self,
        application: &NewApplication,
    ) -> Result<ClubManagerApplication, BackendError> {
        let ack: InsertedDto = self
            .send_json(
                Method::POST,
                &[APPLICATIONS],
                &NewApplicationBody::from(application),
            )
            .await?;
        let id = parse_id(inserted_id(ack, "application")?, ApplicationId::new)?;
        Ok(ClubManagerApplication {
            id,
            applicant_email: application.applicant_email.clone(),
            name: application.name.clone(),
            reason: application.reason.clone(),
            photo_url: application.photo_url.clone(),
            status: ModerationStatus::Pending,
            applied_at: application.applied_at,
            approved_at: None,
        })
    }

    async fn find_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<ClubManagerApplication>, BackendError> {
        let found: Option<ApplicationDto> =
            self.get_optional(&[APPLICATIONS, id.as_str()]).await?;
        Ok(found.map(ApplicationDto::into_domain))
    }

    async fn list_applications(
        &self,
        status: Option<ModerationStatus>,
    ) -> Result<Vec<ClubManagerApplication>, BackendError> {
        let query = status
            .map(|wanted| vec![("status", wanted.as_str().to_owned())])
            .unwrap_or_default();
        let rows: Vec<ApplicationDto> = self.get(&[APPLICATIONS], &query).await?;
        Ok(rows
            .into_iter()
            .map(ApplicationDto::into_domain)
            .filter(|application| status.is_none_or(|wanted| application.status == wanted))
            .collect())
    }

    async fn set_application_status(
        &self,
        id: &ApplicationId,
        status: ModerationStatus,
        approved_at: Option<DateTime<Utc>>,
    ) -> Result<(), BackendError> {
        let outcome: WriteResultDto = self
            .send_json(
                Method::PATCH,
                &[APPLICATIONS, id.as_str()],
                &ApplicationStatusBody {
                    status,
                    approved_at,
                },
            )
            .await?;
        ensure_matched(&outcome, "application", id.as_str())
    }
}

/// The stored payment an insert collided with, matched by idempotency key.
/// The conflict stands when no stored payment carries the key.
fn replayed_payment(
    conflict: BackendError,
    payment: &NewPayment,
    recorded: Vec<Payment>,
) -> Result<Payment, BackendError> {
    recorded
        .into_iter()
        .find(|existing| existing.idempotency_key.as_ref() == Some(&payment.idempotency_key))
        .ok_or(conflict)
}

#[async_trait]
impl PaymentLedger for RestBackend {
    async fn record_payment(&self, payment: &NewPayment) -> Result<Payment, BackendError> {
        let sent: Result<InsertedDto, BackendError> = self
            .send_json(Method::POST, &[PAYMENTS], &NewPaymentBody::from(payment))
            .await;
        let ack = match sent {
            Ok(ack) => ack,
            Err(error) if error.is_conflict() => {
                let recorded = self.payments_for_user(&payment.user_email).await?;
                let existing = replayed_payment(error, payment, recorded)?;
                debug!(payment_id = %existing.id, "payment already recorded under this key");
                return Ok(existing);
            }
            Err(error) => return Err(error),
        };
        let id = parse_id(inserted_id(ack, "payment")?, PaymentId::new)?;
        Ok(Payment {
            id,
            user_email: payment.user_email.clone(),
            amount: payment.amount,
            target: payment.target.clone(),
            payment_method: payment.payment_method.clone(),
            transaction_id: payment.transaction_id.clone(),
            idempotency_key: Some(payment.idempotency_key.clone()),
            created_at: None,
        })
    }

    async fn payments_for_user(&self, email: &Email) -> Result<Vec<Payment>, BackendError> {
        let rows: Vec<PaymentDto> = self
            .get(&[PAYMENTS], &[("email", email.to_string())])
            .await?;
        let payments = rows
            .into_iter()
            .map(|dto| decoded(dto.into_domain()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(payments
            .into_iter()
            .filter(|payment| &payment.user_email == email)
            .collect())
    }

    async fn all_payments(&self) -> Result<Vec<Payment>, BackendError> {
        let rows: Vec<PaymentDto> = self.get(&[ADMIN, PAYMENTS], &[]).await?;
        rows.into_iter()
            .map(|dto| decoded(dto.into_domain()))
            .collect()
    }
}

#[async_trait]
impl StatsQuery for RestBackend {
    async fn platform_stats(&self) -> Result<PlatformStats, BackendError> {
        let stats: PlatformStatsDto = self.get(&[ADMIN, "stats"], &[]).await?;
        decoded(stats.into_domain())
    }
}
