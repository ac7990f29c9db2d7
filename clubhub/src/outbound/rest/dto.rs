//! DTOs for the backend REST resources.
//!
//! The adapter decodes into these transport DTOs first, then maps into domain
//! records in one pass. Identifiers accept the backend's `_id` spelling and
//! money travels as JSON numbers in major units.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::idempotency::IdempotencyKey;
use crate::domain::{
    AccountStatus, ApplicationId, Club, ClubId, ClubManagerApplication, ClubPatch, ClubStats,
    DisplayName, Email, Event, EventId, EventPatch, EventRegistration, JoinPolicy, Membership,
    MembershipId, MembershipStatus, ModerationStatus, Money, NewApplication, NewClub, NewEvent,
    NewMembership, NewPayment, NewRegistration, Payment, PaymentId, PaymentTarget, PlatformStats,
    ProfilePatch, RegistrationId, RegistrationStatus, Role, User, parse_image_url,
};

/// Amount as sent by the backend. Older records store form input verbatim,
/// so numeric strings are accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum AmountDto {
    Number(f64),
    Text(String),
}

impl Default for AmountDto {
    fn default() -> Self {
        Self::Number(0.0)
    }
}

impl AmountDto {
    fn into_money(self, field: &str) -> Result<Money, String> {
        let major = match self {
            Self::Number(value) => value,
            Self::Text(raw) if raw.trim().is_empty() => return Ok(Money::ZERO),
            Self::Text(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|error| format!("{field} is not a number: {error}"))?,
        };
        Money::try_from_major_f64(major).map_err(|error| format!("{field}: {error}"))
    }
}

fn optional_url(raw: Option<String>) -> Option<Url> {
    raw.as_deref()
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .and_then(|trimmed| parse_image_url(trimmed).ok())
}

fn display_name_or_default(raw: Option<String>, email: &Email) -> DisplayName {
    raw.and_then(|name| DisplayName::new(name).ok())
        .unwrap_or_else(|| DisplayName::from_email(email))
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserDto {
    email: Email,
    #[serde(default, alias = "displayName")]
    name: Option<String>,
    #[serde(default, rename = "photoURL", alias = "photoUrl")]
    photo_url: Option<String>,
    #[serde(default)]
    role: Role,
    #[serde(default)]
    status: AccountStatus,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl UserDto {
    pub(super) fn into_domain(self) -> User {
        let display_name = display_name_or_default(self.name, &self.email);
        User {
            email: self.email,
            display_name,
            photo_url: optional_url(self.photo_url),
            role: self.role,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ClubDto {
    #[serde(rename = "_id", alias = "id")]
    id: ClubId,
    club_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    banner_image: Option<String>,
    #[serde(default)]
    membership_fee: AmountDto,
    #[serde(alias = "managerEmail")]
    user_email: Email,
    #[serde(default)]
    status: ModerationStatus,
    #[serde(default)]
    join_policy: JoinPolicy,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl ClubDto {
    pub(super) fn into_domain(self) -> Result<Club, String> {
        let membership_fee = self
            .membership_fee
            .into_money("membershipFee")
            .map_err(|error| format!("club {}: {error}", self.id))?;
        Ok(Club {
            id: self.id,
            name: self.club_name,
            description: self.description,
            category: self.category,
            location: self.location,
            banner_image: optional_url(self.banner_image),
            membership_fee,
            owner_email: self.user_email,
            status: self.status,
            join_policy: self.join_policy,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct CountsDto {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    pending: u64,
    #[serde(default)]
    upcoming: u64,
}

#[derive(Debug, Deserialize)]
pub(super) struct ClubStatsDto {
    #[serde(default)]
    revenue: AmountDto,
    #[serde(default)]
    members: CountsDto,
    #[serde(default)]
    events: CountsDto,
}

impl ClubStatsDto {
    pub(super) fn into_domain(self) -> Result<ClubStats, String> {
        Ok(ClubStats {
            revenue: self.revenue.into_money("revenue")?,
            members_total: self.members.total,
            members_pending: self.members.pending,
            events_upcoming: self.events.upcoming,
            events_total: self.events.total,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PlatformStatsDto {
    #[serde(default)]
    total_revenue: AmountDto,
    #[serde(default)]
    total_users: u64,
    #[serde(default)]
    total_clubs: u64,
    #[serde(default)]
    total_events: u64,
}

impl PlatformStatsDto {
    pub(super) fn into_domain(self) -> Result<PlatformStats, String> {
        Ok(PlatformStats {
            total_revenue: self.total_revenue.into_money("totalRevenue")?,
            total_users: self.total_users,
            total_clubs: self.total_clubs,
            total_events: self.total_events,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MembershipDto {
    #[serde(rename = "_id", alias = "id")]
    id: MembershipId,
    user_email: Email,
    club_id: ClubId,
    status: MembershipStatus,
    #[serde(default)]
    payment_id: Option<PaymentId>,
    joined_at: DateTime<Utc>,
}

impl MembershipDto {
    pub(super) fn into_domain(self) -> Membership {
        Membership {
            id: self.id,
            user_email: self.user_email,
            club_id: self.club_id,
            status: self.status,
            payment_id: self.payment_id,
            joined_at: self.joined_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EventDto {
    #[serde(rename = "_id", alias = "id")]
    id: EventId,
    club_id: ClubId,
    #[serde(alias = "title")]
    event_title: String,
    #[serde(default)]
    description: String,
    #[serde(alias = "date")]
    event_date: NaiveDate,
    #[serde(default)]
    location: String,
    #[serde(default)]
    is_paid: bool,
    #[serde(default)]
    event_fee: AmountDto,
    #[serde(default)]
    max_attendees: Option<u32>,
    #[serde(default)]
    status: ModerationStatus,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl EventDto {
    pub(super) fn into_domain(self) -> Result<Event, String> {
        let event_fee = self
            .event_fee
            .into_money("eventFee")
            .map_err(|error| format!("event {}: {error}", self.id))?;
        Ok(Event {
            id: self.id,
            club_id: self.club_id,
            title: self.event_title,
            description: self.description,
            event_date: self.event_date,
            location: self.location,
            is_paid: self.is_paid,
            event_fee,
            max_attendees: self.max_attendees.filter(|max| *max > 0),
            status: self.status,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RegistrationDto {
    #[serde(rename = "_id", alias = "id")]
    id: RegistrationId,
    user_email: Email,
    event_id: EventId,
    club_id: ClubId,
    status: RegistrationStatus,
    #[serde(default)]
    payment_id: Option<PaymentId>,
    registered_at: DateTime<Utc>,
}

impl RegistrationDto {
    pub(super) fn into_domain(self) -> EventRegistration {
        EventRegistration {
            id: self.id,
            user_email: self.user_email,
            event_id: self.event_id,
            club_id: self.club_id,
            status: self.status,
            payment_id: self.payment_id,
            registered_at: self.registered_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ApplicationDto {
    #[serde(rename = "_id", alias = "id")]
    id: ApplicationId,
    #[serde(alias = "applicantEmail")]
    email: Email,
    name: String,
    #[serde(default)]
    reason: String,
    #[serde(default, rename = "photoURL", alias = "photoUrl")]
    photo_url: Option<String>,
    #[serde(default)]
    status: ModerationStatus,
    applied_at: DateTime<Utc>,
    #[serde(default)]
    approved_at: Option<DateTime<Utc>>,
}

impl ApplicationDto {
    pub(super) fn into_domain(self) -> ClubManagerApplication {
        ClubManagerApplication {
            id: self.id,
            applicant_email: self.email,
            name: self.name,
            reason: self.reason,
            photo_url: optional_url(self.photo_url),
            status: self.status,
            applied_at: self.applied_at,
            approved_at: self.approved_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PaymentKindDto {
    Membership,
    Event,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PaymentDto {
    #[serde(rename = "_id", alias = "id")]
    id: PaymentId,
    user_email: Email,
    amount: AmountDto,
    #[serde(rename = "type")]
    kind: PaymentKindDto,
    club_id: ClubId,
    #[serde(default)]
    event_id: Option<EventId>,
    #[serde(default)]
    payment_method: Option<String>,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    idempotency_key: Option<IdempotencyKey>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl PaymentDto {
    pub(super) fn into_domain(self) -> Result<Payment, String> {
        let amount = self
            .amount
            .into_money("amount")
            .map_err(|error| format!("payment {}: {error}", self.id))?;
        let target = match (self.kind, self.event_id) {
            (PaymentKindDto::Membership, _) => PaymentTarget::Membership {
                club_id: self.club_id,
            },
            (PaymentKindDto::Event, Some(event_id)) => PaymentTarget::Event {
                event_id,
                club_id: self.club_id,
            },
            (PaymentKindDto::Event, None) => {
                return Err(format!("event payment {} has no eventId", self.id));
            }
        };
        Ok(Payment {
            id: self.id,
            user_email: self.user_email,
            amount,
            target,
            payment_method: self.payment_method.unwrap_or_default(),
            transaction_id: self.transaction_id.unwrap_or_default(),
            idempotency_key: self.idempotency_key,
            created_at: self.created_at,
        })
    }
}

/// Acknowledgement of an insert.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct InsertedDto {
    #[serde(default)]
    inserted_id: Option<String>,
}

impl InsertedDto {
    pub(super) fn into_id(self, resource: &str) -> Result<String, String> {
        self.inserted_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| format!("{resource} insert returned no insertedId"))
    }
}

/// Acknowledgement of an update or delete.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WriteResultDto {
    #[serde(default)]
    pub(super) matched_count: Option<u64>,
    #[serde(default)]
    pub(super) deleted_count: Option<u64>,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NewUserBody<'a> {
    name: &'a str,
    email: &'a str,
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    photo_url: Option<&'a str>,
    role: Role,
    status: AccountStatus,
}

impl<'a> From<&'a User> for NewUserBody<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            name: user.display_name.as_ref(),
            email: user.email.as_ref(),
            photo_url: user.photo_url.as_ref().map(Url::as_str),
            role: user.role,
            status: user.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct AccessBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) status: Option<AccountStatus>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProfileBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    photo_url: Option<&'a str>,
}

impl<'a> From<&'a ProfilePatch> for ProfileBody<'a> {
    fn from(patch: &'a ProfilePatch) -> Self {
        Self {
            name: patch.display_name.as_ref().map(AsRef::as_ref),
            photo_url: patch.photo_url.as_ref().map(Url::as_str),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NewClubBody<'a> {
    club_name: &'a str,
    description: &'a str,
    category: &'a str,
    location: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    banner_image: Option<&'a str>,
    membership_fee: f64,
    join_policy: JoinPolicy,
    user_email: &'a str,
    status: ModerationStatus,
}

impl<'a> NewClubBody<'a> {
    pub(super) fn new(owner: &'a Email, club: &'a NewClub) -> Self {
        Self {
            club_name: &club.name,
            description: &club.description,
            category: &club.category,
            location: &club.location,
            banner_image: club.banner_image.as_ref().map(Url::as_str),
            membership_fee: club.membership_fee.to_major_f64(),
            join_policy: club.join_policy,
            user_email: owner.as_ref(),
            status: ModerationStatus::Pending,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ClubPatchBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    club_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    banner_image: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    membership_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    join_policy: Option<JoinPolicy>,
}

impl<'a> From<&'a ClubPatch> for ClubPatchBody<'a> {
    fn from(patch: &'a ClubPatch) -> Self {
        Self {
            club_name: patch.name.as_deref(),
            description: patch.description.as_deref(),
            category: patch.category.as_deref(),
            location: patch.location.as_deref(),
            banner_image: patch.banner_image.as_ref().map(Url::as_str),
            membership_fee: patch.membership_fee.map(Money::to_major_f64),
            join_policy: patch.join_policy,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct StatusBody<S> {
    pub(super) status: S,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ApplicationStatusBody {
    pub(super) status: ModerationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) approved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NewMembershipBody<'a> {
    user_email: &'a str,
    club_id: &'a str,
    status: MembershipStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_id: Option<&'a str>,
    joined_at: DateTime<Utc>,
}

impl<'a> From<&'a NewMembership> for NewMembershipBody<'a> {
    fn from(membership: &'a NewMembership) -> Self {
        Self {
            user_email: membership.user_email.as_ref(),
            club_id: membership.club_id.as_str(),
            status: membership.status,
            payment_id: membership.payment_id.as_ref().map(PaymentId::as_str),
            joined_at: membership.joined_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NewEventBody<'a> {
    club_id: &'a str,
    event_title: &'a str,
    description: &'a str,
    event_date: NaiveDate,
    location: &'a str,
    is_paid: bool,
    event_fee: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_attendees: Option<u32>,
    status: ModerationStatus,
}

impl<'a> From<&'a NewEvent> for NewEventBody<'a> {
    fn from(event: &'a NewEvent) -> Self {
        Self {
            club_id: event.club_id.as_str(),
            event_title: &event.title,
            description: &event.description,
            event_date: event.event_date,
            location: &event.location,
            is_paid: event.is_paid,
            event_fee: event.event_fee.to_major_f64(),
            max_attendees: event.max_attendees,
            status: ModerationStatus::Pending,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EventPatchBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    event_title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_attendees: Option<u32>,
}

impl<'a> From<&'a EventPatch> for EventPatchBody<'a> {
    fn from(patch: &'a EventPatch) -> Self {
        Self {
            event_title: patch.title.as_deref(),
            description: patch.description.as_deref(),
            location: patch.location.as_deref(),
            event_date: patch.event_date,
            max_attendees: patch.max_attendees,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NewRegistrationBody<'a> {
    user_email: &'a str,
    event_id: &'a str,
    club_id: &'a str,
    status: RegistrationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_id: Option<&'a str>,
    registered_at: DateTime<Utc>,
}

impl<'a> From<&'a NewRegistration> for NewRegistrationBody<'a> {
    fn from(registration: &'a NewRegistration) -> Self {
        Self {
            user_email: registration.user_email.as_ref(),
            event_id: registration.event_id.as_str(),
            club_id: registration.club_id.as_str(),
            status: RegistrationStatus::Registered,
            payment_id: registration.payment_id.as_ref().map(PaymentId::as_str),
            registered_at: registration.registered_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NewApplicationBody<'a> {
    email: &'a str,
    name: &'a str,
    reason: &'a str,
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    photo_url: Option<&'a str>,
    status: ModerationStatus,
    applied_at: DateTime<Utc>,
}

impl<'a> From<&'a NewApplication> for NewApplicationBody<'a> {
    fn from(application: &'a NewApplication) -> Self {
        Self {
            email: application.applicant_email.as_ref(),
            name: &application.name,
            reason: &application.reason,
            photo_url: application.photo_url.as_ref().map(Url::as_str),
            status: ModerationStatus::Pending,
            applied_at: application.applied_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NewPaymentBody<'a> {
    user_email: &'a str,
    amount: f64,
    #[serde(rename = "type")]
    kind: &'static str,
    club_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_id: Option<&'a str>,
    status: &'static str,
    payment_method: &'a str,
    transaction_id: &'a str,
    idempotency_key: &'a IdempotencyKey,
}

impl<'a> From<&'a NewPayment> for NewPaymentBody<'a> {
    fn from(payment: &'a NewPayment) -> Self {
        let event_id = match &payment.target {
            PaymentTarget::Event { event_id, .. } => Some(event_id.as_str()),
            PaymentTarget::Membership { .. } => None,
        };
        Self {
            user_email: payment.user_email.as_ref(),
            amount: payment.amount.to_major_f64(),
            kind: payment.target.kind(),
            club_id: payment.target.club_id().as_str(),
            event_id,
            status: "completed",
            payment_method: &payment.payment_method,
            transaction_id: &payment.transaction_id,
            idempotency_key: &payment.idempotency_key,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Decoding coverage for backend payload quirks.

    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::number(json!(49.99), 4_999)]
    #[case::text(json!("50"), 5_000)]
    #[case::blank(json!(""), 0)]
    fn amounts_accept_numbers_and_numeric_text(
        #[case] raw: serde_json::Value,
        #[case] expected_minor: u64,
    ) {
        let amount: AmountDto = serde_json::from_value(raw).expect("amount decodes");
        let money = amount.into_money("fee").expect("valid amount");
        assert_eq!(money.minor_units(), expected_minor);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let amount: AmountDto = serde_json::from_value(json!(-1)).expect("amount decodes");
        assert!(amount.into_money("fee").is_err());
    }

    #[test]
    fn clubs_decode_with_mongo_identifiers_and_defaults() {
        let dto: ClubDto = serde_json::from_value(json!({
            "_id": "65f0c1",
            "clubName": "Chess Club",
            "membershipFee": 0,
            "userEmail": "ann@example.com",
            "bannerImage": ""
        }))
        .expect("club decodes");

        let club = dto.into_domain().expect("club maps");
        assert_eq!(club.id.as_str(), "65f0c1");
        assert_eq!(club.status, ModerationStatus::Pending);
        assert_eq!(club.join_policy, JoinPolicy::Open);
        assert!(club.banner_image.is_none());
    }

    #[test]
    fn users_fall_back_to_email_derived_names() {
        let dto: UserDto = serde_json::from_value(json!({
            "email": "bob@example.com",
            "role": "club_manager"
        }))
        .expect("user decodes");

        let user = dto.into_domain();
        assert_eq!(user.role, Role::ClubManager);
        assert_eq!(user.status, AccountStatus::Active);
        assert_eq!(user.display_name.as_ref(), "bob");
    }

    #[test]
    fn event_payments_require_an_event_id() {
        let dto: PaymentDto = serde_json::from_value(json!({
            "_id": "p1",
            "userEmail": "ann@example.com",
            "amount": 10,
            "type": "event",
            "clubId": "c1"
        }))
        .expect("payment decodes");

        let error = dto.into_domain().expect_err("event id missing");
        assert!(error.contains("eventId"));
    }

    #[test]
    fn zero_capacity_means_unlimited() {
        let dto: EventDto = serde_json::from_value(json!({
            "_id": "e1",
            "clubId": "c1",
            "eventTitle": "Open Night",
            "eventDate": "2026-03-08",
            "maxAttendees": 0
        }))
        .expect("event decodes");

        assert_eq!(dto.into_domain().expect("event maps").max_attendees, None);
    }

    #[test]
    fn payment_bodies_carry_the_idempotency_key() {
        let payment = NewPayment {
            user_email: Email::new("ann@example.com").expect("email"),
            amount: Money::from_major(50),
            target: PaymentTarget::Membership {
                club_id: ClubId::new("c1").expect("club id"),
            },
            payment_method: "card".to_owned(),
            transaction_id: "pi_123".to_owned(),
            idempotency_key: IdempotencyKey::random(),
        };

        let body = serde_json::to_value(NewPaymentBody::from(&payment)).expect("encodes");
        assert_eq!(body["type"], json!("membership"));
        assert_eq!(body["amount"], json!(50.0));
        assert_eq!(
            body["idempotencyKey"],
            json!(payment.idempotency_key.to_string())
        );
        assert!(body.get("eventId").is_none());
    }
}
