//! Event aggregate, drafts and queries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ClubId, EventId};
use super::moderation::ModerationStatus;
use super::money::Money;
use super::validation::{
    LONG_TEXT_MAX, SHORT_TEXT_MAX, ValidationError, optional_text, required_text,
};

/// A club event as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Backend identifier.
    pub id: EventId,
    /// Club running the event.
    pub club_id: ClubId,
    /// Headline shown in listings.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Day the event takes place.
    pub event_date: NaiveDate,
    /// Where it takes place.
    pub location: String,
    /// Whether a seat costs `event_fee`.
    pub is_paid: bool,
    /// Seat price; zero for free events.
    pub event_fee: Money,
    /// Seat limit; `None` means unlimited.
    pub max_attendees: Option<u32>,
    /// Moderation state. Only approved events take registrations.
    pub status: ModerationStatus,
    /// Creation time, when the backend reports one.
    pub created_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Whether users can register.
    pub fn is_approved(&self) -> bool {
        self.status == ModerationStatus::Approved
    }

    /// Whether registering goes through the payment sequence.
    pub const fn requires_payment(&self) -> bool {
        self.is_paid && !self.event_fee.is_zero()
    }

    /// Whether the event takes place on or after `today`.
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.event_date >= today
    }

    /// Whether `registered` seats exhaust the capacity.
    pub fn is_full(&self, registered: u64) -> bool {
        self.max_attendees
            .is_some_and(|limit| registered >= u64::from(limit))
    }

    /// Apply a validated patch. Status is never touched.
    pub fn apply_patch(&mut self, patch: &EventPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(location) = &patch.location {
            self.location.clone_from(location);
        }
        if let Some(date) = patch.event_date {
            self.event_date = date;
        }
        if let Some(limit) = patch.max_attendees {
            self.max_attendees = Some(limit);
        }
    }
}

/// Raw event form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    /// Club the event belongs to.
    pub club_id: ClubId,
    /// Title as typed.
    pub title: String,
    /// Description as typed.
    pub description: String,
    /// Event day.
    pub event_date: NaiveDate,
    /// Location as typed.
    pub location: String,
    /// Whether seats are paid.
    pub is_paid: bool,
    /// Seat price.
    pub event_fee: Money,
    /// Seat limit.
    pub max_attendees: Option<u32>,
}

impl EventDraft {
    /// Validate the form. Paid events need a positive fee; the fee of a free
    /// event is forced to zero.
    pub fn validate(&self) -> Result<NewEvent, ValidationError> {
        if self.is_paid && self.event_fee.is_zero() {
            return Err(ValidationError::Invalid {
                field: "eventFee",
                reason: "paid events need a fee greater than zero".to_owned(),
            });
        }
        if self.max_attendees == Some(0) {
            return Err(ValidationError::Invalid {
                field: "maxAttendees",
                reason: "capacity must be at least one".to_owned(),
            });
        }
        Ok(NewEvent {
            club_id: self.club_id.clone(),
            title: required_text("eventTitle", &self.title, SHORT_TEXT_MAX)?,
            description: required_text("description", &self.description, LONG_TEXT_MAX)?,
            event_date: self.event_date,
            location: required_text("location", &self.location, SHORT_TEXT_MAX)?,
            is_paid: self.is_paid,
            event_fee: if self.is_paid {
                self.event_fee
            } else {
                Money::ZERO
            },
            max_attendees: self.max_attendees,
        })
    }
}

/// Validated event creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    /// Owning club.
    pub club_id: ClubId,
    /// Trimmed title.
    pub title: String,
    /// Trimmed description.
    pub description: String,
    /// Event day.
    pub event_date: NaiveDate,
    /// Trimmed location.
    pub location: String,
    /// Whether seats are paid.
    pub is_paid: bool,
    /// Seat price.
    pub event_fee: Money,
    /// Seat limit.
    pub max_attendees: Option<u32>,
}

/// Partial update of an event's content fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New location.
    pub location: Option<String>,
    /// New day.
    pub event_date: Option<NaiveDate>,
    /// New seat limit.
    pub max_attendees: Option<u32>,
}

impl EventPatch {
    /// Whether the patch changes nothing.
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.event_date.is_none()
            && self.max_attendees.is_none()
    }

    /// Trim supplied text fields and reject blanks or empty patches.
    pub fn validate(&self) -> Result<Self, ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyPatch);
        }
        if self.max_attendees == Some(0) {
            return Err(ValidationError::Invalid {
                field: "maxAttendees",
                reason: "capacity must be at least one".to_owned(),
            });
        }
        Ok(Self {
            title: optional_text("eventTitle", self.title.as_deref(), SHORT_TEXT_MAX)?,
            description: optional_text(
                "description",
                self.description.as_deref(),
                LONG_TEXT_MAX,
            )?,
            location: optional_text("location", self.location.as_deref(), SHORT_TEXT_MAX)?,
            event_date: self.event_date,
            max_attendees: self.max_attendees,
        })
    }
}

/// Filters for event listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventQuery {
    /// Only events in this moderation state.
    pub status: Option<ModerationStatus>,
    /// Only events of this club.
    pub club_id: Option<ClubId>,
}

impl EventQuery {
    /// Public listing: approved events only.
    pub fn approved() -> Self {
        Self {
            status: Some(ModerationStatus::Approved),
            club_id: None,
        }
    }

    /// All events of one club.
    pub const fn for_club(club_id: ClubId) -> Self {
        Self {
            status: None,
            club_id: Some(club_id),
        }
    }

    /// Whether `event` passes every filter.
    pub fn matches(&self, event: &Event) -> bool {
        self.status.is_none_or(|status| status == event.status)
            && self.club_id.as_ref().is_none_or(|id| id == &event.club_id)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn draft() -> EventDraft {
        EventDraft {
            club_id: ClubId::new("club-1").expect("valid id"),
            title: "Blitz night".to_owned(),
            description: "Five minute games".to_owned(),
            event_date: NaiveDate::from_ymd_opt(2026, 11, 5).expect("valid date"),
            location: "Library".to_owned(),
            is_paid: false,
            event_fee: Money::from_major(10),
            max_attendees: None,
        }
    }

    #[rstest]
    fn free_events_drop_their_fee(draft: EventDraft) {
        let event = draft.validate().expect("valid draft");
        assert!(!event.is_paid);
        assert_eq!(event.event_fee, Money::ZERO);
    }

    #[rstest]
    fn paid_events_need_a_fee(mut draft: EventDraft) {
        draft.is_paid = true;
        draft.event_fee = Money::ZERO;
        let err = draft.validate().expect_err("fee required");
        assert_eq!(err.field(), Some("eventFee"));
    }

    #[rstest]
    fn zero_capacity_is_rejected(mut draft: EventDraft) {
        draft.max_attendees = Some(0);
        let err = draft.validate().expect_err("capacity");
        assert_eq!(err.field(), Some("maxAttendees"));
    }

    #[rstest]
    #[case(None, 1_000, false)]
    #[case(Some(2), 1, false)]
    #[case(Some(2), 2, true)]
    fn capacity_checks(
        draft: EventDraft,
        #[case] limit: Option<u32>,
        #[case] registered: u64,
        #[case] full: bool,
    ) {
        let new = draft.validate().expect("valid draft");
        let event = Event {
            id: EventId::new("event-1").expect("valid id"),
            club_id: new.club_id,
            title: new.title,
            description: new.description,
            event_date: new.event_date,
            location: new.location,
            is_paid: new.is_paid,
            event_fee: new.event_fee,
            max_attendees: limit,
            status: ModerationStatus::Approved,
            created_at: None,
        };
        assert_eq!(event.is_full(registered), full);
    }
}
