//! Event registrations.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ClubId, EventId, PaymentId, RegistrationId};
use super::money::Money;
use super::user::Email;

/// Lifecycle of a seat. Cancelling keeps the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Holds a seat.
    Registered,
    /// Seat given back.
    Cancelled,
}

impl RegistrationStatus {
    /// Wire value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored registration.
///
/// ## Invariants
/// - At most one `registered` row per `(user_email, event_id)`.
/// - `payment_id`, when present, references an event payment for `event_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRegistration {
    /// Backend identifier.
    pub id: RegistrationId,
    /// Attendee.
    pub user_email: Email,
    /// Event attended.
    pub event_id: EventId,
    /// Club running the event.
    pub club_id: ClubId,
    /// Whether the seat is still held.
    pub status: RegistrationStatus,
    /// Payment that bought the seat, for paid events.
    pub payment_id: Option<PaymentId>,
    /// When the seat was taken.
    pub registered_at: DateTime<Utc>,
}

impl EventRegistration {
    /// Whether the registration holds a seat.
    pub fn is_active(&self) -> bool {
        self.status == RegistrationStatus::Registered
    }
}

/// Registration creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    /// Attendee.
    pub user_email: Email,
    /// Event.
    pub event_id: EventId,
    /// Club running the event.
    pub club_id: ClubId,
    /// Payment that bought the seat.
    pub payment_id: Option<PaymentId>,
    /// Registration time.
    pub registered_at: DateTime<Utc>,
}

/// Result of asking for a seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Free event: the seat is taken.
    Registered(EventRegistration),
    /// Paid event: nothing was written; start a checkout for `amount`.
    PaymentRequired {
        /// Event to pay for.
        event_id: EventId,
        /// Price of one seat.
        amount: Money,
    },
}
