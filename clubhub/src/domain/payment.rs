//! Append-only payment ledger entries and platform aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::idempotency::IdempotencyKey;
use super::ids::{ClubId, EventId, PaymentId};
use super::money::Money;
use super::user::Email;

/// Payment method recorded for card checkouts.
pub const CARD_PAYMENT_METHOD: &str = "card";

/// What a payment bought.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentTarget {
    /// A club membership.
    Membership {
        /// Club joined.
        club_id: ClubId,
    },
    /// A seat at an event of `club_id`.
    Event {
        /// Event attended.
        event_id: EventId,
        /// Club hosting the event.
        club_id: ClubId,
    },
}

impl PaymentTarget {
    /// Wire `type` value.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Membership { .. } => "membership",
            Self::Event { .. } => "event",
        }
    }

    /// Club the purchase belongs to.
    pub const fn club_id(&self) -> &ClubId {
        match self {
            Self::Membership { club_id } | Self::Event { club_id, .. } => club_id,
        }
    }
}

/// A recorded payment. Immutable once created; there is no pending or
/// partial state, every entry is completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    /// Backend identifier.
    pub id: PaymentId,
    /// Payer.
    pub user_email: Email,
    /// Amount charged.
    pub amount: Money,
    /// What was bought.
    pub target: PaymentTarget,
    /// Payment method label, `card` for provider charges.
    pub payment_method: String,
    /// Provider transaction reference.
    pub transaction_id: String,
    /// Key the entry was written under; absent on legacy rows.
    pub idempotency_key: Option<IdempotencyKey>,
    /// Creation time, when the backend reports one.
    pub created_at: Option<DateTime<Utc>>,
}

/// Ledger write request. The backend deduplicates on `idempotency_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    /// Payer.
    pub user_email: Email,
    /// Amount charged.
    pub amount: Money,
    /// What was bought.
    pub target: PaymentTarget,
    /// Payment method label.
    pub payment_method: String,
    /// Provider transaction reference.
    pub transaction_id: String,
    /// Deduplication key, stable across retries of one checkout.
    pub idempotency_key: IdempotencyKey,
}

/// Platform-wide totals for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStats {
    /// Sum of every recorded payment.
    pub total_revenue: Money,
    /// Registered accounts.
    pub total_users: u64,
    /// Clubs in any status.
    pub total_clubs: u64,
    /// Events in any status.
    pub total_events: u64,
}
