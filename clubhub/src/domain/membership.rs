//! Membership of a user in a club.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ClubId, MembershipId, PaymentId};
use super::money::Money;
use super::user::Email;

/// Lifecycle of a membership.
///
/// ```text
/// (join, open club)            -> active
/// (join, approval club)        -> pending --approve--> active
///                                         --reject---> rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Waiting for the owning manager.
    Pending,
    /// Full member.
    Active,
    /// Turned down by the manager. Not live, so the user may ask again.
    Rejected,
}

impl MembershipStatus {
    /// Pending and active memberships block another join for the same club.
    pub const fn is_live(self) -> bool {
        !matches!(self, Self::Rejected)
    }

    /// Wire value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored membership.
///
/// ## Invariants
/// - At most one live membership per `(user_email, club_id)`; the backend
///   enforces it with a conflict response.
/// - `payment_id`, when present, references a membership payment for
///   `club_id` whose amount equalled the fee at purchase time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    /// Backend identifier.
    pub id: MembershipId,
    /// Member.
    pub user_email: Email,
    /// Club joined.
    pub club_id: ClubId,
    /// Where the membership stands.
    pub status: MembershipStatus,
    /// Payment that bought the membership, for paid clubs.
    pub payment_id: Option<PaymentId>,
    /// When the user joined.
    pub joined_at: DateTime<Utc>,
}

/// Membership creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMembership {
    /// Joining user.
    pub user_email: Email,
    /// Club being joined.
    pub club_id: ClubId,
    /// Starting status, from the club's join policy.
    pub status: MembershipStatus,
    /// Payment that bought it.
    pub payment_id: Option<PaymentId>,
    /// Join time.
    pub joined_at: DateTime<Utc>,
}

/// Result of asking to join a club.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Free club: the membership exists now.
    Joined(Membership),
    /// Paid club: nothing was written; start a checkout for `amount`.
    PaymentRequired {
        /// Club to pay for.
        club_id: ClubId,
        /// Membership fee.
        amount: Money,
    },
}
