//! Moderation state machine shared by clubs, events and manager applications.
//!
//! ```text
//! pending --approve--> approved
//! pending --reject---> rejected
//! approved --reject--> rejected
//! ```
//!
//! Re-applying the current outcome is a no-op. `rejected` is terminal:
//! approving a rejected item is refused and nothing resubmits it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::Error;

/// Moderation state of a club, event or application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    /// Waiting for a super admin.
    #[default]
    Pending,
    /// Visible and open for joins or registrations.
    Approved,
    /// Turned down. Terminal.
    Rejected,
}

impl ModerationStatus {
    /// Wire value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Work out the effect of `decision` on an item in this state.
    ///
    /// # Examples
    /// ```
    /// use clubhub::domain::{ModerationDecision, ModerationStatus, Transition};
    ///
    /// let first = ModerationStatus::Pending.apply(ModerationDecision::Approve).unwrap();
    /// assert_eq!(first, Transition::Changed(ModerationStatus::Approved));
    /// let again = ModerationStatus::Approved.apply(ModerationDecision::Approve).unwrap();
    /// assert_eq!(again, Transition::Unchanged);
    /// ```
    pub fn apply(self, decision: ModerationDecision) -> Result<Transition, Error> {
        match (self, decision) {
            (Self::Pending, ModerationDecision::Approve) => Ok(Transition::Changed(Self::Approved)),
            (Self::Pending | Self::Approved, ModerationDecision::Reject) => {
                Ok(Transition::Changed(Self::Rejected))
            }
            (Self::Approved, ModerationDecision::Approve)
            | (Self::Rejected, ModerationDecision::Reject) => Ok(Transition::Unchanged),
            (Self::Rejected, ModerationDecision::Approve) => Err(Error::invalid_transition(
                "rejected items cannot be approved",
            )),
        }
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A super-admin (or, for memberships, manager) verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationDecision {
    /// Accept.
    Approve,
    /// Turn down.
    Reject,
}

/// Result of applying a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The item moves to the contained state.
    Changed(ModerationStatus),
    /// The item already reflects the decision; nothing to write.
    Unchanged,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    use ModerationDecision::{Approve, Reject};
    use ModerationStatus::{Approved, Pending, Rejected};

    #[rstest]
    #[case(Pending, Approve, Transition::Changed(Approved))]
    #[case(Pending, Reject, Transition::Changed(Rejected))]
    #[case(Approved, Reject, Transition::Changed(Rejected))]
    #[case(Approved, Approve, Transition::Unchanged)]
    #[case(Rejected, Reject, Transition::Unchanged)]
    fn legal_transitions(
        #[case] from: ModerationStatus,
        #[case] decision: ModerationDecision,
        #[case] expected: Transition,
    ) {
        assert_eq!(from.apply(decision).expect("legal"), expected);
    }

    #[rstest]
    fn rejected_items_stay_rejected() {
        let err = Rejected.apply(Approve).expect_err("terminal");
        assert_eq!(err.code(), ErrorCode::InvalidTransition);
    }
}
