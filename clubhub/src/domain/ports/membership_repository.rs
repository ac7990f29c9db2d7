//! Port for the backend `memberships` resource.

use async_trait::async_trait;

use crate::domain::{ClubId, Email, Membership, MembershipId, MembershipStatus, NewMembership};

use super::BackendError;

/// Membership storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Insert a membership. A live membership for the same user and club is
    /// reported as [`BackendError::Conflict`].
    async fn create_membership(
        &self,
        membership: &NewMembership,
    ) -> Result<Membership, BackendError>;

    /// Fetch a membership by identifier.
    async fn find_membership(&self, id: &MembershipId)
    -> Result<Option<Membership>, BackendError>;

    /// Memberships held by `email`.
    async fn memberships_for_user(&self, email: &Email) -> Result<Vec<Membership>, BackendError>;

    /// Memberships of one club.
    async fn memberships_for_club(&self, club_id: &ClubId)
    -> Result<Vec<Membership>, BackendError>;

    /// Set the status of a membership.
    async fn set_membership_status(
        &self,
        id: &MembershipId,
        status: MembershipStatus,
    ) -> Result<(), BackendError>;

    /// Delete a membership, returning the number of rows removed.
    async fn delete_membership(&self, id: &MembershipId) -> Result<u64, BackendError>;
}
