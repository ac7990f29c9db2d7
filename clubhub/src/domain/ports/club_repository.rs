//! Port for the backend `clubs` resource.

use async_trait::async_trait;

use crate::domain::{Club, ClubId, ClubPatch, ClubQuery, ClubStats, Email, ModerationStatus, NewClub};

use super::BackendError;

/// Club storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClubRepository: Send + Sync {
    /// Insert a new `pending` club owned by `owner`. A duplicate name is
    /// reported as [`BackendError::Conflict`].
    async fn create_club(&self, owner: &Email, club: &NewClub) -> Result<Club, BackendError>;

    /// Fetch a club by identifier.
    async fn find_club(&self, id: &ClubId) -> Result<Option<Club>, BackendError>;

    /// List clubs matching `query`.
    async fn list_clubs(&self, query: &ClubQuery) -> Result<Vec<Club>, BackendError>;

    /// Set the moderation status.
    async fn set_club_status(
        &self,
        id: &ClubId,
        status: ModerationStatus,
    ) -> Result<(), BackendError>;

    /// Apply a partial update to content fields.
    async fn update_club(&self, id: &ClubId, patch: &ClubPatch) -> Result<(), BackendError>;

    /// Aggregate revenue, member and event counts for one club.
    async fn club_stats(&self, id: &ClubId) -> Result<ClubStats, BackendError>;
}
