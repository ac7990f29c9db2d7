//! Port for the backend `club-managers` resource.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ApplicationId, ClubManagerApplication, ModerationStatus, NewApplication};

use super::BackendError;

/// Club-manager application storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Insert a `pending` application. An application already on file for
    /// the applicant is reported as [`BackendError::Conflict`].
    async fn create_application(
        &self,
        application: &NewApplication,
    ) -> Result<ClubManagerApplication, BackendError>;

    /// Fetch an application by identifier.
    async fn find_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<ClubManagerApplication>, BackendError>;

    /// List applications, optionally by status.
    async fn list_applications(
        &self,
        status: Option<ModerationStatus>,
    ) -> Result<Vec<ClubManagerApplication>, BackendError>;

    /// Set the moderation status, stamping `approved_at` on approval.
    async fn set_application_status(
        &self,
        id: &ApplicationId,
        status: ModerationStatus,
        approved_at: Option<DateTime<Utc>>,
    ) -> Result<(), BackendError>;
}
