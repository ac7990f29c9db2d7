//! Port for the backend `users` resource.

use async_trait::async_trait;

use crate::domain::{AccessUpdate, Email, ProfilePatch, User};

use super::BackendError;

/// Backend user records keyed by email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Create the record for a first sign-in. An existing record is reported
    /// as [`BackendError::Conflict`].
    async fn create_user(&self, user: &User) -> Result<(), BackendError>;

    /// Fetch a record by email.
    async fn find_user(&self, email: &Email) -> Result<Option<User>, BackendError>;

    /// List users, optionally filtered by a name or email substring.
    async fn list_users(&self, search: Option<String>) -> Result<Vec<User>, BackendError>;

    /// Change role and/or status.
    async fn update_access(&self, email: &Email, update: AccessUpdate)
    -> Result<(), BackendError>;

    /// Change self-service profile fields.
    async fn update_profile(&self, email: &Email, patch: &ProfilePatch)
    -> Result<(), BackendError>;
}
