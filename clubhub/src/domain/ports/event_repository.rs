//! Port for the backend `events` resource.

use async_trait::async_trait;

use crate::domain::{Event, EventId, EventPatch, EventQuery, ModerationStatus, NewEvent};

use super::BackendError;

/// Event storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert a new `pending` event.
    async fn create_event(&self, event: &NewEvent) -> Result<Event, BackendError>;

    /// Fetch an event by identifier.
    async fn find_event(&self, id: &EventId) -> Result<Option<Event>, BackendError>;

    /// List events matching `query`.
    async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>, BackendError>;

    /// Set the moderation status.
    async fn set_event_status(
        &self,
        id: &EventId,
        status: ModerationStatus,
    ) -> Result<(), BackendError>;

    /// Apply a partial update to content fields.
    async fn update_event(&self, id: &EventId, patch: &EventPatch) -> Result<(), BackendError>;

    /// Delete an event, returning the number of rows removed.
    async fn delete_event(&self, id: &EventId) -> Result<u64, BackendError>;
}
