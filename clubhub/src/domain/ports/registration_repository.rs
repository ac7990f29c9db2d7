//! Port for the backend `event-registrations` resource.

use async_trait::async_trait;

use crate::domain::{
    Email, EventId, EventRegistration, NewRegistration, RegistrationId, RegistrationStatus,
};

use super::BackendError;

/// Event registration storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Insert a `registered` seat. An active seat for the same user and
    /// event is reported as [`BackendError::Conflict`].
    async fn create_registration(
        &self,
        registration: &NewRegistration,
    ) -> Result<EventRegistration, BackendError>;

    /// Fetch a registration by identifier.
    async fn find_registration(
        &self,
        id: &RegistrationId,
    ) -> Result<Option<EventRegistration>, BackendError>;

    /// Registrations held by `email`.
    async fn registrations_for_user(
        &self,
        email: &Email,
    ) -> Result<Vec<EventRegistration>, BackendError>;

    /// Registrations for one event.
    async fn registrations_for_event(
        &self,
        event_id: &EventId,
    ) -> Result<Vec<EventRegistration>, BackendError>;

    /// Set the status of a registration.
    async fn set_registration_status(
        &self,
        id: &RegistrationId,
        status: RegistrationStatus,
    ) -> Result<(), BackendError>;
}
