//! Club-manager applications.
//!
//! Approval only records the decision. Promoting the applicant is a
//! separate `set_user_role` call by the moderator.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use super::authorization::{Capability, require};
use super::moderation::Transition;
use super::port_errors::{map_backend, map_backend_error};
use super::ports::ApplicationRepository;
use super::query::{QueryClient, QueryKey, QueryScope};
use super::{
    ApplicationDraft, ApplicationId, ClubManagerApplication, Error, ModerationDecision,
    ModerationStatus, Principal,
};

/// Application workflow service.
pub struct ApplicationService<A> {
    applications: Arc<A>,
    queries: QueryClient,
    clock: Arc<dyn Clock>,
}

impl<A> ApplicationService<A> {
    /// Create a service over the application repository.
    pub fn new(applications: Arc<A>, queries: QueryClient, clock: Arc<dyn Clock>) -> Self {
        Self {
            applications,
            queries,
            clock,
        }
    }
}

impl<A> ApplicationService<A>
where
    A: ApplicationRepository,
{
    /// File an application to become a club manager.
    pub async fn apply_for_manager(
        &self,
        principal: &Principal,
        draft: &ApplicationDraft,
    ) -> Result<ClubManagerApplication, Error> {
        let user = require(principal, Capability::ApplyForClubManager)?;
        let request = draft.validate(user.email.clone(), self.clock.utc())?;
        let application = self
            .applications
            .create_application(&request)
            .await
            .map_err(|err| {
                map_backend_error(err, |_| {
                    Error::duplicate_application(
                        "You have already applied to become a club manager",
                    )
                })
            })?;
        self.queries.invalidate(QueryScope::APPLICATION_CHANGED);
        info!(application_id = %application.id, applicant = %user.email, "manager application filed");
        Ok(application)
    }

    /// Approve or reject an application. Approval stamps `approved_at`.
    pub async fn moderate_application(
        &self,
        principal: &Principal,
        id: &ApplicationId,
        decision: ModerationDecision,
    ) -> Result<ClubManagerApplication, Error> {
        require(principal, Capability::ModerateApplications)?;
        let mut application = self
            .applications
            .find_application(id)
            .await
            .map_err(map_backend)?
            .ok_or_else(|| Error::not_found(format!("application {id} not found")))?;
        let Transition::Changed(status) = application.status.apply(decision)? else {
            return Ok(application);
        };
        let approved_at = (status == ModerationStatus::Approved).then(|| self.clock.utc());
        self.applications
            .set_application_status(id, status, approved_at)
            .await
            .map_err(map_backend)?;
        application.status = status;
        application.approved_at = approved_at;
        self.queries.invalidate(QueryScope::APPLICATION_CHANGED);
        info!(application_id = %id, %status, "manager application moderated");
        Ok(application)
    }

    /// Applications awaiting or past moderation.
    pub async fn list_applications(
        &self,
        principal: &Principal,
        status: Option<ModerationStatus>,
    ) -> Result<Vec<ClubManagerApplication>, Error> {
        require(principal, Capability::ModerateApplications)?;
        let applications = Arc::clone(&self.applications);
        self.queries
            .fetch(QueryKey::Applications(status), || async move {
                applications
                    .list_applications(status)
                    .await
                    .map_err(map_backend)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{BackendError, MockApplicationRepository};
    use crate::test_support::fixtures::{
        email, fixture_clock, fixture_now, member, super_admin, uncached_queries,
    };

    fn make_service(repo: MockApplicationRepository) -> ApplicationService<MockApplicationRepository> {
        ApplicationService::new(Arc::new(repo), uncached_queries(), fixture_clock())
    }

    fn pending() -> ClubManagerApplication {
        ClubManagerApplication {
            id: ApplicationId::new("a1").expect("id"),
            applicant_email: email("bob@example.com"),
            name: "Bob".to_owned(),
            reason: "I run the Saturday chess meetup".to_owned(),
            photo_url: None,
            status: ModerationStatus::Pending,
            applied_at: fixture_now(),
            approved_at: None,
        }
    }

    fn draft() -> ApplicationDraft {
        ApplicationDraft {
            name: "Bob".to_owned(),
            reason: "I run the Saturday chess meetup".to_owned(),
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn second_application_is_a_duplicate() {
        let mut repo = MockApplicationRepository::new();
        repo.expect_create_application()
            .returning(|_| Err(BackendError::conflict("exists")));

        let error = make_service(repo)
            .apply_for_manager(&member("bob@example.com"), &draft())
            .await
            .expect_err("duplicate");

        assert_eq!(error.code(), ErrorCode::DuplicateApplication);
    }

    #[tokio::test]
    async fn guests_cannot_apply() {
        let mut repo = MockApplicationRepository::new();
        repo.expect_create_application().never();

        let error = make_service(repo)
            .apply_for_manager(&Principal::Guest, &draft())
            .await
            .expect_err("guest");

        assert_eq!(error.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn approval_stamps_approved_at() {
        let mut repo = MockApplicationRepository::new();
        repo.expect_find_application()
            .returning(|_| Ok(Some(pending())));
        repo.expect_set_application_status()
            .withf(|_, status, approved_at| {
                *status == ModerationStatus::Approved && *approved_at == Some(fixture_now())
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let approved = make_service(repo)
            .moderate_application(
                &super_admin("root@example.com"),
                &ApplicationId::new("a1").expect("id"),
                ModerationDecision::Approve,
            )
            .await
            .expect("approved");

        assert_eq!(approved.status, ModerationStatus::Approved);
        assert_eq!(approved.approved_at, Some(fixture_now()));
    }

    #[tokio::test]
    async fn members_cannot_moderate() {
        let repo = MockApplicationRepository::new();

        let error = make_service(repo)
            .moderate_application(
                &member("bob@example.com"),
                &ApplicationId::new("a1").expect("id"),
                ModerationDecision::Approve,
            )
            .await
            .expect_err("forbidden");

        assert_eq!(error.code(), ErrorCode::Forbidden);
    }
}
