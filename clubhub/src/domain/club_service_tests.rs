//! Tests for the club lifecycle service.

use std::sync::Arc;

use super::*;
use crate::domain::ports::{BackendError, MockClubRepository};
use crate::domain::{ErrorCode, Money, ModerationStatus};
use crate::test_support::fixtures::{club, manager, member, super_admin, uncached_queries};
use rstest::rstest;

const OWNER: &str = "ann@example.com";

fn make_service(repo: MockClubRepository) -> ClubService<MockClubRepository> {
    ClubService::new(Arc::new(repo), uncached_queries())
}

fn chess_draft() -> ClubDraft {
    ClubDraft {
        name: "Chess Club".to_owned(),
        description: "Weekly blitz and classical games".to_owned(),
        category: "Sports".to_owned(),
        location: "Library".to_owned(),
        membership_fee: Money::ZERO,
        ..ClubDraft::default()
    }
}

#[tokio::test]
async fn create_club_returns_pending_club() {
    let mut repo = MockClubRepository::new();
    repo.expect_create_club()
        .times(1)
        .return_once(|owner, new_club| {
            let mut created = club("c1", owner.as_ref(), ModerationStatus::Pending, Money::ZERO);
            created.name.clone_from(&new_club.name);
            Ok(created)
        });

    let created = make_service(repo)
        .create_club(&manager(OWNER), &chess_draft())
        .await
        .expect("club created");

    assert_eq!(created.name, "Chess Club");
    assert_eq!(created.status, ModerationStatus::Pending);
    assert_eq!(created.owner_email.as_ref(), OWNER);
}

#[tokio::test]
async fn duplicate_club_name_is_reported_as_such() {
    let mut repo = MockClubRepository::new();
    repo.expect_create_club()
        .times(1)
        .return_once(|_, _| Err(BackendError::conflict("name taken")));

    let error = make_service(repo)
        .create_club(&manager(OWNER), &chess_draft())
        .await
        .expect_err("conflict");

    assert_eq!(error.code(), ErrorCode::DuplicateClubName);
    assert_eq!(error.user_message(), "Club with this name already exists");
}

#[tokio::test]
async fn create_club_rejects_blank_name_without_calling_backend() {
    let mut repo = MockClubRepository::new();
    repo.expect_create_club().never();
    let draft = ClubDraft {
        name: "   ".to_owned(),
        ..chess_draft()
    };

    let error = make_service(repo)
        .create_club(&manager(OWNER), &draft)
        .await
        .expect_err("validation");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case::guest(Principal::Guest, ErrorCode::Unauthorized)]
#[case::member(member("bob@example.com"), ErrorCode::Forbidden)]
#[tokio::test]
async fn create_club_requires_manager_role(#[case] principal: Principal, #[case] code: ErrorCode) {
    let mut repo = MockClubRepository::new();
    repo.expect_create_club().never();

    let error = make_service(repo)
        .create_club(&principal, &chess_draft())
        .await
        .expect_err("denied");

    assert_eq!(error.code(), code);
}

#[tokio::test]
async fn approving_twice_writes_once() {
    let mut repo = MockClubRepository::new();
    let mut finds = 0;
    repo.expect_find_club().times(2).returning(move |id| {
        finds += 1;
        let status = if finds == 1 {
            ModerationStatus::Pending
        } else {
            ModerationStatus::Approved
        };
        Ok(Some(club(id.as_ref(), OWNER, status, Money::ZERO)))
    });
    repo.expect_set_club_status()
        .withf(|_, status| *status == ModerationStatus::Approved)
        .times(1)
        .returning(|_, _| Ok(()));
    let service = make_service(repo);
    let admin = super_admin("root@example.com");
    let id = ClubId::new("c1").expect("id");

    let first = service
        .moderate_club(&admin, &id, ModerationDecision::Approve)
        .await
        .expect("first approval");
    let second = service
        .moderate_club(&admin, &id, ModerationDecision::Approve)
        .await
        .expect("second approval");

    assert_eq!(first.status, ModerationStatus::Approved);
    assert_eq!(second.status, ModerationStatus::Approved);
}

#[tokio::test]
async fn approving_a_rejected_club_is_an_invalid_transition() {
    let mut repo = MockClubRepository::new();
    repo.expect_find_club()
        .returning(|id| Ok(Some(club(id.as_ref(), OWNER, ModerationStatus::Rejected, Money::ZERO))));
    repo.expect_set_club_status().never();

    let error = make_service(repo)
        .moderate_club(
            &super_admin("root@example.com"),
            &ClubId::new("c1").expect("id"),
            ModerationDecision::Approve,
        )
        .await
        .expect_err("terminal");

    assert_eq!(error.code(), ErrorCode::InvalidTransition);
}

#[tokio::test]
async fn update_club_fields_keeps_status() {
    let mut repo = MockClubRepository::new();
    repo.expect_find_club()
        .returning(|id| Ok(Some(club(id.as_ref(), OWNER, ModerationStatus::Approved, Money::ZERO))));
    repo.expect_update_club().times(1).returning(|_, _| Ok(()));
    let patch = ClubPatch {
        location: Some("  Community Hall ".to_owned()),
        ..ClubPatch::default()
    };

    let updated = make_service(repo)
        .update_club_fields(&manager(OWNER), &ClubId::new("c1").expect("id"), &patch)
        .await
        .expect("updated");

    assert_eq!(updated.location, "Community Hall");
    assert_eq!(updated.status, ModerationStatus::Approved);
}

#[tokio::test]
async fn managers_cannot_edit_clubs_they_do_not_own() {
    let mut repo = MockClubRepository::new();
    repo.expect_find_club()
        .returning(|id| Ok(Some(club(id.as_ref(), OWNER, ModerationStatus::Approved, Money::ZERO))));
    repo.expect_update_club().never();
    let patch = ClubPatch {
        location: Some("Elsewhere".to_owned()),
        ..ClubPatch::default()
    };

    let error = make_service(repo)
        .update_club_fields(
            &manager("other@example.com"),
            &ClubId::new("c1").expect("id"),
            &patch,
        )
        .await
        .expect_err("forbidden");

    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn missing_club_is_not_found() {
    let mut repo = MockClubRepository::new();
    repo.expect_find_club().returning(|_| Ok(None));

    let error = make_service(repo)
        .get_club(&ClubId::new("nope").expect("id"))
        .await
        .expect_err("missing");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn backend_outage_is_service_unavailable() {
    let mut repo = MockClubRepository::new();
    repo.expect_list_clubs()
        .returning(|_| Err(BackendError::connection("connection refused")));

    let error = make_service(repo)
        .list_clubs(ClubQuery::approved())
        .await
        .expect_err("offline");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    assert!(error.is_retryable());
}
