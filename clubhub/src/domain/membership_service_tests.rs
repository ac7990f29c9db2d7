//! Tests for the membership lifecycle service.

use std::sync::Arc;

use super::*;
use crate::domain::ports::{BackendError, MockClubRepository, MockMembershipRepository};
use crate::domain::{ErrorCode, JoinPolicy, ModerationStatus, Money};
use crate::test_support::fixtures::{
    club, club_id, email, fixture_clock, fixture_now, manager, member, uncached_queries,
};

const OWNER: &str = "owner@example.com";
const JOINER: &str = "bob@example.com";

fn make_service(
    clubs: MockClubRepository,
    memberships: MockMembershipRepository,
) -> MembershipService<MockClubRepository, MockMembershipRepository> {
    MembershipService::new(
        Arc::new(clubs),
        Arc::new(memberships),
        uncached_queries(),
        fixture_clock(),
    )
}

fn clubs_returning(found: Club) -> MockClubRepository {
    let mut clubs = MockClubRepository::new();
    clubs
        .expect_find_club()
        .returning(move |_| Ok(Some(found.clone())));
    clubs
}

fn stored(request: &NewMembership) -> Membership {
    Membership {
        id: MembershipId::new("m1").expect("id"),
        user_email: request.user_email.clone(),
        club_id: request.club_id.clone(),
        status: request.status,
        payment_id: request.payment_id.clone(),
        joined_at: request.joined_at,
    }
}

fn membership(status: MembershipStatus, holder: &str) -> Membership {
    Membership {
        id: MembershipId::new("m1").expect("id"),
        user_email: email(holder),
        club_id: club_id("c1"),
        status,
        payment_id: None,
        joined_at: fixture_now(),
    }
}

#[tokio::test]
async fn free_open_club_activates_immediately() {
    let clubs = clubs_returning(club("c1", OWNER, ModerationStatus::Approved, Money::ZERO));
    let mut memberships = MockMembershipRepository::new();
    memberships
        .expect_memberships_for_user()
        .returning(|_| Ok(Vec::new()));
    memberships
        .expect_create_membership()
        .withf(|request| request.payment_id.is_none())
        .times(1)
        .returning(|request| Ok(stored(request)));

    let outcome = make_service(clubs, memberships)
        .join_club(&member(JOINER), &club_id("c1"))
        .await
        .expect("joined");

    let JoinOutcome::Joined(joined) = outcome else {
        panic!("expected a membership, got {outcome:?}");
    };
    assert_eq!(joined.status, MembershipStatus::Active);
    assert_eq!(joined.joined_at, fixture_now());
}

#[tokio::test]
async fn manager_approval_clubs_start_pending() {
    let mut gated = club("c1", OWNER, ModerationStatus::Approved, Money::ZERO);
    gated.join_policy = JoinPolicy::ManagerApproval;
    let clubs = clubs_returning(gated);
    let mut memberships = MockMembershipRepository::new();
    memberships
        .expect_memberships_for_user()
        .returning(|_| Ok(Vec::new()));
    memberships
        .expect_create_membership()
        .returning(|request| Ok(stored(request)));

    let outcome = make_service(clubs, memberships)
        .join_club(&member(JOINER), &club_id("c1"))
        .await
        .expect("joined");

    assert!(matches!(
        outcome,
        JoinOutcome::Joined(Membership {
            status: MembershipStatus::Pending,
            ..
        })
    ));
}

#[tokio::test]
async fn paid_club_requires_payment_and_writes_nothing() {
    let clubs = clubs_returning(club(
        "c1",
        OWNER,
        ModerationStatus::Approved,
        Money::from_major(50),
    ));
    let mut memberships = MockMembershipRepository::new();
    memberships
        .expect_memberships_for_user()
        .returning(|_| Ok(Vec::new()));
    memberships.expect_create_membership().never();

    let outcome = make_service(clubs, memberships)
        .join_club(&member(JOINER), &club_id("c1"))
        .await
        .expect("hand-off");

    assert_eq!(
        outcome,
        JoinOutcome::PaymentRequired {
            club_id: club_id("c1"),
            amount: Money::from_major(50),
        }
    );
}

#[tokio::test]
async fn existing_live_membership_is_a_duplicate() {
    let clubs = clubs_returning(club("c1", OWNER, ModerationStatus::Approved, Money::ZERO));
    let mut memberships = MockMembershipRepository::new();
    memberships
        .expect_memberships_for_user()
        .returning(|_| Ok(vec![membership(MembershipStatus::Pending, JOINER)]));
    memberships.expect_create_membership().never();

    let error = make_service(clubs, memberships)
        .join_club(&member(JOINER), &club_id("c1"))
        .await
        .expect_err("duplicate");

    assert_eq!(error.code(), ErrorCode::DuplicateMembership);
}

#[tokio::test]
async fn backend_conflict_is_a_duplicate_not_a_generic_failure() {
    let clubs = clubs_returning(club("c1", OWNER, ModerationStatus::Approved, Money::ZERO));
    let mut memberships = MockMembershipRepository::new();
    memberships
        .expect_memberships_for_user()
        .returning(|_| Ok(Vec::new()));
    memberships
        .expect_create_membership()
        .returning(|_| Err(BackendError::conflict("already a member")));

    let error = make_service(clubs, memberships)
        .join_club(&member(JOINER), &club_id("c1"))
        .await
        .expect_err("duplicate");

    assert_eq!(error.code(), ErrorCode::DuplicateMembership);
    assert_eq!(
        error.user_message(),
        "You already have an active membership for this club!"
    );
}

#[tokio::test]
async fn pending_clubs_cannot_be_joined() {
    let clubs = clubs_returning(club("c1", OWNER, ModerationStatus::Pending, Money::ZERO));
    let mut memberships = MockMembershipRepository::new();
    memberships.expect_create_membership().never();

    let error = make_service(clubs, memberships)
        .join_club(&member(JOINER), &club_id("c1"))
        .await
        .expect_err("not approved");

    assert_eq!(error.code(), ErrorCode::InvalidTransition);
}

#[tokio::test]
async fn leaving_twice_reports_not_found() {
    let mut memberships = MockMembershipRepository::new();
    memberships
        .expect_find_membership()
        .returning(|_| Ok(Some(membership(MembershipStatus::Active, JOINER))));
    memberships.expect_delete_membership().returning(|_| Ok(0));

    let error = make_service(MockClubRepository::new(), memberships)
        .leave_club(&member(JOINER), &MembershipId::new("m1").expect("id"))
        .await
        .expect_err("already gone");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn only_the_holder_may_leave() {
    let mut memberships = MockMembershipRepository::new();
    memberships
        .expect_find_membership()
        .returning(|_| Ok(Some(membership(MembershipStatus::Active, JOINER))));
    memberships.expect_delete_membership().never();

    let error = make_service(MockClubRepository::new(), memberships)
        .leave_club(
            &member("mallory@example.com"),
            &MembershipId::new("m1").expect("id"),
        )
        .await
        .expect_err("forbidden");

    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn owner_approves_pending_membership() {
    let clubs = clubs_returning(club("c1", OWNER, ModerationStatus::Approved, Money::ZERO));
    let mut memberships = MockMembershipRepository::new();
    memberships
        .expect_find_membership()
        .returning(|_| Ok(Some(membership(MembershipStatus::Pending, JOINER))));
    memberships
        .expect_set_membership_status()
        .withf(|_, status| *status == MembershipStatus::Active)
        .times(1)
        .returning(|_, _| Ok(()));

    let reviewed = make_service(clubs, memberships)
        .review_membership(
            &manager(OWNER),
            &MembershipId::new("m1").expect("id"),
            ModerationDecision::Approve,
        )
        .await
        .expect("approved");

    assert_eq!(reviewed.status, MembershipStatus::Active);
}

#[tokio::test]
async fn rejected_membership_cannot_be_approved() {
    let clubs = clubs_returning(club("c1", OWNER, ModerationStatus::Approved, Money::ZERO));
    let mut memberships = MockMembershipRepository::new();
    memberships
        .expect_find_membership()
        .returning(|_| Ok(Some(membership(MembershipStatus::Rejected, JOINER))));
    memberships.expect_set_membership_status().never();

    let error = make_service(clubs, memberships)
        .review_membership(
            &manager(OWNER),
            &MembershipId::new("m1").expect("id"),
            ModerationDecision::Approve,
        )
        .await
        .expect_err("terminal");

    assert_eq!(error.code(), ErrorCode::InvalidTransition);
}
