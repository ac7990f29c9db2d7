//! Behaviour tests for club moderation, joins and edits over the in-memory
//! backend.
//!
//! Covers the moderation state machine, name uniqueness, the one live
//! membership per user and club rule, manager approval of pending members
//! and partial edits of a cached club.

use std::sync::Arc;

use clubhub::domain::ports::{BackendError, MembershipRepository};
use clubhub::domain::{
    Club, ClubPatch, ClubQuery, Error, JoinOutcome, JoinPolicy, Membership, MembershipStatus,
    ModerationDecision, ModerationStatus, Money, NewMembership,
};
use clubhub::test_support::fixtures::{email, fixture_now, manager, member, super_admin};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use tokio::runtime::Runtime;

mod support;

use support::{World, build, club_draft};

const OWNER: &str = "mia@example.com";
const ADMIN: &str = "root@example.com";
const ANN: &str = "ann@example.com";
const CLUB_NAME: &str = "Chess Club";
const NEW_DESCRIPTION: &str = "Moves every Tuesday at the library";

// -----------------------------------------------------------------------------
// Test World
// -----------------------------------------------------------------------------

/// Wrapper for non-Clone types to enable storage in `Slot`.
#[derive(Clone)]
struct RuntimeHandle(Arc<Runtime>);

/// Services plus whatever the last step produced.
#[derive(Default, ScenarioState)]
struct ClubLifecycleWorld {
    runtime: Slot<RuntimeHandle>,
    services: Slot<Arc<World>>,
    club: Slot<Club>,
    first_read: Slot<Club>,
    membership: Slot<Membership>,
    conflict: Slot<BackendError>,
    error: Slot<Error>,
}

impl ClubLifecycleWorld {
    fn start(&self) {
        self.runtime
            .set(RuntimeHandle(Arc::new(Runtime::new().expect("create runtime"))));
        self.services.set(Arc::new(build()));
    }

    fn with_services<T>(&self, operation: impl FnOnce(&Runtime, &World) -> T) -> T {
        let runtime = self.runtime.get().expect("runtime");
        let services = self.services.get().expect("services");
        operation(&runtime.0, &services)
    }

    fn club(&self) -> Club {
        self.club.get().expect("a club was submitted")
    }

    /// Keep the error of a failed step for the `Then` that inspects it.
    fn record<T>(&self, result: Result<T, Error>) -> Option<T> {
        match result {
            Ok(value) => {
                drop(self.error.take());
                Some(value)
            }
            Err(error) => {
                self.error.set(error);
                None
            }
        }
    }

    fn submit(&self, join_policy: JoinPolicy) {
        let club = self.with_services(|runtime, services| {
            runtime.block_on(services.clubs.create_club(
                &manager(OWNER),
                &club_draft(CLUB_NAME, Money::ZERO, join_policy),
            ))
        });
        self.club.set(club.expect("club created"));
    }

    fn moderate(&self, decision: ModerationDecision) -> Result<Club, Error> {
        let id = self.club().id;
        self.with_services(|runtime, services| {
            runtime.block_on(services.clubs.moderate_club(&super_admin(ADMIN), &id, decision))
        })
    }

    fn join(&self) {
        let id = self.club().id;
        let result = self.with_services(|runtime, services| {
            runtime.block_on(services.memberships.join_club(&member(ANN), &id))
        });
        if let Some(outcome) = self.record(result) {
            let JoinOutcome::Joined(membership) = outcome else {
                panic!("free clubs never ask for payment");
            };
            self.membership.set(membership);
        }
    }

    fn stats(&self) -> (u64, u64) {
        let id = self.club().id;
        let stats = self
            .with_services(|runtime, services| {
                runtime.block_on(services.clubs.club_stats(&manager(OWNER), &id))
            })
            .expect("stats");
        (stats.members_total, stats.members_pending)
    }

    fn read_club(&self) -> Club {
        let id = self.club().id;
        self.with_services(|runtime, services| runtime.block_on(services.clubs.get_club(&id)))
            .expect("club read")
    }

    fn live_membership(&self) -> NewMembership {
        NewMembership {
            user_email: email(ANN),
            club_id: self.club().id,
            status: MembershipStatus::Active,
            payment_id: None,
            joined_at: fixture_now(),
        }
    }
}

#[fixture]
fn world() -> ClubLifecycleWorld {
    ClubLifecycleWorld::default()
}

// -----------------------------------------------------------------------------
// Given Steps
// -----------------------------------------------------------------------------

#[given("a manager has submitted an open free club")]
fn a_manager_has_submitted_an_open_free_club(world: &ClubLifecycleWorld) {
    world.start();
    world.submit(JoinPolicy::Open);
}

#[given("an approved open free club")]
fn an_approved_open_free_club(world: &ClubLifecycleWorld) {
    world.start();
    world.submit(JoinPolicy::Open);
    let approved = world.moderate(ModerationDecision::Approve).expect("approved");
    world.club.set(approved);
}

#[given("an approved free club that requires manager approval")]
fn an_approved_club_requiring_approval(world: &ClubLifecycleWorld) {
    world.start();
    world.submit(JoinPolicy::ManagerApproval);
    let approved = world.moderate(ModerationDecision::Approve).expect("approved");
    world.club.set(approved);
}

#[given("a super admin has rejected the club")]
fn a_super_admin_has_rejected_the_club(world: &ClubLifecycleWorld) {
    world.moderate(ModerationDecision::Reject).expect("rejected");
}

#[given("the member joined the club from another tab")]
fn the_member_joined_from_another_tab(world: &ClubLifecycleWorld) {
    let request = world.live_membership();
    world
        .with_services(|runtime, services| {
            runtime.block_on(services.backend.create_membership(&request))
        })
        .expect("joined in another tab");
}

#[given("the club has been read once")]
fn the_club_has_been_read_once(world: &ClubLifecycleWorld) {
    world.first_read.set(world.read_club());
}

// -----------------------------------------------------------------------------
// When Steps
// -----------------------------------------------------------------------------

#[when("a member joins the club")]
fn a_member_joins_the_club(world: &ClubLifecycleWorld) {
    world.join();
}

#[when("a super admin approves the club")]
fn a_super_admin_approves_the_club(world: &ClubLifecycleWorld) {
    let result = world.moderate(ModerationDecision::Approve);
    if let Some(club) = world.record(result) {
        world.club.set(club);
    }
}

#[when("a member approves the club")]
fn a_member_approves_the_club(world: &ClubLifecycleWorld) {
    let id = world.club().id;
    let result = world.with_services(|runtime, services| {
        runtime.block_on(services.clubs.moderate_club(
            &member(ANN),
            &id,
            ModerationDecision::Approve,
        ))
    });
    drop(world.record(result));
}

#[when("another manager submits a club with the same name in capitals")]
fn another_manager_submits_the_same_name(world: &ClubLifecycleWorld) {
    let draft = club_draft(&CLUB_NAME.to_uppercase(), Money::ZERO, JoinPolicy::Open);
    let result = world.with_services(|runtime, services| {
        runtime.block_on(services.clubs.create_club(&manager("max@example.com"), &draft))
    });
    drop(world.record(result));
}

#[when("the same membership is written to the backend again")]
fn the_same_membership_is_written_again(world: &ClubLifecycleWorld) {
    let request = world.live_membership();
    let error = world
        .with_services(|runtime, services| {
            runtime.block_on(services.backend.create_membership(&request))
        })
        .expect_err("the backend refuses a second live membership");
    world.conflict.set(error);
}

#[when("the manager approves the pending membership")]
fn the_manager_approves_the_pending_membership(world: &ClubLifecycleWorld) {
    let pending = world.membership.get().expect("a pending membership");
    let reviewed = world
        .with_services(|runtime, services| {
            runtime.block_on(services.memberships.review_membership(
                &manager(OWNER),
                &pending.id,
                ModerationDecision::Approve,
            ))
        })
        .expect("membership approved");
    world.membership.set(reviewed);
}

#[when("the manager changes only the description")]
fn the_manager_changes_only_the_description(world: &ClubLifecycleWorld) {
    let id = world.club().id;
    let patch = ClubPatch {
        description: Some(NEW_DESCRIPTION.to_owned()),
        ..ClubPatch::default()
    };
    let updated = world
        .with_services(|runtime, services| {
            runtime.block_on(services.clubs.update_club_fields(&manager(OWNER), &id, &patch))
        })
        .expect("club updated");
    world.club.set(updated);
}

// -----------------------------------------------------------------------------
// Then Steps
// -----------------------------------------------------------------------------

#[then("the request fails with {code}")]
fn the_request_fails_with(world: &ClubLifecycleWorld, code: String) {
    let error = world.error.get().expect("the last request failed");
    assert_eq!(error.code().as_str(), code, "unexpected failure: {error}");
}

#[then("the club is pending moderation")]
fn the_club_is_pending_moderation(world: &ClubLifecycleWorld) {
    assert_eq!(world.club().status, ModerationStatus::Pending);
}

#[then("the approved listing holds {count} clubs")]
fn the_approved_listing_holds(world: &ClubLifecycleWorld, count: usize) {
    let listed = world
        .with_services(|runtime, services| {
            runtime.block_on(services.clubs.list_clubs(ClubQuery::approved()))
        })
        .expect("listed");
    assert_eq!(listed.len(), count);
}

#[then("the member holds an active unpaid membership")]
fn the_member_holds_an_active_unpaid_membership(world: &ClubLifecycleWorld) {
    let membership = world.membership.get().expect("joined");
    assert_eq!(membership.status, MembershipStatus::Active);
    assert!(membership.payment_id.is_none());
}

#[then("the payment intent count is {count}")]
fn the_payment_intent_count_is(world: &ClubLifecycleWorld, count: usize) {
    world.with_services(|_, services| assert_eq!(services.provider.intents_created(), count));
}

#[then("the stored membership count is {count}")]
fn the_stored_membership_count_is(world: &ClubLifecycleWorld, count: usize) {
    world.with_services(|_, services| assert_eq!(services.backend.memberships().len(), count));
}

#[then("the stored club count is {count}")]
fn the_stored_club_count_is(world: &ClubLifecycleWorld, count: usize) {
    world.with_services(|_, services| assert_eq!(services.backend.clubs().len(), count));
}

#[then("the backend reports a conflict")]
fn the_backend_reports_a_conflict(world: &ClubLifecycleWorld) {
    let error = world.conflict.get().expect("a refused write");
    assert!(error.is_conflict(), "unexpected backend error: {error}");
}

#[then("the member's membership is pending")]
fn the_membership_is_pending(world: &ClubLifecycleWorld) {
    let membership = world.membership.get().expect("joined");
    assert_eq!(membership.status, MembershipStatus::Pending);
}

#[then("the member's membership is active")]
fn the_membership_is_active(world: &ClubLifecycleWorld) {
    let membership = world.membership.get().expect("joined");
    assert_eq!(membership.status, MembershipStatus::Active);
}

#[then("the club stats show {active} active and {pending} pending members")]
fn the_club_stats_show(world: &ClubLifecycleWorld, active: u64, pending: u64) {
    assert_eq!(world.stats(), (active, pending));
}

#[then("reading the club again shows the new description")]
fn reading_again_shows_the_new_description(world: &ClubLifecycleWorld) {
    let reread = world.read_club();
    assert_eq!(reread.description, NEW_DESCRIPTION);
    assert_eq!(reread, world.club());
}

#[then("every other field matches the first read")]
fn every_other_field_matches_the_first_read(world: &ClubLifecycleWorld) {
    let mut expected = world.first_read.get().expect("first read");
    expected.description = NEW_DESCRIPTION.to_owned();
    assert_eq!(world.read_club(), expected);
}

// -----------------------------------------------------------------------------
// Scenario Bindings
// -----------------------------------------------------------------------------

#[scenario(
    path = "tests/features/club_lifecycle.feature",
    name = "A new club waits for moderation before taking members"
)]
fn a_new_club_waits_for_moderation(world: ClubLifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/club_lifecycle.feature",
    name = "Club names are unique regardless of case"
)]
fn club_names_are_unique(world: ClubLifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/club_lifecycle.feature",
    name = "Rejected clubs stay rejected"
)]
fn rejected_clubs_stay_rejected(world: ClubLifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/club_lifecycle.feature",
    name = "Members cannot moderate clubs"
)]
fn members_cannot_moderate(world: ClubLifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/club_lifecycle.feature",
    name = "A membership written elsewhere blocks a join"
)]
fn memberships_written_elsewhere_block_a_join(world: ClubLifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/club_lifecycle.feature",
    name = "Clubs that need approval start members pending"
)]
fn approval_clubs_start_members_pending(world: ClubLifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/club_lifecycle.feature",
    name = "Editing one field leaves the rest of a cached club alone"
)]
fn partial_edits_keep_the_rest_of_a_cached_club(world: ClubLifecycleWorld) {
    drop(world);
}
