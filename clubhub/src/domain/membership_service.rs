//! Membership lifecycle: joining, leaving and manager review.
//!
//! Paid clubs never get a membership here. `join_club` reports
//! [`JoinOutcome::PaymentRequired`] and the checkout sequencer creates the
//! membership once the payment is on the ledger.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use super::authorization::{Capability, require};
use super::port_errors::{map_backend, map_backend_error};
use super::ports::{ClubRepository, MembershipRepository};
use super::query::{QueryClient, QueryKey, QueryScope};
use super::{
    Club, ClubId, Email, Error, JoinOutcome, Membership, MembershipId, MembershipStatus,
    ModerationDecision, NewMembership, Principal,
};

const DUPLICATE_MEMBERSHIP: &str = "You already have an active membership for this club!";

/// Map a membership-creation conflict.
pub(crate) fn duplicate_membership(_message: String) -> Error {
    Error::duplicate_membership(DUPLICATE_MEMBERSHIP)
}

/// Membership lifecycle service.
pub struct MembershipService<C, M> {
    clubs: Arc<C>,
    memberships: Arc<M>,
    queries: QueryClient,
    clock: Arc<dyn Clock>,
}

impl<C, M> MembershipService<C, M> {
    /// Create a service over the club and membership repositories.
    pub fn new(
        clubs: Arc<C>,
        memberships: Arc<M>,
        queries: QueryClient,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            clubs,
            memberships,
            queries,
            clock,
        }
    }
}

impl<C, M> MembershipService<C, M>
where
    C: ClubRepository,
    M: MembershipRepository,
{
    async fn load_club(&self, id: &ClubId) -> Result<Club, Error> {
        self.clubs
            .find_club(id)
            .await
            .map_err(map_backend)?
            .ok_or_else(|| Error::not_found(format!("club {id} not found")))
    }

    async fn load_membership(&self, id: &MembershipId) -> Result<Membership, Error> {
        self.memberships
            .find_membership(id)
            .await
            .map_err(map_backend)?
            .ok_or_else(|| Error::not_found(format!("membership {id} not found")))
    }

    async fn ensure_not_member(&self, user: &Email, club_id: &ClubId) -> Result<(), Error> {
        let held = self
            .memberships
            .memberships_for_user(user)
            .await
            .map_err(map_backend)?;
        if held
            .iter()
            .any(|membership| &membership.club_id == club_id && membership.status.is_live())
        {
            return Err(Error::duplicate_membership(DUPLICATE_MEMBERSHIP));
        }
        Ok(())
    }

    /// Join a club.
    ///
    /// Free clubs create the membership immediately with the status the
    /// club's join policy dictates. Paid clubs write nothing and ask for a
    /// checkout instead.
    pub async fn join_club(
        &self,
        principal: &Principal,
        club_id: &ClubId,
    ) -> Result<JoinOutcome, Error> {
        let user = require(principal, Capability::JoinClub)?;
        let club = self.load_club(club_id).await?;
        if !club.is_approved() {
            return Err(Error::invalid_transition(format!(
                "club {club_id} is not open for members"
            )));
        }
        self.ensure_not_member(&user.email, club_id).await?;
        if club.requires_payment() {
            return Ok(JoinOutcome::PaymentRequired {
                club_id: club.id,
                amount: club.membership_fee,
            });
        }

        let request = NewMembership {
            user_email: user.email.clone(),
            club_id: club.id.clone(),
            status: club.join_policy.initial_status(),
            payment_id: None,
            joined_at: self.clock.utc(),
        };
        let membership = self
            .memberships
            .create_membership(&request)
            .await
            .map_err(|err| map_backend_error(err, duplicate_membership))
            .inspect_err(|err| {
                warn!(user = %user.email, club_id = %club_id, code = %err.code(), "join failed");
            })?;
        self.queries.invalidate(QueryScope::MEMBERSHIP_CHANGED);
        info!(
            membership_id = %membership.id,
            club_id = %club_id,
            status = %membership.status,
            "joined club"
        );
        Ok(JoinOutcome::Joined(membership))
    }

    /// Leave a club. The membership is deleted whatever its status.
    pub async fn leave_club(
        &self,
        principal: &Principal,
        membership_id: &MembershipId,
    ) -> Result<(), Error> {
        let user = require(principal, Capability::JoinClub)?;
        let membership = self.load_membership(membership_id).await?;
        if membership.user_email != user.email {
            return Err(Error::forbidden(format!(
                "membership {membership_id} belongs to someone else"
            )));
        }
        let removed = self
            .memberships
            .delete_membership(membership_id)
            .await
            .map_err(map_backend)?;
        if removed == 0 {
            return Err(Error::not_found(format!(
                "membership {membership_id} not found"
            )));
        }
        self.queries.invalidate(QueryScope::MEMBERSHIP_CHANGED);
        info!(membership_id = %membership_id, club_id = %membership.club_id, "left club");
        Ok(())
    }

    /// Approve or reject a pending membership of a club the caller owns.
    /// Repeating the decision already taken is a no-op.
    pub async fn review_membership(
        &self,
        principal: &Principal,
        membership_id: &MembershipId,
        decision: ModerationDecision,
    ) -> Result<Membership, Error> {
        let user = require(principal, Capability::ManageClubMembers)?;
        let mut membership = self.load_membership(membership_id).await?;
        let club = self.load_club(&membership.club_id).await?;
        if !club.is_owned_by(&user.email) {
            return Err(Error::forbidden(format!(
                "club {} is not yours to manage",
                club.id
            )));
        }
        let target = match decision {
            ModerationDecision::Approve => MembershipStatus::Active,
            ModerationDecision::Reject => MembershipStatus::Rejected,
        };
        if membership.status == target {
            return Ok(membership);
        }
        if membership.status != MembershipStatus::Pending {
            return Err(Error::invalid_transition(format!(
                "membership {membership_id} is {} and can no longer be reviewed",
                membership.status
            )));
        }
        self.memberships
            .set_membership_status(membership_id, target)
            .await
            .map_err(map_backend)?;
        membership.status = target;
        self.queries.invalidate(QueryScope::MEMBERSHIP_CHANGED);
        info!(membership_id = %membership_id, status = %target, "membership reviewed");
        Ok(membership)
    }

    /// Memberships held by the signed-in user.
    pub async fn my_memberships(&self, principal: &Principal) -> Result<Vec<Membership>, Error> {
        let user = require(principal, Capability::ViewOwnDashboard)?;
        let memberships = Arc::clone(&self.memberships);
        let email = user.email.clone();
        self.queries
            .fetch(QueryKey::UserMemberships(user.email.clone()), || async move {
                memberships
                    .memberships_for_user(&email)
                    .await
                    .map_err(map_backend)
            })
            .await
    }

    /// Members of a club the caller owns.
    pub async fn club_members(
        &self,
        principal: &Principal,
        club_id: &ClubId,
    ) -> Result<Vec<Membership>, Error> {
        let user = require(principal, Capability::ManageClubMembers)?;
        let club = self.load_club(club_id).await?;
        if !club.is_owned_by(&user.email) {
            return Err(Error::forbidden(format!("club {club_id} is not yours")));
        }
        let memberships = Arc::clone(&self.memberships);
        let id = club_id.clone();
        self.queries
            .fetch(QueryKey::ClubMembers(club_id.clone()), || async move {
                memberships
                    .memberships_for_club(&id)
                    .await
                    .map_err(map_backend)
            })
            .await
    }
}

#[cfg(test)]
#[path = "membership_service_tests.rs"]
mod tests;
