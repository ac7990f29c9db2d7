//! Club lifecycle: creation, moderation, owner edits and listings.

use std::sync::Arc;

use tracing::{info, warn};

use super::authorization::{Capability, require};
use super::moderation::Transition;
use super::port_errors::{map_backend, map_backend_error};
use super::ports::ClubRepository;
use super::query::{QueryClient, QueryKey, QueryScope};
use super::{
    Club, ClubDraft, ClubId, ClubPatch, ClubQuery, ClubStats, Error, ModerationDecision, Principal,
};

const DUPLICATE_CLUB_NAME: &str = "Club with this name already exists";

/// Club lifecycle service.
pub struct ClubService<C> {
    clubs: Arc<C>,
    queries: QueryClient,
}

impl<C> ClubService<C> {
    /// Create a service over a club repository and a query cache.
    pub fn new(clubs: Arc<C>, queries: QueryClient) -> Self {
        Self { clubs, queries }
    }
}

impl<C> ClubService<C>
where
    C: ClubRepository,
{
    fn duplicate_name(_message: String) -> Error {
        Error::duplicate_club_name(DUPLICATE_CLUB_NAME)
    }

    async fn load(&self, id: &ClubId) -> Result<Club, Error> {
        self.clubs
            .find_club(id)
            .await
            .map_err(map_backend)?
            .ok_or_else(|| Error::not_found(format!("club {id} not found")))
    }

    /// Submit a new club for moderation. The club starts `pending`.
    pub async fn create_club(&self, principal: &Principal, draft: &ClubDraft) -> Result<Club, Error> {
        let user = require(principal, Capability::CreateClub)?;
        let new_club = draft.validate()?;
        let club = self
            .clubs
            .create_club(&user.email, &new_club)
            .await
            .map_err(|err| map_backend_error(err, Self::duplicate_name))
            .inspect_err(|err| {
                warn!(owner = %user.email, name = %new_club.name, code = %err.code(), "club creation failed");
            })?;
        self.queries.invalidate(QueryScope::CLUB_CHANGED);
        info!(club_id = %club.id, owner = %user.email, "club submitted for moderation");
        Ok(club)
    }

    /// Approve or reject a club. Re-applying the current outcome writes
    /// nothing.
    pub async fn moderate_club(
        &self,
        principal: &Principal,
        id: &ClubId,
        decision: ModerationDecision,
    ) -> Result<Club, Error> {
        require(principal, Capability::ModerateClubs)?;
        let mut club = self.load(id).await?;
        match club.status.apply(decision)? {
            Transition::Unchanged => Ok(club),
            Transition::Changed(status) => {
                self.clubs
                    .set_club_status(id, status)
                    .await
                    .map_err(map_backend)?;
                club.status = status;
                self.queries.invalidate(QueryScope::CLUB_CHANGED);
                info!(club_id = %id, %status, "club moderated");
                Ok(club)
            }
        }
    }

    /// Change content fields of a club owned by the caller. Only supplied
    /// fields change and the status is untouched.
    pub async fn update_club_fields(
        &self,
        principal: &Principal,
        id: &ClubId,
        patch: &ClubPatch,
    ) -> Result<Club, Error> {
        let user = require(principal, Capability::ManageOwnClub)?;
        let validated = patch.validate()?;
        let mut club = self.load(id).await?;
        if !club.is_owned_by(&user.email) {
            return Err(Error::forbidden(format!("club {id} is not yours to edit")));
        }
        self.clubs
            .update_club(id, &validated)
            .await
            .map_err(|err| map_backend_error(err, Self::duplicate_name))?;
        club.apply_patch(&validated);
        self.queries.invalidate(QueryScope::CLUB_CHANGED);
        info!(club_id = %id, "club updated");
        Ok(club)
    }

    /// List clubs matching `query`.
    pub async fn list_clubs(&self, query: ClubQuery) -> Result<Vec<Club>, Error> {
        let clubs = Arc::clone(&self.clubs);
        let filter = query.clone();
        self.queries
            .fetch(QueryKey::Clubs(query), || async move {
                clubs.list_clubs(&filter).await.map_err(map_backend)
            })
            .await
    }

    /// Fetch one club.
    pub async fn get_club(&self, id: &ClubId) -> Result<Club, Error> {
        self.queries
            .fetch(QueryKey::Club(id.clone()), || self.load(id))
            .await
    }

    /// Clubs owned by the signed-in manager, any status.
    pub async fn my_clubs(&self, principal: &Principal) -> Result<Vec<Club>, Error> {
        let user = require(principal, Capability::ManageOwnClub)?;
        self.list_clubs(ClubQuery::owned_by(user.email.clone())).await
    }

    /// Revenue and membership summary for the owning manager.
    pub async fn club_stats(&self, principal: &Principal, id: &ClubId) -> Result<ClubStats, Error> {
        let user = require(principal, Capability::ViewClubFinance)?;
        let club = self.get_club(id).await?;
        if !club.is_owned_by(&user.email) {
            return Err(Error::forbidden(format!("club {id} is not yours")));
        }
        let clubs = Arc::clone(&self.clubs);
        let club_id = id.clone();
        self.queries
            .fetch(QueryKey::ClubStats(id.clone()), || async move {
                clubs.club_stats(&club_id).await.map_err(map_backend)
            })
            .await
    }
}

#[cfg(test)]
#[path = "club_service_tests.rs"]
mod tests;
