//! Centralised authorization policy.
//!
//! Every gated operation names a [`Capability`] and asks [`authorize`] (or
//! [`require`] inside services, [`guard`] at navigation time). Roles are not a
//! ladder: `super_admin` and `club_manager` unlock disjoint tool sets and
//! neither implies the other. Any signed-in account holds the member
//! capabilities. A banned account keeps read access but loses every mutating
//! capability.

use serde::{Deserialize, Serialize};

use super::error::Error;
use super::principal::{Principal, PrincipalUser};
use super::user::Role;

/// Path guests are sent to when they hit a gated screen.
pub const LOGIN_PATH: &str = "/auth/login";
/// Path authenticated users are sent to when they lack a capability.
pub const HOME_PATH: &str = "/";

/// Closed set of gated actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    // Member capabilities.
    /// Join an approved club.
    JoinClub,
    /// Take a seat at an approved event.
    RegisterForEvent,
    /// Ask to become a club manager.
    ApplyForClubManager,
    /// See one's own memberships and registrations.
    ViewOwnDashboard,
    /// Edit display name and photo.
    UpdateOwnProfile,
    /// See one's own payments.
    ViewPaymentHistory,
    // Club operation tooling.
    /// Submit a club for moderation.
    CreateClub,
    /// Edit and inspect clubs one owns.
    ManageOwnClub,
    /// Create events for an owned club.
    CreateEvent,
    /// Review pending memberships of an owned club.
    ManageClubMembers,
    /// See revenue of an owned club.
    ViewClubFinance,
    // Platform administration.
    /// Approve or reject clubs.
    ModerateClubs,
    /// Approve or reject events.
    ModerateEvents,
    /// Approve or reject club-manager applications.
    ModerateApplications,
    /// Change roles and ban or unban accounts.
    ManageUsers,
    /// See platform-wide totals.
    ViewPlatformStats,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Self; 16] = [
        Self::JoinClub,
        Self::RegisterForEvent,
        Self::ApplyForClubManager,
        Self::ViewOwnDashboard,
        Self::UpdateOwnProfile,
        Self::ViewPaymentHistory,
        Self::CreateClub,
        Self::ManageOwnClub,
        Self::CreateEvent,
        Self::ManageClubMembers,
        Self::ViewClubFinance,
        Self::ModerateClubs,
        Self::ModerateEvents,
        Self::ModerateApplications,
        Self::ManageUsers,
        Self::ViewPlatformStats,
    ];

    /// Role the capability is reserved for; `None` means any signed-in user.
    pub const fn required_role(self) -> Option<Role> {
        match self {
            Self::JoinClub
            | Self::RegisterForEvent
            | Self::ApplyForClubManager
            | Self::ViewOwnDashboard
            | Self::UpdateOwnProfile
            | Self::ViewPaymentHistory => None,
            Self::CreateClub
            | Self::ManageOwnClub
            | Self::CreateEvent
            | Self::ManageClubMembers
            | Self::ViewClubFinance => Some(Role::ClubManager),
            Self::ModerateClubs
            | Self::ModerateEvents
            | Self::ModerateApplications
            | Self::ManageUsers
            | Self::ViewPlatformStats => Some(Role::SuperAdmin),
        }
    }

    /// Whether exercising the capability writes to the backend.
    pub const fn is_mutating(self) -> bool {
        !matches!(
            self,
            Self::ViewOwnDashboard
                | Self::ViewPaymentHistory
                | Self::ViewClubFinance
                | Self::ViewPlatformStats
        )
    }
}

/// Whether `principal` holds `capability`.
///
/// # Examples
/// ```
/// use clubhub::domain::{Capability, Principal, authorize};
///
/// assert!(!authorize(&Principal::Guest, Capability::JoinClub));
/// ```
pub fn authorize(principal: &Principal, capability: Capability) -> bool {
    principal
        .user()
        .is_some_and(|user| user_holds(user, capability))
}

fn user_holds(user: &PrincipalUser, capability: Capability) -> bool {
    if user.is_banned() && capability.is_mutating() {
        return false;
    }
    capability
        .required_role()
        .is_none_or(|required| required == user.role)
}

/// Outcome of a navigation-time capability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the requested screen.
    Allow,
    /// Send the guest to sign in, then back to `return_to`.
    RedirectToLogin {
        /// Path to resume after sign-in.
        return_to: String,
    },
    /// Signed in but not permitted; go home.
    RedirectHome,
}

impl GuardDecision {
    /// Target path for redirects, `None` when allowed.
    pub const fn redirect_path(&self) -> Option<&'static str> {
        match self {
            Self::Allow => None,
            Self::RedirectToLogin { .. } => Some(LOGIN_PATH),
            Self::RedirectHome => Some(HOME_PATH),
        }
    }
}

/// Decide what happens when `principal` opens `requested_path`, a screen
/// gated on `capability`. Never an error: guests are redirected to log in
/// with the original path preserved.
pub fn guard(principal: &Principal, capability: Capability, requested_path: &str) -> GuardDecision {
    match principal.user() {
        None => GuardDecision::RedirectToLogin {
            return_to: requested_path.to_owned(),
        },
        Some(user) if user_holds(user, capability) => GuardDecision::Allow,
        Some(_) => GuardDecision::RedirectHome,
    }
}

/// Service-side check returning the signed-in user.
///
/// # Errors
/// [`Error::unauthorized`] for guests, [`Error::forbidden`] when the user
/// lacks the capability or is banned.
pub fn require(principal: &Principal, capability: Capability) -> Result<&PrincipalUser, Error> {
    let Some(user) = principal.user() else {
        return Err(Error::unauthorized("sign in required"));
    };
    if user.is_banned() && capability.is_mutating() {
        return Err(Error::forbidden(format!("account {} is banned", user.email)));
    }
    if user_holds(user, capability) {
        Ok(user)
    } else {
        Err(Error::forbidden(format!(
            "role {} may not {capability:?}",
            user.role
        )))
    }
}
