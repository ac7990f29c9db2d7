//! The signed-in principal as seen by every gated operation.

use url::Url;

use super::user::{AccountStatus, DisplayName, Email, Role, User};

/// An authenticated user with the role and status read from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalUser {
    /// Account email.
    pub email: Email,
    /// Name shown in the header.
    pub display_name: DisplayName,
    /// Profile photo.
    pub photo_url: Option<Url>,
    /// Role read from the backend on sign-in.
    pub role: Role,
    /// Banned principals keep read access only.
    pub status: AccountStatus,
}

impl PrincipalUser {
    /// Whether the account is banned.
    pub fn is_banned(&self) -> bool {
        self.status == AccountStatus::Banned
    }
}

impl From<User> for PrincipalUser {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            display_name: user.display_name,
            photo_url: user.photo_url,
            role: user.role,
            status: user.status,
        }
    }
}

/// Who is making a request.
///
/// # Examples
/// ```
/// use clubhub::domain::Principal;
///
/// assert!(Principal::Guest.is_guest());
/// assert!(Principal::Guest.user().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Principal {
    /// No session.
    #[default]
    Guest,
    /// Signed in with a resolved backend user record.
    Authenticated(PrincipalUser),
}

impl Principal {
    /// Whether nobody is signed in.
    pub const fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }

    /// The signed-in user, if any.
    pub const fn user(&self) -> Option<&PrincipalUser> {
        match self {
            Self::Guest => None,
            Self::Authenticated(user) => Some(user),
        }
    }

    /// Email of the signed-in user, if any.
    pub fn email(&self) -> Option<&Email> {
        self.user().map(|user| &user.email)
    }

    /// Role of the signed-in user, if any.
    pub fn role(&self) -> Option<Role> {
        self.user().map(|user| user.role)
    }
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self::Authenticated(user.into())
    }
}
