//! Port for the external identity provider.
//!
//! The provider owns credentials and sessions. It pushes session changes
//! through a [`watch`] channel; the session store resolves each change to a
//! principal.

use async_trait::async_trait;
use tokio::sync::watch;
use url::Url;

use crate::domain::{AccessToken, DisplayName, Email, LoginCredentials, ProfilePatch, SignUpRequest};

use super::define_port_error;

define_port_error! {
    /// Identity provider failures.
    pub enum AuthError {
        /// Wrong email or password, or the account does not exist.
        InvalidCredentials { message: String } => "invalid credentials: {message}",
        /// The provider could not be reached.
        Network { message: String } => "identity provider unreachable: {message}",
        /// The user closed the federated sign-in popup.
        PopupCancelled => "sign-in popup was closed before completing",
        /// The provider refused the request for another reason.
        Provider { message: String } => "identity provider error: {message}",
    }
}

/// A signed-in session as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySession {
    /// Verified account email.
    pub email: Email,
    /// Name from the provider profile, if any.
    pub display_name: Option<DisplayName>,
    /// Photo from the provider profile, if any.
    pub photo_url: Option<Url>,
    /// Bearer token for backend calls.
    pub access_token: AccessToken,
}

/// External identity provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in with email and password.
    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<IdentitySession, AuthError>;

    /// Sign in through the federated (popup) flow.
    async fn sign_in_with_popup(&self) -> Result<IdentitySession, AuthError>;

    /// Create an account and sign it in.
    async fn sign_up(&self, request: &SignUpRequest) -> Result<IdentitySession, AuthError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Send a password reset email.
    async fn send_password_reset(&self, email: &Email) -> Result<(), AuthError>;

    /// Update the provider-side profile of the signed-in account.
    async fn update_profile(&self, patch: &ProfilePatch) -> Result<(), AuthError>;

    /// The session in effect right now.
    fn current_session(&self) -> Option<IdentitySession>;

    /// Subscribe to session changes. The receiver starts at the current
    /// session.
    fn subscribe(&self) -> watch::Receiver<Option<IdentitySession>>;
}
