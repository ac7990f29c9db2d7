//! Session store: resolves identity-provider sessions to principals.
//!
//! The provider only knows who signed in. Role and account status come
//! from the backend user record, which the store creates on first sign-in.
//! The resolved principal and bearer token are published through a
//! [`SessionHandle`] that readers and the REST adapter share.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::authorization::{Capability, require};
use super::port_errors::{map_auth_error, map_backend};
use super::ports::{
    AccessTokenSource, BackendError, IdentityProvider, IdentitySession, UserDirectory,
};
use super::query::{QueryClient, QueryScope};
use super::{
    AccessToken, DisplayName, Email, Error, LoginCredentials, Principal, ProfilePatch,
    SignUpRequest, User,
};

/// Principal and bearer token currently in effect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Who is signed in.
    pub principal: Principal,
    /// Bearer token sent to the backend, when signed in.
    pub token: Option<AccessToken>,
}

impl SessionSnapshot {
    /// Nobody signed in.
    pub fn guest() -> Self {
        Self::default()
    }
}

/// Shared view of the current session.
///
/// Cloning is cheap; clones observe the same session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    state: Arc<watch::Sender<SessionSnapshot>>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle {
    /// A handle starting as guest.
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionSnapshot::guest());
        Self {
            state: Arc::new(state),
        }
    }

    /// Current principal.
    pub fn principal(&self) -> Principal {
        self.state.borrow().principal.clone()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Observe principal changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    fn publish(&self, snapshot: SessionSnapshot) {
        self.state.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

impl AccessTokenSource for SessionHandle {
    fn access_token(&self) -> Option<AccessToken> {
        self.state.borrow().token.clone()
    }
}

/// Ensure the backend record for `session` exists and build the snapshot.
async fn resolve<U: UserDirectory>(
    users: &U,
    session: Option<IdentitySession>,
) -> Result<SessionSnapshot, Error> {
    let Some(session) = session else {
        return Ok(SessionSnapshot::guest());
    };
    let record = match users.find_user(&session.email).await.map_err(map_backend)? {
        Some(found) => found,
        None => first_sign_in(users, &session).await?,
    };
    Ok(SessionSnapshot {
        principal: Principal::from(record),
        token: Some(session.access_token),
    })
}

async fn first_sign_in<U: UserDirectory>(
    users: &U,
    session: &IdentitySession,
) -> Result<User, Error> {
    let fresh = User::new_member(
        session.email.clone(),
        session
            .display_name
            .clone()
            .unwrap_or_else(|| DisplayName::from_email(&session.email)),
        session.photo_url.clone(),
    );
    match users.create_user(&fresh).await {
        Ok(()) => {
            info!(user = %fresh.email, "created user record on first sign-in");
            Ok(fresh)
        }
        Err(BackendError::Conflict { .. }) => {
            debug!(user = %fresh.email, "user record already existed");
            users
                .find_user(&fresh.email)
                .await
                .map_err(map_backend)?
                .ok_or_else(|| Error::internal(format!("user {} vanished", fresh.email)))
        }
        Err(err) => Err(map_backend(err)),
    }
}

/// Session store over an identity provider and the backend user directory.
pub struct SessionStore<I, U> {
    identity: Arc<I>,
    users: Arc<U>,
    handle: SessionHandle,
    queries: QueryClient,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<I, U> SessionStore<I, U> {
    /// Create a store publishing to `handle`. Nothing happens until
    /// [`SessionStore::init`].
    pub fn new(identity: Arc<I>, users: Arc<U>, handle: SessionHandle, queries: QueryClient) -> Self {
        Self {
            identity,
            users,
            handle,
            queries,
            listener: Mutex::new(None),
        }
    }

    /// Handle readers observe.
    pub const fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// The principal in effect right now.
    pub fn current_principal(&self) -> Principal {
        self.handle.principal()
    }

    /// Stop following the identity provider and fall back to guest.
    pub fn teardown(&self) {
        if let Some(listener) = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            listener.abort();
        }
        self.handle.publish(SessionSnapshot::guest());
        debug!("session store torn down");
    }
}

impl<I, U> SessionStore<I, U>
where
    I: IdentityProvider + 'static,
    U: UserDirectory + 'static,
{
    /// Resolve `session`, publish the result and return the principal.
    /// A failed resolution publishes guest.
    async fn settle(&self, session: Option<IdentitySession>) -> Result<Principal, Error> {
        match resolve(self.users.as_ref(), session).await {
            Ok(snapshot) => {
                let principal = snapshot.principal.clone();
                self.handle.publish(snapshot);
                self.queries.invalidate(QueryScope::ALL);
                Ok(principal)
            }
            Err(err) => {
                warn!(code = %err.code(), "could not resolve session; continuing as guest");
                self.handle.publish(SessionSnapshot::guest());
                Err(err)
            }
        }
    }

    /// Resolve the provider's current session and follow its changes until
    /// [`SessionStore::teardown`].
    pub async fn init(&self) -> Result<Principal, Error> {
        let mut changes = self.identity.subscribe();
        let resolved = self.settle(self.identity.current_session()).await;

        let users = Arc::clone(&self.users);
        let handle = self.handle.clone();
        let queries = self.queries.clone();
        let listener = tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let session = changes.borrow_and_update().clone();
                let snapshot = resolve(users.as_ref(), session)
                    .await
                    .unwrap_or_else(|err| {
                        warn!(code = %err.code(), "could not resolve session change");
                        SessionSnapshot::guest()
                    });
                handle.publish(snapshot);
                queries.invalidate(QueryScope::ALL);
            }
            debug!("identity provider closed its session stream");
        });
        if let Some(previous) = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(listener)
        {
            previous.abort();
        }
        resolved
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, credentials: &LoginCredentials) -> Result<Principal, Error> {
        let session = self
            .identity
            .sign_in(credentials)
            .await
            .map_err(map_auth_error)?;
        let principal = self.settle(Some(session)).await?;
        info!(user = %credentials.email(), "signed in");
        Ok(principal)
    }

    /// Sign in through the federated popup.
    pub async fn sign_in_with_popup(&self) -> Result<Principal, Error> {
        let session = self
            .identity
            .sign_in_with_popup()
            .await
            .map_err(map_auth_error)?;
        self.settle(Some(session)).await
    }

    /// Create an account, sign it in and create its backend record.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<Principal, Error> {
        let session = self
            .identity
            .sign_up(request)
            .await
            .map_err(map_auth_error)?;
        let principal = self.settle(Some(session)).await?;
        info!(user = %request.credentials().email(), "signed up");
        Ok(principal)
    }

    /// End the session.
    pub async fn sign_out(&self) -> Result<(), Error> {
        self.identity.sign_out().await.map_err(map_auth_error)?;
        self.handle.publish(SessionSnapshot::guest());
        self.queries.invalidate(QueryScope::ALL);
        info!("signed out");
        Ok(())
    }

    /// Send a password reset email.
    pub async fn send_password_reset(&self, email: &Email) -> Result<(), Error> {
        self.identity
            .send_password_reset(email)
            .await
            .map_err(map_auth_error)
    }

    /// Update the signed-in user's name or photo with the provider and the
    /// backend record, then re-resolve the principal.
    pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<Principal, Error> {
        let principal = self.current_principal();
        let user = require(&principal, Capability::UpdateOwnProfile)?;
        if patch.is_empty() {
            return Ok(principal.clone());
        }
        self.identity
            .update_profile(patch)
            .await
            .map_err(map_auth_error)?;
        self.users
            .update_profile(&user.email, patch)
            .await
            .map_err(map_backend)?;
        info!(user = %user.email, "profile updated");
        self.refresh().await
    }

    /// Re-read the backend record, e.g. after a role change.
    pub async fn refresh(&self) -> Result<Principal, Error> {
        self.settle(self.identity.current_session()).await
    }
}

impl<I, U> Drop for SessionStore<I, U> {
    fn drop(&mut self) {
        if let Some(listener) = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            listener.abort();
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
