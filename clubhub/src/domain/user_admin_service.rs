//! User administration, payment history and platform statistics.

use std::sync::Arc;

use tracing::info;

use super::authorization::{Capability, require};
use super::port_errors::map_backend;
use super::ports::{PaymentLedger, StatsQuery, UserDirectory};
use super::query::{QueryClient, QueryKey, QueryScope};
use super::{AccessUpdate, AccountStatus, Email, Error, Payment, PlatformStats, Principal, Role, User};

/// Administrative reads and writes over users and the payment ledger.
pub struct UserAdminService<U, L, S> {
    users: Arc<U>,
    ledger: Arc<L>,
    stats: Arc<S>,
    queries: QueryClient,
}

impl<U, L, S> UserAdminService<U, L, S> {
    /// Create a service over the user directory, ledger and stats ports.
    pub fn new(users: Arc<U>, ledger: Arc<L>, stats: Arc<S>, queries: QueryClient) -> Self {
        Self {
            users,
            ledger,
            stats,
            queries,
        }
    }
}

impl<U, L, S> UserAdminService<U, L, S>
where
    U: UserDirectory,
    L: PaymentLedger,
    S: StatsQuery,
{
    /// List users, optionally filtered by a name or email substring.
    pub async fn list_users(
        &self,
        principal: &Principal,
        search: Option<String>,
    ) -> Result<Vec<User>, Error> {
        require(principal, Capability::ManageUsers)?;
        let users = Arc::clone(&self.users);
        let filter = search
            .map(|raw| raw.trim().to_owned())
            .filter(|trimmed| !trimmed.is_empty());
        self.queries
            .fetch(QueryKey::Users(filter.clone()), || async move {
                users.list_users(filter).await.map_err(map_backend)
            })
            .await
    }

    /// The backend record of the signed-in user.
    pub async fn my_profile(&self, principal: &Principal) -> Result<User, Error> {
        let user = require(principal, Capability::ViewOwnDashboard)?;
        let users = Arc::clone(&self.users);
        let email = user.email.clone();
        self.queries
            .fetch(QueryKey::UserProfile(user.email.clone()), || async move {
                users
                    .find_user(&email)
                    .await
                    .map_err(map_backend)?
                    .ok_or_else(|| Error::not_found(format!("user {email} not found")))
            })
            .await
    }

    async fn change_access(
        &self,
        principal: &Principal,
        email: &Email,
        update: AccessUpdate,
    ) -> Result<(), Error> {
        let admin = require(principal, Capability::ManageUsers)?;
        if &admin.email == email {
            return Err(Error::forbidden("administrators cannot change their own access"));
        }
        self.users
            .update_access(email, update)
            .await
            .map_err(map_backend)?;
        self.queries.invalidate(QueryScope::USER_CHANGED);
        Ok(())
    }

    /// Change a user's role. Promotion after an approved manager
    /// application goes through here.
    pub async fn set_user_role(
        &self,
        principal: &Principal,
        email: &Email,
        role: Role,
    ) -> Result<(), Error> {
        self.change_access(
            principal,
            email,
            AccessUpdate {
                role: Some(role),
                status: None,
            },
        )
        .await?;
        info!(user = %email, %role, "user role changed");
        Ok(())
    }

    /// Ban or reinstate a user.
    pub async fn set_user_status(
        &self,
        principal: &Principal,
        email: &Email,
        status: AccountStatus,
    ) -> Result<(), Error> {
        self.change_access(
            principal,
            email,
            AccessUpdate {
                role: None,
                status: Some(status),
            },
        )
        .await?;
        info!(user = %email, %status, "user status changed");
        Ok(())
    }

    /// Platform-wide totals.
    pub async fn platform_stats(&self, principal: &Principal) -> Result<PlatformStats, Error> {
        require(principal, Capability::ViewPlatformStats)?;
        let stats = Arc::clone(&self.stats);
        self.queries
            .fetch(QueryKey::PlatformStats, || async move {
                stats.platform_stats().await.map_err(map_backend)
            })
            .await
    }

    /// Every payment on the platform.
    pub async fn all_payments(&self, principal: &Principal) -> Result<Vec<Payment>, Error> {
        require(principal, Capability::ViewPlatformStats)?;
        let ledger = Arc::clone(&self.ledger);
        self.queries
            .fetch(QueryKey::AllPayments, || async move {
                ledger.all_payments().await.map_err(map_backend)
            })
            .await
    }

    /// Payments made by the signed-in user.
    pub async fn payment_history(&self, principal: &Principal) -> Result<Vec<Payment>, Error> {
        let user = require(principal, Capability::ViewPaymentHistory)?;
        let ledger = Arc::clone(&self.ledger);
        let email = user.email.clone();
        self.queries
            .fetch(QueryKey::UserPayments(user.email.clone()), || async move {
                ledger.payments_for_user(&email).await.map_err(map_backend)
            })
            .await
    }
}
