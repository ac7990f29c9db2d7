//! Port for the backend `payments` ledger and admin aggregates.

use async_trait::async_trait;

use crate::domain::{Email, NewPayment, Payment, PlatformStats};

use super::BackendError;

/// Append-only payment ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Record a completed payment.
    ///
    /// Idempotent on [`NewPayment::idempotency_key`]: replaying the same key
    /// returns the payment recorded the first time instead of a new entry.
    async fn record_payment(&self, payment: &NewPayment) -> Result<Payment, BackendError>;

    /// Payments made by `email`.
    async fn payments_for_user(&self, email: &Email) -> Result<Vec<Payment>, BackendError>;

    /// Every payment on the platform.
    async fn all_payments(&self) -> Result<Vec<Payment>, BackendError>;
}

/// Platform-wide aggregates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsQuery: Send + Sync {
    /// Revenue and entity totals.
    async fn platform_stats(&self) -> Result<PlatformStats, BackendError>;
}
