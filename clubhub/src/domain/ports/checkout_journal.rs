//! Port for durable checkout records.

use async_trait::async_trait;

use crate::domain::checkout::{CheckoutId, CheckoutRecord};
use crate::domain::idempotency::PurchaseFingerprint;

use super::define_port_error;

define_port_error! {
    /// Journal failures.
    pub enum CheckoutJournalError {
        /// The underlying storage failed.
        Io { message: String } => "checkout journal I/O failed: {message}",
        /// A record could not be encoded or decoded.
        Serialization { message: String } =>
            "checkout journal serialisation failed: {message}",
    }
}

/// Durable store of checkout records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutJournal: Send + Sync {
    /// Insert or replace a record. Must be durable before returning.
    async fn save(&self, record: &CheckoutRecord) -> Result<(), CheckoutJournalError>;

    /// Fetch a record by identifier.
    async fn load(&self, id: &CheckoutId) -> Result<Option<CheckoutRecord>, CheckoutJournalError>;

    /// The in-flight record for a purchase, if any.
    async fn find_in_flight(
        &self,
        fingerprint: &PurchaseFingerprint,
    ) -> Result<Option<CheckoutRecord>, CheckoutJournalError>;

    /// Every record, oldest first.
    async fn list(&self) -> Result<Vec<CheckoutRecord>, CheckoutJournalError>;

    /// Drop a record. Removing a missing record is not an error.
    async fn remove(&self, id: &CheckoutId) -> Result<(), CheckoutJournalError>;
}
