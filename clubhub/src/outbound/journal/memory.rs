//! Process-local checkout journal.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::checkout::{CheckoutId, CheckoutRecord};
use crate::domain::idempotency::PurchaseFingerprint;
use crate::domain::ports::{CheckoutJournal, CheckoutJournalError};

/// Journal holding records in memory. Records are lost with the process.
#[derive(Debug, Default)]
pub struct InMemoryCheckoutJournal {
    records: Mutex<BTreeMap<CheckoutId, CheckoutRecord>>,
}

impl InMemoryCheckoutJournal {
    /// An empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> std::sync::MutexGuard<'_, BTreeMap<CheckoutId, CheckoutRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CheckoutJournal for InMemoryCheckoutJournal {
    async fn save(&self, record: &CheckoutRecord) -> Result<(), CheckoutJournalError> {
        self.records().insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, id: &CheckoutId) -> Result<Option<CheckoutRecord>, CheckoutJournalError> {
        Ok(self.records().get(id).cloned())
    }

    async fn find_in_flight(
        &self,
        fingerprint: &PurchaseFingerprint,
    ) -> Result<Option<CheckoutRecord>, CheckoutJournalError> {
        Ok(self
            .records()
            .values()
            .filter(|record| record.is_in_flight() && &record.fingerprint == fingerprint)
            .min_by_key(|record| record.created_at)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<CheckoutRecord>, CheckoutJournalError> {
        let mut records: Vec<_> = self.records().values().cloned().collect();
        records.sort_by_key(|record| record.created_at);
        Ok(records)
    }

    async fn remove(&self, id: &CheckoutId) -> Result<(), CheckoutJournalError> {
        self.records().remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::checkout::CheckoutStep;
    use crate::domain::idempotency::fingerprint_json;
    use crate::domain::{Money, PaymentTarget};
    use crate::test_support::fixtures::{club_id, email, fixture_now};
    use chrono::TimeDelta;

    fn record(fingerprint_seed: &str, offset_minutes: i64) -> CheckoutRecord {
        CheckoutRecord::start(
            email("ann@example.com"),
            PaymentTarget::Membership {
                club_id: club_id("c1"),
            },
            Money::from_major(50),
            fingerprint_json(&fingerprint_seed).expect("fingerprint"),
            fixture_now() + TimeDelta::minutes(offset_minutes),
        )
    }

    #[tokio::test]
    async fn in_flight_lookup_ignores_finished_records() {
        let journal = InMemoryCheckoutJournal::new();
        let mut finished = record("same", 0);
        finished.step = CheckoutStep::Granted;
        let running = record("same", 5);
        journal.save(&finished).await.expect("saved");
        journal.save(&running).await.expect("saved");

        let found = journal
            .find_in_flight(&running.fingerprint)
            .await
            .expect("lookup");

        assert_eq!(found.map(|hit| hit.id), Some(running.id));
    }

    #[tokio::test]
    async fn list_is_oldest_first_and_remove_is_idempotent() {
        let journal = InMemoryCheckoutJournal::new();
        let newer = record("b", 10);
        let older = record("a", 0);
        journal.save(&newer).await.expect("saved");
        journal.save(&older).await.expect("saved");

        let listed = journal.list().await.expect("listed");
        assert_eq!(
            listed.iter().map(|entry| entry.id).collect::<Vec<_>>(),
            vec![older.id, newer.id]
        );

        journal.remove(&older.id).await.expect("removed");
        journal.remove(&older.id).await.expect("removing twice is fine");
        assert_eq!(journal.list().await.expect("listed").len(), 1);
    }
}
