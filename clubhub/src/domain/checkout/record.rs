//! Persisted checkout records.
//!
//! A record is written before every external side effect so a crash leaves
//! a visible marker of how far the sequence got:
//!
//! ```text
//! Started -> IntentCreated -> Charged -> PaymentRecorded -> Granted
//!                                                       \-> Orphaned
//! ```
//!
//! `Orphaned` means money was taken and recorded but the grant was refused
//! (the user already held it, or the event filled up). The payment stays on
//! the ledger for refund or manual linkage.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Email;
use crate::domain::error::Error;
use crate::domain::idempotency::{IdempotencyKey, PurchaseFingerprint};
use crate::domain::ids::PaymentId;
use crate::domain::money::Money;
use crate::domain::payment::PaymentTarget;
use crate::domain::ports::PaymentIntent;

/// Identifier of a checkout record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckoutId(Uuid);

impl CheckoutId {
    /// Fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for CheckoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for CheckoutId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Named step of the payment sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    /// Journalled before any provider call.
    Started,
    /// Provider intent exists; waiting for card details.
    IntentCreated,
    /// Card charged; nothing written to the ledger yet.
    Charged,
    /// Ledger entry written.
    PaymentRecorded,
    /// Membership or seat granted. Terminal.
    Granted,
    /// Paid for but the grant was refused. Terminal; needs an operator.
    Orphaned,
}

impl CheckoutStep {
    /// Steps a record may move to from this one.
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Started, Self::IntentCreated)
                | (Self::IntentCreated, Self::Charged)
                | (Self::Charged, Self::PaymentRecorded)
                | (Self::PaymentRecorded, Self::Granted | Self::Orphaned)
        )
    }

    /// Whether the sequence has finished, successfully or not.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Granted | Self::Orphaned)
    }

    /// Whether money has been taken.
    pub const fn is_charged(self) -> bool {
        matches!(
            self,
            Self::Charged | Self::PaymentRecorded | Self::Granted | Self::Orphaned
        )
    }

    /// Wire value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::IntentCreated => "intent_created",
            Self::Charged => "charged",
            Self::PaymentRecorded => "payment_recorded",
            Self::Granted => "granted",
            Self::Orphaned => "orphaned",
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One checkout, as persisted in the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRecord {
    /// Checkout identifier handed to the client.
    pub id: CheckoutId,
    /// Buyer.
    pub user_email: Email,
    /// What is being bought.
    pub target: PaymentTarget,
    /// Price fixed when the checkout began.
    pub amount: Money,
    /// Digest of buyer and target used to find an in-flight duplicate.
    pub fingerprint: PurchaseFingerprint,
    /// Sent with the ledger write so retries cannot double-record.
    pub idempotency_key: IdempotencyKey,
    /// How far the sequence got.
    pub step: CheckoutStep,
    /// Provider intent, once created.
    pub intent: Option<PaymentIntent>,
    /// Provider transaction, once charged.
    pub transaction_id: Option<String>,
    /// Ledger entry, once recorded.
    pub payment_id: Option<PaymentId>,
    /// Identifier of the membership or registration once granted.
    pub grant_id: Option<String>,
    /// Last failure shown to the user, for operators.
    pub last_error: Option<String>,
    /// When the checkout began.
    pub created_at: DateTime<Utc>,
    /// Last step change.
    pub updated_at: DateTime<Utc>,
}

impl CheckoutRecord {
    /// A fresh record at [`CheckoutStep::Started`].
    pub fn start(
        user_email: Email,
        target: PaymentTarget,
        amount: Money,
        fingerprint: PurchaseFingerprint,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CheckoutId::generate(),
            user_email,
            target,
            amount,
            fingerprint,
            idempotency_key: IdempotencyKey::random(),
            step: CheckoutStep::Started,
            intent: None,
            transaction_id: None,
            payment_id: None,
            grant_id: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next`, refusing to skip or rewind steps.
    pub fn advance(&mut self, next: CheckoutStep, now: DateTime<Utc>) -> Result<(), Error> {
        if !self.step.can_advance_to(next) {
            return Err(Error::internal(format!(
                "checkout {} cannot move from {} to {next}",
                self.id, self.step
            )));
        }
        self.step = next;
        self.last_error = None;
        self.updated_at = now;
        Ok(())
    }

    /// Note a failure without changing step.
    pub fn note_failure(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.last_error = Some(message.into());
        self.updated_at = now;
    }

    /// Whether the sequence is still running.
    pub const fn is_in_flight(&self) -> bool {
        !self.step.is_terminal()
    }

    /// Whether the record may be dropped from the journal at `now`.
    ///
    /// Granted records and records that never reached the provider's charge
    /// expire after `ttl`. Charged, recorded and orphaned records are kept
    /// until an operator resolves them.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        let purgeable = matches!(
            self.step,
            CheckoutStep::Granted | CheckoutStep::Started | CheckoutStep::IntentCreated
        );
        purgeable && self.updated_at + ttl <= now
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::idempotency::fingerprint_json;
    use crate::test_support::fixtures::{club_id, email, fixture_now};
    use rstest::{fixture, rstest};

    #[fixture]
    fn record() -> CheckoutRecord {
        CheckoutRecord::start(
            email("ann@example.com"),
            PaymentTarget::Membership {
                club_id: club_id("c1"),
            },
            Money::from_major(50),
            fingerprint_json(&"ann/c1/5000").expect("fingerprint"),
            fixture_now(),
        )
    }

    #[rstest]
    fn steps_cannot_be_skipped(mut record: CheckoutRecord) {
        let error = record
            .advance(CheckoutStep::Charged, fixture_now())
            .expect_err("skipped intent");
        assert_eq!(error.code(), crate::domain::ErrorCode::InternalError);
        assert_eq!(record.step, CheckoutStep::Started);
    }

    #[rstest]
    fn advancing_clears_the_last_failure(mut record: CheckoutRecord) {
        record.note_failure("declined", fixture_now());
        record
            .advance(CheckoutStep::IntentCreated, fixture_now())
            .expect("advance");
        assert!(record.last_error.is_none());
    }

    #[rstest]
    #[case(CheckoutStep::Started, true)]
    #[case(CheckoutStep::IntentCreated, true)]
    #[case(CheckoutStep::Granted, true)]
    #[case(CheckoutStep::Charged, false)]
    #[case(CheckoutStep::PaymentRecorded, false)]
    #[case(CheckoutStep::Orphaned, false)]
    fn only_uncharged_or_granted_records_expire(
        mut record: CheckoutRecord,
        #[case] step: CheckoutStep,
        #[case] expires: bool,
    ) {
        record.step = step;
        let later = fixture_now() + TimeDelta::hours(73);
        assert_eq!(record.is_expired(later, TimeDelta::hours(72)), expires);
        assert!(!record.is_expired(fixture_now(), TimeDelta::hours(72)));
    }

    #[rstest]
    fn records_round_trip_through_json(record: CheckoutRecord) {
        let encoded = serde_json::to_string(&record).expect("encode");
        assert!(encoded.contains("\"idempotencyKey\""));
        let decoded: CheckoutRecord = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, record);
    }
}
