//! The payment sequence for paid memberships and event seats.
//!
//! Every external side effect is preceded by a journal write, and every
//! provider call and the ledger write carry the record's idempotency key.
//! A retry or a resume therefore never charges or records twice, and a
//! grant is only attempted once the payment is on the ledger.

use std::sync::Arc;

use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use super::{CheckoutConfig, CheckoutId, CheckoutRecord, CheckoutStep};
use crate::domain::authorization::{Capability, require};
use crate::domain::event_service::{duplicate_registration, ensure_capacity, ensure_not_registered};
use crate::domain::idempotency::fingerprint_json;
use crate::domain::membership_service::duplicate_membership;
use crate::domain::port_errors::{
    map_backend, map_backend_error, map_journal_error, map_provider_error,
};
use crate::domain::ports::{
    BillingDetails, ChargeStatus, CheckoutBackend, CheckoutJournal, ClientSecret,
    PaymentInstrument, PaymentProvider,
};
use crate::domain::query::{QueryClient, QueryScope};
use crate::domain::{
    CARD_PAYMENT_METHOD, ClubId, Email, Error, ErrorCode, EventId, EventRegistration, Membership,
    Money, NewMembership, NewPayment, NewRegistration, Payment, PaymentTarget, Principal, TraceId,
};

/// What the user is paying for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Purchase {
    /// Membership of a paid club.
    Membership(ClubId),
    /// A seat at a paid event.
    Event(EventId),
}

/// Handed back by [`CheckoutSequencer::begin_checkout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutTicket {
    /// Identifier to complete the checkout with.
    pub checkout_id: CheckoutId,
    /// Secret for collecting the card; absent once the charge went through.
    pub client_secret: Option<ClientSecret>,
    /// Price of the purchase.
    pub amount: Money,
    /// Step the checkout is at.
    pub step: CheckoutStep,
}

impl CheckoutTicket {
    /// Whether the user still has to enter card details.
    pub fn needs_instrument(&self) -> bool {
        self.step == CheckoutStep::IntentCreated
    }
}

/// What a completed checkout granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// A membership bought at a paid club.
    Membership(Membership),
    /// A seat bought at a paid event.
    Registration(EventRegistration),
}

impl Grant {
    fn id(&self) -> String {
        match self {
            Self::Membership(membership) => membership.id.to_string(),
            Self::Registration(registration) => registration.id.to_string(),
        }
    }
}

/// Result of a completed checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReceipt {
    /// Checkout that finished.
    pub checkout_id: CheckoutId,
    /// Ledger entry for the charge.
    pub payment: Payment,
    /// What the payment bought.
    pub grant: Grant,
}

/// Runs the payment sequence.
pub struct CheckoutSequencer<B, P, J: ?Sized> {
    backend: Arc<B>,
    provider: Arc<P>,
    journal: Arc<J>,
    queries: QueryClient,
    clock: Arc<dyn Clock>,
    config: CheckoutConfig,
}

impl<B, P, J: ?Sized> CheckoutSequencer<B, P, J> {
    /// Create a sequencer.
    pub fn new(
        backend: Arc<B>,
        provider: Arc<P>,
        journal: Arc<J>,
        queries: QueryClient,
        clock: Arc<dyn Clock>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            backend,
            provider,
            journal,
            queries,
            clock,
            config,
        }
    }
}

const fn capability_for(purchase: &Purchase) -> Capability {
    match purchase {
        Purchase::Membership(_) => Capability::JoinClub,
        Purchase::Event(_) => Capability::RegisterForEvent,
    }
}

/// The member capability a journalled target was bought under.
const fn capability_for_target(target: &PaymentTarget) -> Capability {
    match target {
        PaymentTarget::Membership { .. } => Capability::JoinClub,
        PaymentTarget::Event { .. } => Capability::RegisterForEvent,
    }
}

fn is_grant_refusal(code: ErrorCode) -> bool {
    matches!(
        code,
        ErrorCode::DuplicateMembership
            | ErrorCode::DuplicateRegistration
            | ErrorCode::CapacityExceeded
    )
}

impl<B, P, J> CheckoutSequencer<B, P, J>
where
    B: CheckoutBackend,
    P: PaymentProvider,
    J: CheckoutJournal + ?Sized,
{
    async fn save(&self, record: &CheckoutRecord) -> Result<(), Error> {
        self.journal.save(record).await.map_err(map_journal_error)
    }

    async fn load(&self, id: &CheckoutId) -> Result<CheckoutRecord, Error> {
        self.journal
            .load(id)
            .await
            .map_err(map_journal_error)?
            .ok_or_else(|| Error::not_found(format!("checkout {id} not found")))
    }

    async fn advance(&self, record: &mut CheckoutRecord, next: CheckoutStep) -> Result<(), Error> {
        record.advance(next, self.clock.utc())?;
        self.save(record).await
    }

    /// Record `failure` on the record without moving it and hand the error
    /// back.
    async fn fail(&self, record: &mut CheckoutRecord, failure: Error) -> Error {
        record.note_failure(failure.message(), self.clock.utc());
        if let Err(journal_err) = self.save(record).await {
            warn!(checkout_id = %record.id, error = %journal_err, "could not note checkout failure");
        }
        failure
    }

    async fn ensure_not_member(&self, user: &Email, club_id: &ClubId) -> Result<(), Error> {
        let held = self
            .backend
            .memberships_for_user(user)
            .await
            .map_err(map_backend)?;
        if held
            .iter()
            .any(|membership| &membership.club_id == club_id && membership.status.is_live())
        {
            return Err(duplicate_membership(String::new()));
        }
        Ok(())
    }

    /// Check that `purchase` can be bought by `user` and price it.
    async fn quote(
        &self,
        user: &Email,
        purchase: &Purchase,
    ) -> Result<(PaymentTarget, Money), Error> {
        match purchase {
            Purchase::Membership(club_id) => {
                let club = self
                    .backend
                    .find_club(club_id)
                    .await
                    .map_err(map_backend)?
                    .ok_or_else(|| Error::not_found(format!("club {club_id} not found")))?;
                if !club.is_approved() {
                    return Err(Error::invalid_transition(format!(
                        "club {club_id} is not open for members"
                    )));
                }
                if !club.requires_payment() {
                    return Err(Error::invalid_request(format!(
                        "club {club_id} is free; join it directly"
                    )));
                }
                self.ensure_not_member(user, club_id).await?;
                Ok((
                    PaymentTarget::Membership {
                        club_id: club.id,
                    },
                    club.membership_fee,
                ))
            }
            Purchase::Event(event_id) => {
                let event = self
                    .backend
                    .find_event(event_id)
                    .await
                    .map_err(map_backend)?
                    .ok_or_else(|| Error::not_found(format!("event {event_id} not found")))?;
                if !event.is_approved() {
                    return Err(Error::invalid_transition(format!(
                        "event {event_id} is not open for registration"
                    )));
                }
                if !event.requires_payment() {
                    return Err(Error::invalid_request(format!(
                        "event {event_id} is free; register directly"
                    )));
                }
                let seats = self
                    .backend
                    .registrations_for_event(event_id)
                    .await
                    .map_err(map_backend)?;
                ensure_not_registered(user, &seats)?;
                ensure_capacity(&event, &seats)?;
                Ok((
                    PaymentTarget::Event {
                        event_id: event.id,
                        club_id: event.club_id,
                    },
                    event.event_fee,
                ))
            }
        }
    }

    fn ticket(record: &CheckoutRecord) -> CheckoutTicket {
        CheckoutTicket {
            checkout_id: record.id,
            client_secret: record
                .intent
                .as_ref()
                .filter(|_| record.step == CheckoutStep::IntentCreated)
                .map(|intent| intent.client_secret.clone()),
            amount: record.amount,
            step: record.step,
        }
    }

    async fn request_intent(&self, record: &mut CheckoutRecord) -> Result<(), Error> {
        let intent = match self
            .provider
            .create_intent(record.amount, &record.idempotency_key)
            .await
        {
            Ok(intent) => intent,
            Err(err) => return Err(self.fail(record, map_provider_error(err)).await),
        };
        record.intent = Some(intent);
        self.advance(record, CheckoutStep::IntentCreated).await
    }

    /// Validate a purchase and obtain a payment intent for it.
    ///
    /// Asking again for the same purchase while a checkout is in flight
    /// returns that checkout instead of starting another, so the same intent
    /// and idempotency key are reused.
    pub async fn begin_checkout(
        &self,
        principal: &Principal,
        purchase: &Purchase,
    ) -> Result<CheckoutTicket, Error> {
        let user = require(principal, capability_for(purchase))?;
        TraceId::traced(async {
            let (target, amount) = self.quote(&user.email, purchase).await?;
            let fingerprint = fingerprint_json(&json!({
                "user": user.email,
                "target": target,
                "amount": amount.minor_units(),
            }))
            .map_err(|err| Error::internal(err.to_string()))?;

            if let Some(mut existing) = self
                .journal
                .find_in_flight(&fingerprint)
                .await
                .map_err(map_journal_error)?
            {
                info!(checkout_id = %existing.id, step = %existing.step, "reusing in-flight checkout");
                if existing.step == CheckoutStep::Started {
                    self.request_intent(&mut existing).await?;
                }
                return Ok(Self::ticket(&existing));
            }

            let mut record = CheckoutRecord::start(
                user.email.clone(),
                target,
                amount,
                fingerprint,
                self.clock.utc(),
            );
            self.save(&record).await?;
            self.request_intent(&mut record).await?;
            info!(
                checkout_id = %record.id,
                kind = record.target.kind(),
                amount = %record.amount,
                "checkout started"
            );
            Ok(Self::ticket(&record))
        })
        .await
    }

    /// Confirm the charge and finish the sequence.
    ///
    /// A decline leaves the checkout ready for another attempt. Once the
    /// charge succeeded the payment is recorded and the grant created; a
    /// grant refused because the user already holds it, or because the event
    /// filled up, leaves the checkout orphaned with the payment on the
    /// ledger.
    pub async fn complete_checkout(
        &self,
        principal: &Principal,
        checkout_id: &CheckoutId,
        instrument: &PaymentInstrument,
        billing: &BillingDetails,
    ) -> Result<CheckoutReceipt, Error> {
        TraceId::traced(async {
            if principal.user().is_none() {
                return Err(Error::unauthorized("sign in required"));
            }
            let mut record = self.load(checkout_id).await?;
            // A ban placed after begin still blocks the charge.
            let user = require(principal, capability_for_target(&record.target))?;
            if record.user_email != user.email {
                return Err(Error::forbidden(format!(
                    "checkout {checkout_id} belongs to someone else"
                )));
            }
            match record.step {
                CheckoutStep::Started => Err(Error::invalid_transition(format!(
                    "checkout {checkout_id} has no payment intent yet"
                ))),
                CheckoutStep::IntentCreated => {
                    self.charge(&mut record, instrument, billing).await?;
                    self.settle(record).await
                }
                CheckoutStep::Charged | CheckoutStep::PaymentRecorded => self.settle(record).await,
                CheckoutStep::Granted | CheckoutStep::Orphaned => Err(Error::invalid_transition(
                    format!("checkout {checkout_id} already finished as {}", record.step),
                )),
            }
        })
        .await
    }

    async fn charge(
        &self,
        record: &mut CheckoutRecord,
        instrument: &PaymentInstrument,
        billing: &BillingDetails,
    ) -> Result<(), Error> {
        let Some(intent) = record.intent.clone() else {
            return Err(Error::internal(format!(
                "checkout {} lost its payment intent",
                record.id
            )));
        };
        let confirmation = match self
            .provider
            .confirm_charge(&intent, instrument, billing, &record.idempotency_key)
            .await
        {
            Ok(confirmation) => confirmation,
            Err(err) => {
                let failure = map_provider_error(err);
                warn!(checkout_id = %record.id, code = %failure.code(), "charge failed");
                return Err(self.fail(record, failure).await);
            }
        };
        if confirmation.status != ChargeStatus::Succeeded {
            let failure = Error::payment_declined(match confirmation.status {
                ChargeStatus::RequiresAction => "the card requires additional authentication",
                ChargeStatus::Processing => "the payment is still processing",
                ChargeStatus::Failed | ChargeStatus::Succeeded => "the card was not charged",
            });
            warn!(checkout_id = %record.id, status = ?confirmation.status, "charge not completed");
            return Err(self.fail(record, failure).await);
        }
        record.transaction_id = Some(confirmation.transaction_id);
        self.advance(record, CheckoutStep::Charged).await?;
        info!(checkout_id = %record.id, "charge succeeded");
        Ok(())
    }

    /// Record the payment (idempotent on the key) and create the grant.
    async fn settle(&self, mut record: CheckoutRecord) -> Result<CheckoutReceipt, Error> {
        let Some(transaction_id) = record.transaction_id.clone() else {
            return Err(Error::internal(format!(
                "checkout {} was charged without a transaction id",
                record.id
            )));
        };
        let request = NewPayment {
            user_email: record.user_email.clone(),
            amount: record.amount,
            target: record.target.clone(),
            payment_method: CARD_PAYMENT_METHOD.to_owned(),
            transaction_id,
            idempotency_key: record.idempotency_key.clone(),
        };
        let payment = match self.backend.record_payment(&request).await {
            Ok(payment) => payment,
            Err(err) => return Err(self.fail(&mut record, map_backend(err)).await),
        };
        if record.step == CheckoutStep::Charged {
            record.payment_id = Some(payment.id.clone());
            self.advance(&mut record, CheckoutStep::PaymentRecorded).await?;
            self.queries.invalidate(QueryScope::PAYMENT_RECORDED);
            info!(checkout_id = %record.id, payment_id = %payment.id, "payment recorded");
        }

        match self.grant(&record, &payment).await {
            Ok(grant) => {
                record.grant_id = Some(grant.id());
                self.advance(&mut record, CheckoutStep::Granted).await?;
                self.queries.invalidate(match &grant {
                    Grant::Membership(_) => QueryScope::MEMBERSHIP_CHANGED,
                    Grant::Registration(_) => QueryScope::REGISTRATION_CHANGED,
                });
                info!(checkout_id = %record.id, grant_id = %grant.id(), "checkout granted");
                Ok(CheckoutReceipt {
                    checkout_id: record.id,
                    payment,
                    grant,
                })
            }
            Err(refusal) if is_grant_refusal(refusal.code()) => {
                record.advance(CheckoutStep::Orphaned, self.clock.utc())?;
                record.note_failure(refusal.message(), self.clock.utc());
                self.save(&record).await?;
                warn!(
                    checkout_id = %record.id,
                    payment_id = %payment.id,
                    code = %refusal.code(),
                    "grant refused after payment; checkout orphaned"
                );
                Err(refusal.with_details(json!({
                    "paymentId": payment.id,
                    "checkoutId": record.id,
                })))
            }
            Err(err) => Err(self.fail(&mut record, err).await),
        }
    }

    async fn grant(&self, record: &CheckoutRecord, payment: &Payment) -> Result<Grant, Error> {
        let now = self.clock.utc();
        match &record.target {
            PaymentTarget::Membership { club_id } => {
                let club = self
                    .backend
                    .find_club(club_id)
                    .await
                    .map_err(map_backend)?
                    .ok_or_else(|| Error::not_found(format!("club {club_id} not found")))?;
                self.ensure_not_member(&record.user_email, club_id).await?;
                let membership = self
                    .backend
                    .create_membership(&NewMembership {
                        user_email: record.user_email.clone(),
                        club_id: club_id.clone(),
                        status: club.join_policy.initial_status(),
                        payment_id: Some(payment.id.clone()),
                        joined_at: now,
                    })
                    .await
                    .map_err(|err| map_backend_error(err, duplicate_membership))?;
                Ok(Grant::Membership(membership))
            }
            PaymentTarget::Event { event_id, club_id } => {
                let event = self
                    .backend
                    .find_event(event_id)
                    .await
                    .map_err(map_backend)?
                    .ok_or_else(|| Error::not_found(format!("event {event_id} not found")))?;
                let seats = self
                    .backend
                    .registrations_for_event(event_id)
                    .await
                    .map_err(map_backend)?;
                ensure_not_registered(&record.user_email, &seats)?;
                ensure_capacity(&event, &seats)?;
                let registration = self
                    .backend
                    .create_registration(&NewRegistration {
                        user_email: record.user_email.clone(),
                        event_id: event_id.clone(),
                        club_id: club_id.clone(),
                        payment_id: Some(payment.id.clone()),
                        registered_at: now,
                    })
                    .await
                    .map_err(|err| map_backend_error(err, duplicate_registration))?;
                Ok(Grant::Registration(registration))
            }
        }
    }

    /// Continue a checkout interrupted after the charge succeeded.
    pub async fn resume_checkout(&self, checkout_id: &CheckoutId) -> Result<CheckoutReceipt, Error> {
        TraceId::traced(async {
            let record = self.load(checkout_id).await?;
            if !matches!(
                record.step,
                CheckoutStep::Charged | CheckoutStep::PaymentRecorded
            ) {
                return Err(Error::invalid_transition(format!(
                    "checkout {checkout_id} is {} and cannot be resumed",
                    record.step
                )));
            }
            info!(checkout_id = %checkout_id, step = %record.step, "resuming checkout");
            self.settle(record).await
        })
        .await
    }

    /// In-flight checkouts of the signed-in user, oldest first.
    pub async fn pending_checkouts(
        &self,
        principal: &Principal,
    ) -> Result<Vec<CheckoutRecord>, Error> {
        let user = require(principal, Capability::ViewPaymentHistory)?;
        let records = self.journal.list().await.map_err(map_journal_error)?;
        Ok(records
            .into_iter()
            .filter(|record| record.user_email == user.email && record.is_in_flight())
            .collect())
    }

    /// Every journalled checkout, oldest first.
    pub async fn all_checkouts(&self) -> Result<Vec<CheckoutRecord>, Error> {
        self.journal.list().await.map_err(map_journal_error)
    }

    /// Drop records past their retention, returning how many went.
    pub async fn purge_expired(&self) -> Result<usize, Error> {
        let now = self.clock.utc();
        let ttl = self.config.ttl();
        let mut purged = 0_usize;
        for record in self.journal.list().await.map_err(map_journal_error)? {
            if record.is_expired(now, ttl) {
                self.journal
                    .remove(&record.id)
                    .await
                    .map_err(map_journal_error)?;
                purged += 1;
            }
        }
        info!(purged, "purged expired checkouts");
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    //! Step bookkeeping; end-to-end runs live in `tests/checkout_sequencer.rs`.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorCode::DuplicateMembership, true)]
    #[case(ErrorCode::DuplicateRegistration, true)]
    #[case(ErrorCode::CapacityExceeded, true)]
    #[case(ErrorCode::ServiceUnavailable, false)]
    #[case(ErrorCode::InternalError, false)]
    fn only_refusals_orphan_a_checkout(#[case] code: ErrorCode, #[case] orphans: bool) {
        assert_eq!(is_grant_refusal(code), orphans);
    }

    #[rstest]
    #[case(CheckoutStep::IntentCreated, true)]
    #[case(CheckoutStep::Charged, false)]
    #[case(CheckoutStep::PaymentRecorded, false)]
    fn tickets_ask_for_a_card_only_before_the_charge(
        #[case] step: CheckoutStep,
        #[case] needs_instrument: bool,
    ) {
        let ticket = CheckoutTicket {
            checkout_id: CheckoutId::generate(),
            client_secret: None,
            amount: Money::from_major(50),
            step,
        };
        assert_eq!(ticket.needs_instrument(), needs_instrument);
    }

    #[rstest]
    fn purchases_map_to_member_capabilities() {
        let club = Purchase::Membership(ClubId::new("c1").expect("id"));
        let event = Purchase::Event(EventId::new("e1").expect("id"));
        assert_eq!(capability_for(&club), Capability::JoinClub);
        assert_eq!(capability_for(&event), Capability::RegisterForEvent);
    }
}
