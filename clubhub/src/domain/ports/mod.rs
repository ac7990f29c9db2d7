//! Domain ports for the hexagonal boundary.
//!
//! Backend resource ports share [`BackendError`]; provider and
//! infrastructure ports carry their own errors. Services map every port
//! error onto [`crate::domain::Error`].

mod macros;
pub(crate) use macros::define_port_error;

mod access_token;
mod application_repository;
mod backend_error;
mod checkout_journal;
mod club_repository;
mod event_repository;
mod identity_provider;
mod membership_repository;
mod payment_ledger;
mod payment_provider;
mod query_cache;
mod registration_repository;
mod user_directory;

#[cfg(test)]
pub use access_token::MockAccessTokenSource;
pub use access_token::{AccessTokenSource, NoAccessToken, StaticAccessToken};
#[cfg(test)]
pub use application_repository::MockApplicationRepository;
pub use application_repository::ApplicationRepository;
pub use backend_error::BackendError;
#[cfg(test)]
pub use checkout_journal::MockCheckoutJournal;
pub use checkout_journal::{CheckoutJournal, CheckoutJournalError};
#[cfg(test)]
pub use club_repository::MockClubRepository;
pub use club_repository::ClubRepository;
#[cfg(test)]
pub use event_repository::MockEventRepository;
pub use event_repository::EventRepository;
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{AuthError, IdentityProvider, IdentitySession};
#[cfg(test)]
pub use membership_repository::MockMembershipRepository;
pub use membership_repository::MembershipRepository;
#[cfg(test)]
pub use payment_ledger::{MockPaymentLedger, MockStatsQuery};
pub use payment_ledger::{PaymentLedger, StatsQuery};
#[cfg(test)]
pub use payment_provider::MockPaymentProvider;
pub use payment_provider::{
    BillingDetails, ChargeConfirmation, ChargeStatus, ClientSecret, PaymentInstrument,
    PaymentIntent, PaymentProvider, PaymentProviderError,
};
pub use query_cache::{CachedValue, FetchTicket, NoQueryCache, QueryCache};
#[cfg(test)]
pub use registration_repository::MockRegistrationRepository;
pub use registration_repository::RegistrationRepository;
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::UserDirectory;

/// Every backend resource the payment sequence touches.
///
/// Blanket-implemented for any adapter implementing the individual ports.
pub trait CheckoutBackend:
    ClubRepository + EventRepository + MembershipRepository + RegistrationRepository + PaymentLedger
{
}

impl<T> CheckoutBackend for T where
    T: ClubRepository
        + EventRepository
        + MembershipRepository
        + RegistrationRepository
        + PaymentLedger
{
}
