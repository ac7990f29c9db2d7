//! Payment sequence for paid memberships and event seats.
//!
//! [`CheckoutSequencer`] drives each purchase through named steps persisted
//! as [`CheckoutRecord`]s in a [`crate::domain::ports::CheckoutJournal`].

mod config;
mod record;
mod sequencer;

pub use config::{CHECKOUT_TTL_HOURS_ENV, CheckoutConfig, CheckoutEnv, DefaultCheckoutEnv};
pub use record::{CheckoutId, CheckoutRecord, CheckoutStep};
pub use sequencer::{CheckoutReceipt, CheckoutSequencer, CheckoutTicket, Grant, Purchase};
