//! Idempotency primitives for the payment sequence.
//!
//! An [`IdempotencyKey`] is minted once per checkout and sent with every
//! provider call and the ledger write, so replays never charge or record twice.
//! A [`PurchaseFingerprint`] identifies "the same purchase by the same user" so
//! re-initiating a checkout picks up the in-flight record instead of starting
//! a second one.

mod fingerprint;
mod key;

pub use fingerprint::{PurchaseFingerprint, PurchaseFingerprintError, fingerprint_json};
pub use key::{IdempotencyKey, IdempotencyKeyError};

#[cfg(test)]
mod tests;
