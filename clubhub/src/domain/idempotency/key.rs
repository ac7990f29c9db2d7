//! Checkout idempotency keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reasons a stored or received key is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdempotencyKeyError {
    /// Nothing was supplied.
    #[error("idempotency key must not be blank")]
    Blank,
    /// The value is not a UUID.
    #[error("idempotency key `{0}` is not a UUID")]
    Malformed(String),
}

/// Key minted once per checkout.
///
/// It travels as the `Idempotency-Key` header on the intent and confirmation
/// calls and is stored on the ledger entry, so a replayed step can never
/// charge or record twice.
///
/// ```
/// # use clubhub::domain::idempotency::IdempotencyKey;
/// let key: IdempotencyKey = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
/// assert_eq!(key.to_string(), "550e8400-e29b-41d4-a716-446655440000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    /// A fresh key for a new checkout.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// The key as a UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for IdempotencyKey {
    type Err = IdempotencyKeyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.trim().is_empty() {
            return Err(IdempotencyKeyError::Blank);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| IdempotencyKeyError::Malformed(raw.to_owned()))
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl From<IdempotencyKey> for String {
    fn from(key: IdempotencyKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = IdempotencyKeyError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}
