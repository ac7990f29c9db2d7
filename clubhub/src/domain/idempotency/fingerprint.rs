//! Purchase fingerprints.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Errors raised while fingerprinting a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseFingerprintError {
    /// The purchase could not be serialised to JSON.
    Serialization {
        /// Serializer error text.
        message: String,
    },
    /// A stored fingerprint was not 64 lowercase hex characters.
    Malformed,
}

impl fmt::Display for PurchaseFingerprintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialization { message } => {
                write!(f, "failed to serialise purchase: {message}")
            }
            Self::Malformed => write!(f, "purchase fingerprint must be 64 hex characters"),
        }
    }
}

impl std::error::Error for PurchaseFingerprintError {}

/// SHA-256 over the canonical JSON of a purchase, hex encoded.
///
/// Two checkouts with the same fingerprint buy the same thing for the same
/// user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PurchaseFingerprint(String);

impl PurchaseFingerprint {
    /// Lowercase hex digest.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PurchaseFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<PurchaseFingerprint> for String {
    fn from(value: PurchaseFingerprint) -> Self {
        value.0
    }
}

impl TryFrom<String> for PurchaseFingerprint {
    type Error = PurchaseFingerprintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let valid = value.len() == 64
            && value
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if valid {
            Ok(Self(value))
        } else {
            Err(PurchaseFingerprintError::Malformed)
        }
    }
}

/// Canonicalise any serialisable value and hash it.
///
/// Object keys are sorted recursively, arrays keep their order, and the
/// result is hashed as compact JSON.
///
/// # Example
///
/// ```
/// # use clubhub::domain::idempotency::fingerprint_json;
/// # use serde_json::json;
/// let a = fingerprint_json(&json!({"b": 2, "a": 1})).expect("hash A");
/// let b = fingerprint_json(&json!({"a": 1, "b": 2})).expect("hash B");
/// assert_eq!(a, b);
/// ```
pub fn fingerprint_json<T: Serialize>(
    value: &T,
) -> Result<PurchaseFingerprint, PurchaseFingerprintError> {
    let as_value =
        serde_json::to_value(value).map_err(|err| PurchaseFingerprintError::Serialization {
            message: err.to_string(),
        })?;
    let bytes = serde_json::to_vec(&canonicalize(&as_value)).map_err(|err| {
        PurchaseFingerprintError::Serialization {
            message: err.to_string(),
        }
    })?;
    Ok(PurchaseFingerprint(hex::encode(Sha256::digest(&bytes))))
}

fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by_key(|(k, _)| k.as_str());
            serde_json::Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect(),
            )
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize).collect())
        }
        other => other.clone(),
    }
}
