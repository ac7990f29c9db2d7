//! Opaque identifiers assigned by the backend store.
//!
//! The backend hands out string identifiers (document ids). The client never
//! interprets them, so each newtype only guarantees the value is non-empty
//! and carries no surrounding whitespace.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors raised when parsing an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdValidationError {
    /// The identifier was empty.
    Empty {
        /// Kind of identifier.
        kind: &'static str,
    },
    /// The identifier had leading or trailing whitespace.
    SurroundingWhitespace {
        /// Kind of identifier.
        kind: &'static str,
    },
}

impl fmt::Display for IdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { kind } => write!(f, "{kind} must not be empty"),
            Self::SurroundingWhitespace { kind } => {
                write!(f, "{kind} must not contain surrounding whitespace")
            }
        }
    }
}

impl std::error::Error for IdValidationError {}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident => $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and construct the identifier.
            pub fn new(raw: impl Into<String>) -> Result<Self, IdValidationError> {
                Self::from_owned(raw.into())
            }

            /// Generate a fresh identifier, as the backend would on insert.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().simple().to_string())
            }

            fn from_owned(raw: String) -> Result<Self, IdValidationError> {
                if raw.is_empty() {
                    return Err(IdValidationError::Empty { kind: $kind });
                }
                if raw.trim() != raw {
                    return Err(IdValidationError::SurroundingWhitespace { kind: $kind });
                }
                Ok(Self(raw))
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::from_owned(value)
            }
        }
    };
}

define_id!(
    /// Identifier of a [`crate::domain::Club`].
    ClubId => "club id"
);
define_id!(
    /// Identifier of an [`crate::domain::Event`].
    EventId => "event id"
);
define_id!(
    /// Identifier of a [`crate::domain::Membership`].
    MembershipId => "membership id"
);
define_id!(
    /// Identifier of an [`crate::domain::EventRegistration`].
    RegistrationId => "registration id"
);
define_id!(
    /// Identifier of a ledger [`crate::domain::Payment`].
    PaymentId => "payment id"
);
define_id!(
    /// Identifier of a [`crate::domain::ClubManagerApplication`].
    ApplicationId => "application id"
);

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", IdValidationError::Empty { kind: "club id" })]
    #[case(" 64f0 ", IdValidationError::SurroundingWhitespace { kind: "club id" })]
    fn rejects_malformed_ids(#[case] raw: &str, #[case] expected: IdValidationError) {
        let err = ClubId::new(raw).expect_err("malformed id");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn accepts_object_id_shaped_values() {
        let id = ClubId::new("64f0c2a1e4b0a1b2c3d4e5f6").expect("valid id");
        assert_eq!(id.as_str(), "64f0c2a1e4b0a1b2c3d4e5f6");
    }

    #[rstest]
    fn deserialisation_validates() {
        let err = serde_json::from_str::<EventId>("\"\"").expect_err("empty id");
        assert!(err.to_string().contains("event id must not be empty"));
    }

    #[rstest]
    fn generated_ids_are_unique() {
        assert_ne!(PaymentId::generate(), PaymentId::generate());
    }
}
