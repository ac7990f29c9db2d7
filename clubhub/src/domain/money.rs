//! Monetary amounts.
//!
//! Amounts are held in minor units (cents) so equality checks between a fee
//! and a recorded payment are exact. The backend speaks in major units with
//! up to two decimal places; conversion happens at the adapter edge.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors raised when converting a wire amount into [`Money`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoneyError {
    /// Amount was negative.
    Negative,
    /// Amount was NaN, infinite or too large to represent.
    OutOfRange,
}

impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative => write!(f, "amount must not be negative"),
            Self::OutOfRange => write!(f, "amount is out of range"),
        }
    }
}

impl std::error::Error for MoneyError {}

/// Non-negative amount in minor currency units.
///
/// # Examples
/// ```
/// use clubhub::domain::Money;
///
/// let fee = Money::from_major(50);
/// assert_eq!(fee.minor_units(), 5_000);
/// assert_eq!(fee.to_string(), "50.00");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(u64);

/// Largest major-unit value accepted from the wire.
const MAX_MAJOR: f64 = 1.0e12;

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Build from minor units.
    pub const fn from_minor(cents: u64) -> Self {
        Self(cents)
    }

    /// Build from whole major units.
    pub const fn from_major(units: u64) -> Self {
        Self(units.saturating_mul(100))
    }

    /// Convert a backend decimal amount, rounding to the nearest cent.
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "the backend encodes money as JSON numbers; range is checked first"
    )]
    pub fn try_from_major_f64(amount: f64) -> Result<Self, MoneyError> {
        if !amount.is_finite() || amount > MAX_MAJOR {
            return Err(MoneyError::OutOfRange);
        }
        if amount < 0.0 {
            return Err(MoneyError::Negative);
        }
        Ok(Self((amount * 100.0).round() as u64))
    }

    /// Amount in major units for the wire.
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "the backend encodes money as JSON numbers"
    )]
    pub fn to_major_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Amount in minor units.
    pub const fn minor_units(self) -> u64 {
        self.0
    }

    /// Whether the amount is zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Add two amounts, saturating at the maximum.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Money {
    #[expect(
        clippy::integer_division,
        clippy::integer_division_remainder_used,
        reason = "splitting cents into whole and fractional parts"
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}
