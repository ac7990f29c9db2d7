//! Environment-driven configuration for the checkout journal.

use chrono::TimeDelta;

/// Environment variable holding the retention period in hours.
pub const CHECKOUT_TTL_HOURS_ENV: &str = "CHECKOUT_TTL_HOURS";

/// Environment lookups, injectable so tests never touch the process
/// environment.
pub trait CheckoutEnv {
    /// Fetch a string value by name.
    fn string(&self, name: &str) -> Option<String>;
}

/// Environment access backed by the real process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCheckoutEnv;

impl CheckoutEnv for DefaultCheckoutEnv {
    fn string(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Retention settings for checkout records.
///
/// # Example
///
/// ```
/// # use clubhub::domain::checkout::CheckoutConfig;
/// let config = CheckoutConfig::default();
/// assert_eq!(config.ttl().num_hours(), 72);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutConfig {
    ttl_hours: u32,
}

impl CheckoutConfig {
    const DEFAULT_TTL_HOURS: u32 = 72;
    const MIN_TTL_HOURS: u32 = 1;
    const MAX_TTL_HOURS: u32 = 24 * 365;

    /// Load from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_with(&DefaultCheckoutEnv)
    }

    /// Load from a custom environment. Unparseable values fall back to the
    /// default; parsed values are clamped to one hour through one year.
    pub fn from_env_with(env: &impl CheckoutEnv) -> Self {
        let hours = env
            .string(CHECKOUT_TTL_HOURS_ENV)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(Self::DEFAULT_TTL_HOURS)
            .clamp(Self::MIN_TTL_HOURS, Self::MAX_TTL_HOURS);
        Self { ttl_hours: hours }
    }

    /// Explicit retention in hours, clamped like the environment value.
    pub fn with_ttl_hours(hours: u32) -> Self {
        Self {
            ttl_hours: hours.clamp(Self::MIN_TTL_HOURS, Self::MAX_TTL_HOURS),
        }
    }

    /// How long finished or abandoned records are kept.
    pub fn ttl(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.ttl_hours))
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            ttl_hours: Self::DEFAULT_TTL_HOURS,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::collections::HashMap;

    use super::*;
    use rstest::rstest;

    struct MapEnv(HashMap<&'static str, &'static str>);

    impl CheckoutEnv for MapEnv {
        fn string(&self, name: &str) -> Option<String> {
            self.0.get(name).map(|value| (*value).to_owned())
        }
    }

    #[rstest]
    #[case(None, 72)]
    #[case(Some("24"), 24)]
    #[case(Some(" 12 "), 12)]
    #[case(Some("0"), 1)]
    #[case(Some("999999"), 8_760)]
    #[case(Some("soon"), 72)]
    fn ttl_is_read_and_clamped(#[case] raw: Option<&'static str>, #[case] hours: i64) {
        let env = MapEnv(raw.map(|v| (CHECKOUT_TTL_HOURS_ENV, v)).into_iter().collect());
        assert_eq!(CheckoutConfig::from_env_with(&env).ttl().num_hours(), hours);
    }
}
