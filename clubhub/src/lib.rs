//! ClubHub workflow engine.
//!
//! Club, membership, event and payment lifecycles over a REST backend,
//! an identity provider and a payment-capture provider.

pub mod app;
pub mod domain;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use domain::TraceId;
