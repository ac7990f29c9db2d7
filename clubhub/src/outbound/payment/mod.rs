//! Payment provider outbound adapters.
//!
//! This module provides a thin HTTP implementation of the `PaymentProvider`
//! port.

mod dto;
mod http_provider;

pub use http_provider::{HttpPaymentEndpoints, HttpPaymentProvider};
