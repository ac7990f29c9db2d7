//! Backend REST outbound adapter.
//!
//! This module provides a thin HTTP implementation of every backend
//! resource port: users, clubs, memberships, events, registrations,
//! club-manager applications, payments and admin aggregates.

mod client;
mod dto;
mod resources;

pub use client::RestBackend;
