//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! Adapters translate between domain types and wire or storage formats and
//! contain no business rules:
//!
//! - **rest**: reqwest-backed client for the ClubHub backend API
//! - **payment**: reqwest-backed payment provider (intent creation and
//!   charge confirmation)
//! - **journal**: checkout journals on disk and in memory
//! - **cache**: in-memory query cache with generation-based invalidation
//! - **memory**: in-memory backend for tests and offline runs

pub mod cache;
pub mod journal;
pub mod memory;
pub mod payment;
pub mod rest;
