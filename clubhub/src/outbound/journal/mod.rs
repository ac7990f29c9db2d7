//! Checkout journal outbound adapters.
//!
//! - **file**: one JSON document per checkout under a directory, written
//!   atomically so a crash never leaves a half-written record.
//! - **memory**: process-local journal for tests and single-session use.

mod file;
mod memory;

pub use file::FileCheckoutJournal;
pub use memory::InMemoryCheckoutJournal;
