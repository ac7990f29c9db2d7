//! Port for the client-side read cache.
//!
//! Entries are type-erased; [`crate::domain::QueryClient`] restores the
//! concrete type. Every fetch takes a [`FetchTicket`] first so a response
//! that arrives after an invalidation is discarded instead of overwriting
//! fresher state.

use std::any::Any;
use std::sync::Arc;

use crate::domain::{QueryKey, QueryScope};

/// Type-erased cached value.
pub type CachedValue = Arc<dyn Any + Send + Sync>;

/// Proof that a fetch started at a given generation of its scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    /// Read the ticket was issued for.
    pub key: QueryKey,
    /// Generation of the key's scope at issue time.
    pub generation: u64,
}

/// Read cache keyed by [`QueryKey`].
pub trait QueryCache: Send + Sync {
    /// Cached value for `key`, if fresh.
    fn get(&self, key: &QueryKey) -> Option<CachedValue>;

    /// Start a fetch for `key`.
    fn begin_fetch(&self, key: &QueryKey) -> FetchTicket;

    /// Store `value` unless the ticket's scope was invalidated meanwhile.
    /// Returns whether the value was stored.
    fn complete_fetch(&self, ticket: FetchTicket, value: CachedValue) -> bool;

    /// Discard every entry in `scopes`, returning how many were dropped.
    fn invalidate(&self, scopes: &[QueryScope]) -> usize;
}

/// Cache that stores nothing; every read goes to the loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoQueryCache;

impl QueryCache for NoQueryCache {
    fn get(&self, _key: &QueryKey) -> Option<CachedValue> {
        None
    }

    fn begin_fetch(&self, key: &QueryKey) -> FetchTicket {
        FetchTicket {
            key: key.clone(),
            generation: 0,
        }
    }

    fn complete_fetch(&self, _ticket: FetchTicket, _value: CachedValue) -> bool {
        true
    }

    fn invalidate(&self, _scopes: &[QueryScope]) -> usize {
        0
    }
}
