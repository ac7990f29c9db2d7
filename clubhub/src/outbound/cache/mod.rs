//! In-process query cache.
//!
//! Implements the `QueryCache` port with a map of type-erased values and a
//! generation counter per [`QueryScope`]. Invalidating a scope drops its
//! entries and bumps its generation, so a fetch that started before the
//! invalidation cannot store its now-stale result.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::ports::{CachedValue, FetchTicket, QueryCache};
use crate::domain::{QueryKey, QueryScope};

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, CachedValue>,
    generations: HashMap<QueryScope, u64>,
}

impl CacheState {
    fn generation(&self, scope: QueryScope) -> u64 {
        self.generations.get(&scope).copied().unwrap_or_default()
    }
}

/// Query cache held in process memory.
#[derive(Default)]
pub struct InMemoryQueryCache {
    state: Mutex<CacheState>,
}

impl std::fmt::Debug for InMemoryQueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryQueryCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl InMemoryQueryCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QueryCache for InMemoryQueryCache {
    fn get(&self, key: &QueryKey) -> Option<CachedValue> {
        self.state().entries.get(key).cloned()
    }

    fn begin_fetch(&self, key: &QueryKey) -> FetchTicket {
        FetchTicket {
            key: key.clone(),
            generation: self.state().generation(key.scope()),
        }
    }

    fn complete_fetch(&self, ticket: FetchTicket, value: CachedValue) -> bool {
        let mut state = self.state();
        if state.generation(ticket.key.scope()) != ticket.generation {
            return false;
        }
        state.entries.insert(ticket.key, value);
        true
    }

    fn invalidate(&self, scopes: &[QueryScope]) -> usize {
        let mut state = self.state();
        for scope in scopes {
            let next = state.generation(*scope).wrapping_add(1);
            state.generations.insert(*scope, next);
        }
        let before = state.entries.len();
        state.entries.retain(|key, _| !scopes.contains(&key.scope()));
        before.saturating_sub(state.entries.len())
    }
}
