//! Query-result cache
//!
//! Successful provider answers are kept in an LRU for a stale time measured
//! with the injected [`Clock`]. Entries past their stale time are treated as
//! absent and evicted on lookup.

use crate::models::Provider;
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

/// `(provider, operation, argument)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub provider: Provider,
    pub operation: &'static str,
    pub argument: String,
}

impl CacheKey {
    pub fn new(provider: Provider, operation: &'static str, argument: impl Into<String>) -> Self {
        Self {
            provider,
            operation,
            argument: argument.into(),
        }
    }
}

struct CachedEntry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

pub struct QueryCache<V> {
    entries: Mutex<LruCache<CacheKey, CachedEntry<V>>>,
    stale_after: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> QueryCache<V> {
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize, stale_after: Duration, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            stale_after,
            clock,
        }
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let fresh = match entries.get(key) {
            Some(entry) => self.is_fresh(entry.stored_at, now),
            None => return None,
        };

        if fresh {
            entries.get(key).map(|entry| entry.value.clone())
        } else {
            entries.pop(key);
            None
        }
    }

    pub fn insert(&self, key: CacheKey, value: V) {
        let stored_at = self.clock.now();
        self.entries.lock().put(key, CachedEntry { value, stored_at });
    }

    pub fn invalidate(&self, key: &CacheKey) {
        self.entries.lock().pop(key);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_fresh(&self, stored_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match (now - stored_at).to_std() {
            Ok(age) => age < self.stale_after,
            // Clock went backwards; keep the entry.
            Err(_) => true,
        }
    }
}
