//! Facility that creates caches and closes them all at shutdown.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::ttl::{Closeable, TtlCache, VariableTtlCache};

/// Creates TTL caches and tracks them so they can be released together.
///
/// Build one per process during startup and hand it (or the caches it
/// creates) to whoever needs them. Creation and [`close_all`](Self::close_all)
/// may run concurrently from different tasks.
pub struct CacheRegistry {
    caches: DashMap<u64, Arc<dyn Closeable>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self { caches: DashMap::new(), next_id: AtomicU64::new(0), closed: AtomicBool::new(false) }
    }

    /// Create a cache whose entries all expire `ttl` after insertion.
    ///
    /// `capacity` bounds the number of resident entries; past it, entries may be
    /// evicted before their TTL.
    pub fn create<V>(&self, capacity: u64, ttl: Duration) -> TtlCache<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        let cache = TtlCache::new(capacity, ttl);
        self.track(Arc::new(cache.clone()));
        debug!(capacity, ttl_secs = ttl.as_secs(), "Created fixed-TTL cache");
        cache
    }

    /// Create a cache where every insert supplies its own TTL.
    pub fn create_variable<V>(&self, capacity: u64) -> VariableTtlCache<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        let cache = VariableTtlCache::new(capacity);
        self.track(Arc::new(cache.clone()));
        debug!(capacity, "Created variable-TTL cache");
        cache
    }

    fn track(&self, cache: Arc<dyn Closeable>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.caches.insert(id, Arc::clone(&cache));

        // A cache created while close_all was sweeping must not outlive it.
        if self.is_closed() {
            cache.close();
        }
    }

    /// Release every cache this registry created.
    ///
    /// Terminal: the body runs once, later calls only log. Closed caches
    /// answer every `get` with `None` and drop inserts.
    pub fn close_all(&self) {
        if self.closed.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err()
        {
            debug!("Cache registry already closed");
            return;
        }

        let mut count = 0usize;
        for entry in self.caches.iter() {
            entry.value().close();
            count += 1;
        }

        info!(count, "Closed all caches");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of caches created through this registry.
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("caches", &self.caches.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
