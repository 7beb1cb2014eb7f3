//! Bounded in-memory caches with time-to-live expiry.
//!
//! Two flavours are provided:
//! - [`TtlCache`]: every entry shares the TTL chosen when the cache is built
//! - [`VariableTtlCache`]: each insert carries its own TTL
//!
//! Both wrap `moka::future::Cache`. Capacity pressure is handled by moka's
//! eviction policy and is never surfaced as an error, so an entry may disappear
//! before its TTL runs out. A `None` from `get` looks the same whether the key
//! was never inserted, expired, or was evicted.
//!
//! Caches are cheap handles over shared state: cloning one gives another view
//! of the same entries. This is how the [`CacheRegistry`](super::CacheRegistry)
//! keeps hold of every cache it creates so it can close them at shutdown.

use moka::future::Cache;
use moka::Expiry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Something the registry can close at shutdown.
pub(crate) trait Closeable: Send + Sync {
    fn close(&self);
}

/// Cache where every entry expires after the same, cache-wide duration.
#[derive(Clone)]
pub struct TtlCache<V> {
    inner: Cache<String, V>,
    ttl: Duration,
    closed: Arc<AtomicBool>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(capacity: u64, ttl: Duration) -> Self {
        let inner = Cache::builder().max_capacity(capacity).time_to_live(ttl).build();
        Self { inner, ttl, closed: Arc::new(AtomicBool::new(false)) }
    }

    /// Get a live entry.
    pub async fn get(&self, key: &str) -> Option<V> {
        if self.is_closed() {
            return None;
        }
        self.inner.get(key).await
    }

    /// Insert or overwrite an entry. The cache-wide TTL starts now.
    pub async fn insert(&self, key: impl Into<String>, value: V) {
        if self.is_closed() {
            debug!("Ignoring insert into closed cache");
            return;
        }
        self.inner.insert(key.into(), value).await;
    }

    /// Remove an entry if present.
    pub async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    /// Drop every entry. Reads issued after this call never see the old entries.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }

    /// Approximate number of resident entries.
    ///
    /// Expired and evicted entries are only reclaimed by moka's maintenance
    /// work; call [`run_pending_tasks`](Self::run_pending_tasks) first for an
    /// exact figure.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Run moka's pending eviction and expiration work now.
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl<V> Closeable for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.inner.invalidate_all();
    }
}

impl<V> std::fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.inner.entry_count())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

/// Entry stored in a [`VariableTtlCache`] together with its own lifetime.
#[derive(Clone)]
struct Timed<V> {
    value: V,
    ttl: Duration,
}

/// Expiry policy that reads the TTL off each entry. Overwrites restart the clock.
struct PerEntryTtl;

impl<V> Expiry<String, Timed<V>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Timed<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Timed<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Cache where each entry's expiry is supplied at insertion time.
#[derive(Clone)]
pub struct VariableTtlCache<V> {
    inner: Cache<String, Timed<V>>,
    closed: Arc<AtomicBool>,
}

impl<V> VariableTtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(capacity: u64) -> Self {
        let inner = Cache::builder().max_capacity(capacity).expire_after(PerEntryTtl).build();
        Self { inner, closed: Arc::new(AtomicBool::new(false)) }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        if self.is_closed() {
            return None;
        }
        self.inner.get(key).await.map(|timed| timed.value)
    }

    /// Insert or overwrite an entry that expires `ttl` from now.
    pub async fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        if self.is_closed() {
            debug!("Ignoring insert into closed cache");
            return;
        }
        self.inner.insert(key.into(), Timed { value, ttl }).await;
    }

    pub async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl<V> Closeable for VariableTtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.inner.invalidate_all();
    }
}

impl<V> std::fmt::Debug for VariableTtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariableTtlCache")
            .field("entries", &self.inner.entry_count())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}
