//! # TTL Cache
//!
//! In-memory key/value store with per-entry expiry and hit/miss counters.
//!
//! ## Lifecycle of an Entry
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  insert(key, v)  ──►  [ fresh ]  ── get ──►  Some(v), hits += 1         │
//! │                          │                                              │
//! │                          │ ttl elapses                                  │
//! │                          ▼                                              │
//! │                      [ expired ] ── get ──►  None, misses += 1, evicted │
//! │                          │                                              │
//! │                          │ sweeper tick                                 │
//! │                          ▼                                              │
//! │                      purge_expired() removes it without a read          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Time comes from `tokio::time::Instant`, so tests drive expiry with
//! `tokio::time::pause` and `advance`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::key::{DefaultKeyStrategy, KeyStrategy, RequestKey};

/// Default time-to-live for cached responses.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default interval between sweeps of expired entries.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Upper bound on the sweep period.
pub const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 3600);

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if at < now)
    }
}

struct Store<V> {
    entries: HashMap<String, Entry<V>>,
    hits: u64,
    misses: u64,
}

// =============================================================================
// TtlCache
// =============================================================================

/// Shared TTL cache. Cloning is cheap and every clone sees the same entries.
pub struct TtlCache<V> {
    store: Arc<RwLock<Store<V>>>,
    default_ttl: Option<Duration>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        TtlCache {
            store: Arc::clone(&self.store),
            default_ttl: self.default_ttl,
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<V: Clone> TtlCache<V> {
    /// Creates a cache whose plain `insert` expires after `default_ttl`.
    pub fn new(default_ttl: Duration) -> Self {
        Self::build(Some(default_ttl))
    }

    /// Creates a cache whose plain `insert` never expires.
    pub fn without_expiry() -> Self {
        Self::build(None)
    }

    fn build(default_ttl: Option<Duration>) -> Self {
        TtlCache {
            store: Arc::new(RwLock::new(Store {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
            })),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Returns a clone of the value if present and fresh.
    ///
    /// An expired entry is evicted and counted as a miss.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut store = self.store.write().await;

        match store.entries.get(key).map(|entry| entry.is_expired(now)) {
            None => {
                store.misses += 1;
                debug!(key, "Cache miss");
                None
            }
            Some(true) => {
                store.entries.remove(key);
                store.misses += 1;
                debug!(key, "Cache entry expired");
                None
            }
            Some(false) => {
                store.hits += 1;
                store.entries.get(key).map(|entry| entry.value.clone())
            }
        }
    }

    /// True if the key holds a fresh entry. Does not touch the counters.
    pub async fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        let store = self.store.read().await;
        store
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Stores a value with the cache's default TTL.
    pub async fn insert(&self, key: impl Into<String>, value: V) {
        self.put(key.into(), value, self.default_ttl).await;
    }

    /// Stores a value with an explicit TTL.
    pub async fn insert_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.put(key.into(), value, Some(ttl)).await;
    }

    async fn put(&self, key: String, value: V, ttl: Option<Duration>) {
        // A deadline past the end of the clock never arrives.
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        let mut store = self.store.write().await;
        store.entries.insert(key.clone(), Entry { value, expires_at });
        debug!(key = %key, ?ttl, size = store.entries.len(), "Cache set");
    }

    /// Removes one key. Returns whether it was present.
    pub async fn invalidate(&self, key: &str) -> bool {
        let removed = self.store.write().await.entries.remove(key).is_some();
        if removed {
            debug!(key, "Cache entry invalidated");
        }
        removed
    }

    /// Removes every key starting with `prefix`. Returns how many were removed.
    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut store = self.store.write().await;
        let before = store.entries.len();
        store.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - store.entries.len();
        debug!(prefix, removed, "Cache prefix invalidated");
        removed
    }

    pub async fn clear(&self) {
        self.store.write().await.entries.clear();
        debug!("Cache cleared");
    }

    /// Drops every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut store = self.store.write().await;
        let before = store.entries.len();
        store.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - store.entries.len();
        if removed > 0 {
            debug!(removed, size = store.entries.len(), "Expired cache entries removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        CacheStats {
            hits: store.hits,
            misses: store.misses,
            size: store.entries.len(),
        }
    }
}

// =============================================================================
// Sweeper
// =============================================================================

/// Spawns a task that purges expired entries every `interval`.
///
/// The first sweep happens one full interval after the call. Intervals
/// longer than [`MAX_SWEEP_INTERVAL`] are shortened to it. Abort the
/// returned handle to stop it.
pub fn spawn_sweeper<V>(cache: TtlCache<V>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    let interval = interval.min(MAX_SWEEP_INTERVAL);
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::spawn(async move {
        loop {
            ticker.tick().await;
            cache.purge_expired().await;
        }
    })
}

// =============================================================================
// ReadCache
// =============================================================================

/// Where a `ReadCache::fetch` result came from. Maps onto an `X-Cache` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    /// Not cacheable (non-GET); the loader ran and nothing was stored.
    Bypass,
}

impl CacheStatus {
    pub const fn as_header(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }
}

/// Read-through façade: key strategy plus TTL cache.
///
/// ## Example
/// ```rust,ignore
/// let reads = ReadCache::new(TtlCache::default(), DefaultKeyStrategy);
///
/// let req = RequestKey::get(format!("/api/locations/{}/inventory", id));
/// let (items, status) = reads
///     .fetch(&req, || reports.current_inventory(id))
///     .await?;
/// response.header("X-Cache", status.as_header());
/// ```
pub struct ReadCache<V, S = DefaultKeyStrategy> {
    cache: TtlCache<V>,
    strategy: S,
}

impl<V: Clone> ReadCache<V, DefaultKeyStrategy> {
    pub fn with_default_keys(cache: TtlCache<V>) -> Self {
        ReadCache::new(cache, DefaultKeyStrategy)
    }
}

impl<V: Clone, S: KeyStrategy> ReadCache<V, S> {
    pub fn new(cache: TtlCache<V>, strategy: S) -> Self {
        ReadCache { cache, strategy }
    }

    pub fn cache(&self) -> &TtlCache<V> {
        &self.cache
    }

    pub fn key_for(&self, req: &RequestKey) -> String {
        self.strategy.key(req)
    }

    /// Returns the cached value for `req`, or runs `loader` and caches an
    /// `Ok` result. Errors are passed through and never cached.
    pub async fn fetch<F, Fut, E>(&self, req: &RequestKey, loader: F) -> Result<(V, CacheStatus), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if !req.is_cacheable() {
            let value = loader().await?;
            return Ok((value, CacheStatus::Bypass));
        }

        let key = self.strategy.key(req);
        if let Some(value) = self.cache.get(&key).await {
            return Ok((value, CacheStatus::Hit));
        }

        let value = loader().await?;
        self.cache.insert(key, value.clone()).await;
        Ok((value, CacheStatus::Miss))
    }

    /// Drops the cached response for one request.
    pub async fn invalidate(&self, req: &RequestKey) -> bool {
        self.cache.invalidate(&self.strategy.key(req)).await
    }
}
