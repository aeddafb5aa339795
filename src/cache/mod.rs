pub mod key;

use std::num::NonZeroUsize;

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use parking_lot::Mutex;

pub use key::{derive_key, CacheKeyParams};

/// Entries older than this are never served.
pub const CACHE_TTL_MS: i64 = 10 * 60 * 1000;
/// Maximum number of entries held at once.
pub const CACHE_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    payload: V,
    created_at: DateTime<Utc>,
}

/// Time-boxed, size-bounded store for assembled reports.
///
/// Eviction is FIFO by insertion: reads use `peek` and never reorder, so the
/// entry dropped at capacity is the one inserted (or re-inserted) longest ago.
/// All operations lock a single mutex, so the capacity bound holds under
/// concurrent use.
#[derive(Debug)]
pub struct BulkCache<V> {
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> Default for BulkCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> BulkCache<V> {
    pub fn new() -> Self {
        Self::with_limits(CACHE_CAPACITY, Duration::milliseconds(CACHE_TTL_MS))
    }

    pub fn with_limits(capacity: usize, ttl: Duration) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
            ttl,
        }
    }

    /// True if `key` holds an entry younger than the TTL. Removes the entry
    /// when it has expired.
    pub fn is_valid(&self, key: &str) -> bool {
        self.is_valid_at(key, Utc::now())
    }

    pub fn is_valid_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut entries = self.entries.lock();
        let fresh = match entries.peek(key) {
            Some(entry) => now - entry.created_at < self.ttl,
            None => return false,
        };
        if !fresh {
            log::debug!("Cache entry expired: {key}");
            entries.pop(key);
        }
        fresh
    }

    /// An owned copy of the stored payload, regardless of age.
    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.lock().peek(key).map(|e| e.payload.clone())
    }

    pub fn put(&self, key: impl Into<String>, payload: V) {
        self.put_at(key, payload, Utc::now());
    }

    pub fn put_at(&self, key: impl Into<String>, payload: V, now: DateTime<Utc>) {
        let key = key.into();
        let mut entries = self.entries.lock();
        let entry = CacheEntry {
            payload,
            created_at: now,
        };
        if let Some((evicted, _)) = entries.push(key.clone(), entry) {
            if evicted != key {
                log::debug!("Cache full, evicted {evicted}");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains(key)
    }
}
