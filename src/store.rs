//! Bounded, time-limited store keyed by derived cache key.
//!
//! Capacity eviction is delegated to [`lru::LruCache`]; this layer adds
//! per-entry age tracking, lazy expiry on lookup, tombstones for empty
//! results, and the `peek`/`get` read-mode split.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::config::CacheOptions;
use crate::error::CacheError;

/// One cached result. `value: None` is a tombstone for an empty upstream
/// result.
struct StoredEntry<V> {
    value: Option<Arc<V>>,
    inserted_at: Instant,
}

impl<V> StoredEntry<V> {
    fn is_expired(&self, max_age: Duration) -> bool {
        self.inserted_at.elapsed() > max_age
    }
}

/// LRU- and age-bounded container owned by one proxy instance.
pub(crate) struct CacheStore<V> {
    entries: LruCache<String, StoredEntry<V>>,
    max_age: Duration,
    stale: bool,
    peek: bool,
}

impl<V> CacheStore<V> {
    pub(crate) fn new(options: &CacheOptions) -> Result<Self, CacheError> {
        let capacity = NonZeroUsize::new(options.max).ok_or(CacheError::ZeroCapacity)?;
        Ok(Self {
            entries: LruCache::new(capacity),
            max_age: options.max_age,
            stale: options.stale,
            peek: options.peek,
        })
    }

    /// Look up a key.
    ///
    /// `None` means miss. `Some(None)` is a tombstone hit, `Some(Some(v))` a
    /// value hit. In `peek` mode (the default) the read does not refresh
    /// recency, so hot keys still age out deterministically. Expired entries
    /// are removed here; there is no background sweeping. With `stale`
    /// enabled the expired value is handed out one last time as it goes.
    pub(crate) fn read(&mut self, key: &str) -> Option<Option<Arc<V>>> {
        let entry = if self.peek {
            self.entries.peek(key)
        } else {
            self.entries.get(key)
        }?;

        if !entry.is_expired(self.max_age) {
            return Some(entry.value.clone());
        }

        let expired = self.entries.pop(key)?;
        if self.stale {
            Some(expired.value)
        } else {
            None
        }
    }

    /// Store a result. Always refreshes recency; evicts the least-recently
    /// used entry when over capacity.
    pub(crate) fn insert(&mut self, key: String, value: Option<Arc<V>>) {
        self.entries.put(
            key,
            StoredEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Current entry count, fed to the size gauge.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(options: CacheOptions) -> CacheStore<String> {
        CacheStore::new(&options).expect("capacity is non-zero")
    }

    fn value(v: &str) -> Option<Arc<String>> {
        Some(Arc::new(v.to_string()))
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            CacheStore::<String>::new(&CacheOptions::default().max(0)),
            Err(CacheError::ZeroCapacity)
        ));
    }

    #[test]
    fn read_returns_stored_value() {
        let mut store = store(CacheOptions::default());
        store.insert("k".into(), value("v"));

        let hit = store.read("k").expect("hit");
        assert_eq!(hit.as_deref().map(String::as_str), Some("v"));
    }

    #[test]
    fn tombstone_hit_is_distinguishable_from_miss() {
        let mut store = store(CacheOptions::default());
        store.insert("gone".into(), None);

        assert_eq!(store.read("gone"), Some(None));
        assert_eq!(store.read("missing"), None);
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let mut store = store(CacheOptions::default().max(2));
        store.insert("a".into(), value("1"));
        store.insert("b".into(), value("2"));
        store.insert("c".into(), value("3"));

        assert_eq!(store.len(), 2);
        assert!(store.read("a").is_none());
        assert!(store.read("b").is_some());
        assert!(store.read("c").is_some());
    }

    #[test]
    fn peek_reads_do_not_refresh_recency() {
        let mut store = store(CacheOptions::default().max(2).peek(true));
        store.insert("a".into(), value("1"));
        store.insert("b".into(), value("2"));

        // A peek read of "a" must not protect it from eviction.
        assert!(store.read("a").is_some());
        store.insert("c".into(), value("3"));

        assert!(store.read("a").is_none());
        assert!(store.read("b").is_some());
    }

    #[test]
    fn get_reads_refresh_recency() {
        let mut store = store(CacheOptions::default().max(2).peek(false));
        store.insert("a".into(), value("1"));
        store.insert("b".into(), value("2"));

        // An LRU get of "a" makes "b" the eviction candidate.
        assert!(store.read("a").is_some());
        store.insert("c".into(), value("3"));

        assert!(store.read("a").is_some());
        assert!(store.read("b").is_none());
    }

    #[test]
    fn expired_entry_is_a_miss_and_removed() {
        let mut store = store(CacheOptions::default().max_age(Duration::from_millis(10)));
        store.insert("k".into(), value("v"));

        std::thread::sleep(Duration::from_millis(25));

        assert!(store.read("k").is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn stale_serves_expired_entry_exactly_once() {
        let mut store = store(
            CacheOptions::default()
                .max_age(Duration::from_millis(10))
                .stale(true),
        );
        store.insert("k".into(), value("v"));

        std::thread::sleep(Duration::from_millis(25));

        let last = store.read("k").expect("served once while removed");
        assert_eq!(last.as_deref().map(String::as_str), Some("v"));
        assert!(store.read("k").is_none());
    }
}
