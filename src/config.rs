//! Configuration for a [`crate::proxy::ProxyCache`] instance.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::key::KeyStyle;
use crate::metrics::{MetricsSink, NoopMetrics};

/// Default maximum number of cached entries.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Default entry lifetime in milliseconds.
pub const DEFAULT_MAX_AGE_MS: u64 = 60_000;

/// Options fixed at construction time, immutable thereafter.
#[derive(Clone)]
pub struct CacheOptions {
    /// Maximum number of cached entries; the least-recently-used entry is
    /// evicted when the store would exceed this.
    pub max: usize,

    /// Age beyond which an entry is treated as expired on lookup.
    pub max_age: Duration,

    /// Serve a still-resident-but-expired entry one last time as it is
    /// removed, instead of treating it as a plain miss.
    pub stale: bool,

    /// Read without refreshing recency, so hot keys still age out under
    /// `max_age` instead of being kept alive by pure LRU reads.
    pub peek: bool,

    /// Cache empty upstream results, suppressing repeated no-result calls.
    pub tombstone: bool,

    /// How cache keys are derived from a method name and arguments.
    pub key_style: KeyStyle,

    /// Metrics sink; defaults to a no-op.
    pub stats: Arc<dyn MetricsSink>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max: DEFAULT_MAX_ENTRIES,
            max_age: Duration::from_millis(DEFAULT_MAX_AGE_MS),
            stale: false,
            peek: true,
            tombstone: true,
            key_style: KeyStyle::default(),
            stats: Arc::new(NoopMetrics),
        }
    }
}

impl CacheOptions {
    /// Set the maximum entry count.
    #[must_use]
    pub fn max(mut self, max: usize) -> Self {
        self.max = max;
        self
    }

    /// Set the entry lifetime.
    #[must_use]
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Enable or disable serving expired entries once on removal.
    #[must_use]
    pub fn stale(mut self, stale: bool) -> Self {
        self.stale = stale;
        self
    }

    /// Choose between recency-neutral `peek` reads and LRU `get` reads.
    #[must_use]
    pub fn peek(mut self, peek: bool) -> Self {
        self.peek = peek;
        self
    }

    /// Enable or disable caching of empty upstream results.
    #[must_use]
    pub fn tombstone(mut self, tombstone: bool) -> Self {
        self.tombstone = tombstone;
        self
    }

    /// Choose the key derivation scheme.
    #[must_use]
    pub fn key_style(mut self, key_style: KeyStyle) -> Self {
        self.key_style = key_style;
        self
    }

    /// Install a metrics sink.
    #[must_use]
    pub fn stats(mut self, stats: Arc<dyn MetricsSink>) -> Self {
        self.stats = stats;
        self
    }
}

impl fmt::Debug for CacheOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheOptions")
            .field("max", &self.max)
            .field("max_age", &self.max_age)
            .field("stale", &self.stale)
            .field("peek", &self.peek)
            .field("tombstone", &self.tombstone)
            .field("key_style", &self.key_style)
            .finish_non_exhaustive()
    }
}
