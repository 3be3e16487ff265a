//! proxy-cache - Caching decorator for asynchronous methods
//!
//! Wraps an object's async methods behind a bounded, time-limited cache and
//! collapses concurrent identical calls into a single upstream invocation
//! whose result fans out to every waiter in arrival order. Call sites keep
//! their shape; non-wrapped members stay reachable on the original instance.
//!
//! # Architecture
//!
//! - [`key`]: deterministic cache keys from a method name and arguments
//! - `store` (internal): LRU capacity eviction via the `lru` crate plus lazy
//!   per-entry expiry, tombstones, and `peek`/`get` read modes
//! - `inflight` (internal): per-key coalescing of outstanding calls
//! - [`metrics`]: injected sink for cache traffic counters, no-op by default
//! - [`proxy`]: the decorator tying the pieces together
//!
//! # Example
//!
//! ```ignore
//! use proxy_cache::{CacheOptions, CacheTarget, ProxyCache};
//!
//! let proxy = ProxyCache::new(client, &["fetch_user"], CacheOptions::default())?;
//! let target = proxy.target_arc();
//! let user = proxy
//!     .call("fetch_user", &[&id], move || async move { target.fetch_user(id).await })
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod key;
pub mod metrics;
pub mod proxy;

mod inflight;
mod store;

// Re-export commonly used types for convenience
pub use config::{CacheOptions, DEFAULT_MAX_AGE_MS, DEFAULT_MAX_ENTRIES};
pub use error::{CacheError, CacheResult};
pub use key::{cache_key, KeyStyle, KEY_SEPARATOR};
pub use metrics::{MetricsSink, NoopMetrics};
pub use proxy::{CacheTarget, ProxyCache};
