//! Metrics emission for cache traffic.
//!
//! The sink is an injected trait object with a no-op default, constructed per
//! instance and never process-global. Counter and gauge names are fixed; every
//! emission carries a `method:<name>` tag.

use std::time::Duration;

/// Counter incremented once per wrapped call.
pub const METRIC_CALLS: &str = "proxy-cache.calls";

/// Gauge reporting the current cache entry count.
pub const METRIC_SIZE: &str = "proxy-cache.size";

/// Counter incremented on every cache hit.
pub const METRIC_HIT: &str = "proxy-cache.hit";

/// Counter incremented on every cache miss, coalesced joiners included.
pub const METRIC_MISS: &str = "proxy-cache.miss";

/// Timer recording the elapsed time of the upstream call only.
pub const METRIC_DURATION: &str = "proxy-cache.duration";

/// Sink for cache traffic metrics.
///
/// Implementations must be cheap: every emission happens on the call path,
/// some while the cache lock is held.
pub trait MetricsSink: Send + Sync {
    /// Increment a counter by `delta`.
    fn incr(&self, name: &str, delta: u64, tags: &[&str]);

    /// Report a point-in-time gauge value.
    fn gauge(&self, name: &str, value: u64, tags: &[&str]);

    /// Record an elapsed duration.
    fn timer(&self, name: &str, elapsed: Duration, tags: &[&str]);
}

/// Default sink that drops every emission.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn incr(&self, _name: &str, _delta: u64, _tags: &[&str]) {}

    fn gauge(&self, _name: &str, _value: u64, _tags: &[&str]) {}

    fn timer(&self, _name: &str, _elapsed: Duration, _tags: &[&str]) {}
}

/// Build the `method:<name>` tag attached to every emission for a call.
pub(crate) fn method_tag(method: &str) -> String {
    format!("method:{method}")
}
