//! Caching proxy over a target's asynchronous methods.
//!
//! Wraps any [`CacheTarget`] as a decorator: declared methods route through
//! the key generator, the bounded store, and the in-flight coordinator;
//! everything else stays reachable on the original instance via
//! [`ProxyCache::target`].

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::config::CacheOptions;
use crate::error::{CacheError, CacheResult};
use crate::inflight::{Enlisted, InFlightRegistry, SharedOutcome};
use crate::key::cache_key;
use crate::metrics::{
    method_tag, METRIC_CALLS, METRIC_DURATION, METRIC_HIT, METRIC_MISS, METRIC_SIZE,
};
use crate::store::CacheStore;

/// A target whose asynchronous methods can be wrapped.
///
/// The declared name list is the static replacement for reflective member
/// enumeration: construction validates every requested method against it, and
/// only declared names are accepted by [`ProxyCache::call`].
pub trait CacheTarget {
    /// Names of the asynchronous methods this target exposes for wrapping.
    fn method_names(&self) -> &[&str];
}

/// Store and registry guarded together, the async analogue of the single
/// uninterruptible check-and-set section of a cooperative event loop.
struct CacheState<V> {
    store: CacheStore<V>,
    inflight: InFlightRegistry<V>,
}

/// State shared with the spawned upstream tasks.
struct Inner<V> {
    state: Mutex<CacheState<V>>,
    options: CacheOptions,
}

impl<V> Inner<V> {
    /// Record the settled upstream call: write the store per tombstone
    /// policy, clear the in-flight entry, then fan the outcome out to every
    /// waiter in arrival order.
    async fn settle(&self, key: &str, method: &str, outcome: SharedOutcome<V>) {
        let waiters = {
            let mut state = self.state.lock().await;
            match &outcome {
                Ok(Some(value)) => state.store.insert(key.to_string(), Some(Arc::clone(value))),
                Ok(None) if self.options.tombstone => state.store.insert(key.to_string(), None),
                Ok(None) => {}
                Err(err) => {
                    debug!(method, key, %err, "upstream call failed; not cached");
                }
            }
            state.inflight.settle(key)
        };

        trace!(method, key, waiters = waiters.len(), "fanning out result");
        for waiter in waiters {
            // A waiter may have gone away; delivery is best effort.
            let _ = waiter.send(clone_outcome(&outcome));
        }
    }
}

fn clone_outcome<V>(outcome: &SharedOutcome<V>) -> SharedOutcome<V> {
    match outcome {
        Ok(value) => Ok(value.clone()),
        Err(err) => Err(err.clone()),
    }
}

/// Caching decorator for a target's asynchronous methods.
///
/// Repeated calls are served from a bounded, time-limited cache; concurrent
/// identical calls collapse into a single upstream invocation whose result
/// fans out to all waiters. The store and in-flight registry are owned
/// exclusively by one instance.
///
/// # Example
///
/// ```no_run
/// use proxy_cache::{CacheOptions, CacheResult, CacheTarget, ProxyCache};
///
/// struct UserClient;
///
/// impl UserClient {
///     async fn fetch_user(&self, id: u64) -> CacheResult<Option<String>> {
///         Ok(Some(format!("user-{id}")))
///     }
/// }
///
/// impl CacheTarget for UserClient {
///     fn method_names(&self) -> &[&str] {
///         &["fetch_user"]
///     }
/// }
///
/// # async fn run() -> CacheResult<()> {
/// let proxy = ProxyCache::new(UserClient, &["fetch_user"], CacheOptions::default())?;
/// let id = 1_u64;
/// let client = proxy.target_arc();
/// let user = proxy
///     .call("fetch_user", &[&id], move || async move {
///         client.fetch_user(id).await
///     })
///     .await?;
/// assert_eq!(user.as_deref(), Some("user-1"));
/// # Ok(())
/// # }
/// ```
pub struct ProxyCache<T, V> {
    target: Arc<T>,
    methods: Vec<String>,
    inner: Arc<Inner<V>>,
}

impl<T, V> ProxyCache<T, V>
where
    T: CacheTarget,
    V: Clone + Send + Sync + 'static,
{
    /// Wrap `target`, caching the listed methods.
    ///
    /// # Errors
    ///
    /// Fails fast when a requested method is not declared by the target, or
    /// when `options.max` is zero.
    pub fn new(target: T, methods: &[&str], options: CacheOptions) -> CacheResult<Self> {
        let declared = target.method_names();
        for method in methods {
            if !declared.contains(method) {
                return Err(CacheError::UnknownMethod((*method).to_string()));
            }
        }

        let store = CacheStore::new(&options)?;
        Ok(Self {
            target: Arc::new(target),
            methods: methods.iter().map(ToString::to_string).collect(),
            inner: Arc::new(Inner {
                state: Mutex::new(CacheState {
                    store,
                    inflight: InFlightRegistry::new(),
                }),
                options,
            }),
        })
    }

    /// The original instance, for members that are passed through unwrapped.
    pub fn target(&self) -> &T {
        &self.target
    }

    /// An owned handle to the original instance, for moving into the
    /// `'static` upstream future passed to [`ProxyCache::call`].
    pub fn target_arc(&self) -> Arc<T> {
        Arc::clone(&self.target)
    }

    /// Names of the wrapped methods, in declaration order.
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// Current number of cached entries.
    pub async fn len(&self) -> usize {
        self.inner.state.lock().await.store.len()
    }

    /// Whether the cache currently holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Invoke the wrapped method `method` with `args`, running `upstream`
    /// only when the result is neither cached nor already in flight.
    ///
    /// `Ok(None)` models an empty upstream result; with tombstones enabled it
    /// is cached like any value. The returned value is an independent clone:
    /// mutating it never affects the stored entry or other callers. Hits are
    /// delivered on the next scheduler tick, so callers observe the same
    /// asynchronous contract whether the result came from cache or upstream.
    ///
    /// # Errors
    ///
    /// [`CacheError::UnknownMethod`] when `method` was not wrapped at
    /// construction; otherwise whatever `upstream` fails with, delivered
    /// identically to every coalesced caller and never cached.
    pub async fn call<F, Fut>(
        &self,
        method: &str,
        args: &[&(dyn Display + Sync)],
        upstream: F,
    ) -> CacheResult<Option<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<Option<V>>> + Send + 'static,
    {
        if !self.methods.iter().any(|m| m == method) {
            return Err(CacheError::UnknownMethod(method.to_string()));
        }

        let key = cache_key(method, args, self.inner.options.key_style);
        let tag = method_tag(method);
        let tags = [tag.as_str()];
        let stats = &self.inner.options.stats;
        stats.incr(METRIC_CALLS, 1, &tags);

        // Cache read and in-flight enlist happen under one guard; nothing can
        // slip between the check and the set.
        let enlisted = {
            let mut state = self.inner.state.lock().await;
            stats.gauge(METRIC_SIZE, state.store.len() as u64, &tags);

            if let Some(hit) = state.store.read(&key) {
                drop(state);
                stats.incr(METRIC_HIT, 1, &tags);
                trace!(method, key = %key, "cache hit");
                // Hits resolve on the next tick, same contract as a miss.
                tokio::task::yield_now().await;
                return Ok(hit.map(|value| (*value).clone()));
            }

            stats.incr(METRIC_MISS, 1, &tags);
            state.inflight.enlist(&key)
        };

        let rx = match enlisted {
            Enlisted::Joined(rx) => {
                trace!(method, key = %key, "joined in-flight call");
                rx
            }
            Enlisted::Leader(rx) => {
                debug!(method, key = %key, "cache miss; invoking upstream");
                self.spawn_upstream(method, key, upstream());
                rx
            }
        };

        match rx.await {
            Ok(outcome) => outcome.map(|value| value.map(|v| (*v).clone())),
            Err(_) => Err(CacheError::Interrupted),
        }
    }

    /// Run the upstream call detached: once issued it runs to completion or
    /// error even if the initiating caller's future is dropped.
    fn spawn_upstream<Fut>(&self, method: &str, key: String, upstream: Fut)
    where
        Fut: Future<Output = CacheResult<Option<V>>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let method = method.to_string();
        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = upstream.await.map(|value| value.map(Arc::new));
            let elapsed = started.elapsed();

            inner.options.stats.timer(
                METRIC_DURATION,
                elapsed,
                &[method_tag(&method).as_str()],
            );
            inner.settle(&key, &method, outcome).await;
        });
    }
}

impl<T, V> std::fmt::Debug for ProxyCache<T, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyCache")
            .field("methods", &self.methods)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Target;

    impl CacheTarget for Target {
        fn method_names(&self) -> &[&str] {
            &["get_user", "get_profile"]
        }
    }

    #[tokio::test]
    async fn construction_rejects_undeclared_methods() {
        let result: CacheResult<ProxyCache<Target, String>> =
            ProxyCache::new(Target, &["get_user", "get_orders"], CacheOptions::default());

        assert!(matches!(
            result,
            Err(CacheError::UnknownMethod(name)) if name == "get_orders"
        ));
    }

    #[tokio::test]
    async fn construction_rejects_zero_capacity() {
        let result: CacheResult<ProxyCache<Target, String>> =
            ProxyCache::new(Target, &["get_user"], CacheOptions::default().max(0));

        assert!(matches!(result, Err(CacheError::ZeroCapacity)));
    }

    #[tokio::test]
    async fn call_rejects_unwrapped_method() {
        let proxy: ProxyCache<Target, String> =
            ProxyCache::new(Target, &["get_user"], CacheOptions::default()).unwrap();

        let result = proxy
            .call("get_profile", &[], || async { Ok(None) })
            .await;

        assert!(matches!(
            result,
            Err(CacheError::UnknownMethod(name)) if name == "get_profile"
        ));
    }

    #[tokio::test]
    async fn target_is_passed_through_directly() {
        let proxy: ProxyCache<Target, String> =
            ProxyCache::new(Target, &["get_user"], CacheOptions::default()).unwrap();

        assert_eq!(proxy.target().method_names(), &["get_user", "get_profile"]);
        assert_eq!(proxy.methods(), &["get_user".to_string()]);
        assert!(proxy.is_empty().await);
    }
}
