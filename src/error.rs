//! Errors for proxy-cache construction and wrapped calls.

use std::sync::Arc;

use thiserror::Error;

/// Errors surfaced by [`crate::proxy::ProxyCache`].
///
/// The enum is `Clone` because one upstream failure must be delivered
/// identically to every caller queued on the same key.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The requested method name is not declared by the wrapped target.
    #[error("method not found on target: {0}")]
    UnknownMethod(String),

    /// The cache was configured with a zero entry capacity.
    #[error("cache capacity must be greater than zero")]
    ZeroCapacity,

    /// The in-flight call settled without delivering a result.
    ///
    /// Reachable only if the spawned upstream task is torn down mid-flight,
    /// e.g. at runtime shutdown.
    #[error("in-flight call was interrupted before completing")]
    Interrupted,

    /// The wrapped method itself failed.
    #[error("upstream call failed: {0}")]
    Upstream(Arc<dyn std::error::Error + Send + Sync>),
}

impl CacheError {
    /// Wrap an error returned by the wrapped method.
    pub fn upstream<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Upstream(Arc::new(err))
    }

    /// Wrap a plain message as an upstream failure.
    pub fn upstream_msg(msg: impl Into<String>) -> Self {
        Self::Upstream(Arc::new(std::io::Error::other(msg.into())))
    }
}

/// Result alias used throughout the crate.
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_clone_and_display() {
        let err = CacheError::upstream_msg("connection reset");
        let cloned = err.clone();

        assert_eq!(err.to_string(), "upstream call failed: connection reset");
        assert_eq!(cloned.to_string(), err.to_string());
    }

    #[test]
    fn unknown_method_names_the_method() {
        let err = CacheError::UnknownMethod("fetch_user".into());
        assert_eq!(err.to_string(), "method not found on target: fetch_user");
    }
}
