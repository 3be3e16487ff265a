//! Per-key coordination of outstanding upstream calls.
//!
//! A registry entry exists exactly while an upstream call for that key is
//! outstanding. The first caller for a key becomes the leader and issues the
//! upstream call; every caller, the leader included, is parked on a oneshot
//! receiver and is completed in FIFO arrival order when the call settles.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::error::CacheResult;

/// Shared form of a settled call, cloned out to each waiter.
pub(crate) type SharedOutcome<V> = CacheResult<Option<Arc<V>>>;

type Waiter<V> = oneshot::Sender<SharedOutcome<V>>;

/// Result of enlisting a caller for a key.
pub(crate) enum Enlisted<V> {
    /// No call was outstanding; the caller must issue the upstream call.
    Leader(oneshot::Receiver<SharedOutcome<V>>),
    /// A call is already outstanding; the caller just waits.
    Joined(oneshot::Receiver<SharedOutcome<V>>),
}

/// Mapping from key to the ordered waiters of one outstanding call.
pub(crate) struct InFlightRegistry<V> {
    pending: HashMap<String, Vec<Waiter<V>>>,
}

impl<V> InFlightRegistry<V> {
    pub(crate) fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Join the outstanding call for `key`, creating it when absent.
    ///
    /// Callers must invoke this while holding the same guard that covered the
    /// cache lookup; the check-and-set below is what keeps upstream
    /// invocations unique per key.
    pub(crate) fn enlist(&mut self, key: &str) -> Enlisted<V> {
        let (tx, rx) = oneshot::channel();
        match self.pending.get_mut(key) {
            Some(waiters) => {
                waiters.push(tx);
                Enlisted::Joined(rx)
            }
            None => {
                self.pending.insert(key.to_string(), vec![tx]);
                Enlisted::Leader(rx)
            }
        }
    }

    /// Remove the entry for `key`, returning its waiters in arrival order.
    ///
    /// The entry is gone before anyone is notified, so a failed call never
    /// blocks the next attempt for the same key.
    pub(crate) fn settle(&mut self, key: &str) -> Vec<Waiter<V>> {
        self.pending.remove(key).unwrap_or_default()
    }

    /// Number of callers currently parked on `key`, the leader included.
    #[cfg(test)]
    pub(crate) fn waiting(&self, key: &str) -> usize {
        self.pending.get(key).map_or(0, Vec::len)
    }
}
