//! Synchronous fan-out broker: the publisher thread performs matching and
//! enqueueing itself.

use std::fmt;
use std::time::Duration;

use tracing::trace;

use crate::matcher::Matcher;
use crate::registration::{Poller, RegistrationTable};

/// A publish/subscribe broker where `publish` performs matching and
/// fan-out inline, on the calling thread.
pub struct SyncBroker<V> {
    table: RegistrationTable<V>,
}

impl<V> fmt::Debug for SyncBroker<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncBroker").finish_non_exhaustive()
    }
}

impl<V: Send + Clone + 'static> SyncBroker<V> {
    /// Creates a new, empty broker.
    pub fn new() -> Self {
        Self {
            table: RegistrationTable::new(),
        }
    }

    /// Registers a new subscription and returns its poller. The poller only
    /// receives messages published after this call returns.
    pub fn subscribe(&self, matcher: impl Matcher + 'static) -> Poller<V> {
        self.table.subscribe(matcher)
    }

    /// Publishes `value` under `topic`, pushing a clone into every matching
    /// subscriber's queue. Returns the number of subscribers matched.
    pub fn publish(&self, topic: &str, value: V) -> usize {
        let count = self.table.publish(topic, value);
        trace!(topic, count, "published");
        count
    }

    /// Closes every subscriber queue, in parallel, with the given timeout,
    /// then clears the registration table. After this call, `publish`
    /// matches nothing and returns zero.
    pub fn close(&self, timeout: Option<Duration>) {
        self.table.close_all(timeout);
    }
}

impl<V: Send + Clone + 'static> Default for SyncBroker<V> {
    fn default() -> Self {
        Self::new()
    }
}
