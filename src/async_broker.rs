//! Asynchronous fan-out broker: publishers only enqueue into a staging
//! queue; a single dispatcher thread performs matching and fan-out.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::trace;

use crate::diagnostics;
use crate::matcher::Matcher;
use crate::queue::Queue;
use crate::registration::{Poller, RegistrationTable};

struct Envelope<V> {
    topic: String,
    value: V,
}

/// A publish/subscribe broker that decouples publishers from matching and
/// fan-out via a staging queue drained by a single dispatcher thread.
pub struct AsyncBroker<V> {
    table: Arc<RegistrationTable<V>>,
    staging: Arc<Queue<Envelope<V>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl<V> fmt::Debug for AsyncBroker<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncBroker").finish_non_exhaustive()
    }
}

impl<V: Send + Clone + 'static> AsyncBroker<V> {
    /// Creates a new, empty broker and starts its dispatcher thread.
    pub fn new() -> Self {
        let table = Arc::new(RegistrationTable::new());
        let staging = Arc::new(Queue::new());

        let dispatcher = {
            let table = table.clone();
            let staging = staging.clone();
            diagnostics::worker_spawned();
            thread::Builder::new()
                .name("broker-dispatcher".into())
                .spawn(move || {
                    while let Some(envelope) = staging.poll() {
                        let count = table.publish(&envelope.topic, envelope.value);
                        trace!(topic = envelope.topic.as_str(), count, "dispatched");
                    }
                    diagnostics::worker_exited();
                })
                .expect("failed to spawn broker dispatcher thread")
        };

        Self {
            table,
            staging,
            dispatcher: Mutex::new(Some(dispatcher)),
        }
    }

    /// Registers a new subscription and returns its poller. The poller only
    /// receives messages published after this call returns.
    pub fn subscribe(&self, matcher: impl Matcher + 'static) -> Poller<V> {
        self.table.subscribe(matcher)
    }

    /// Enqueues `(topic, value)` into the staging queue for later fan-out by
    /// the dispatcher. Returns the number of subscribers registered at
    /// enqueue time (a potential recipient count, not a delivery guarantee);
    /// returns zero and enqueues nothing if there are no subscribers at all.
    pub fn publish(&self, topic: &str, value: V) -> usize {
        let count = self.table.len();
        if count == 0 {
            return 0;
        }

        let envelope = Envelope {
            topic: topic.to_owned(),
            value,
        };
        // A push racing with `close` is allowed to be silently rejected;
        // the snapshot count already returned stands regardless.
        let _ = self.staging.push(envelope);
        count
    }

    /// Closes the staging queue (which terminates the dispatcher thread once
    /// it has drained), joins the dispatcher, then closes every subscriber
    /// queue in parallel with the given timeout.
    pub fn close(&self, timeout: Option<Duration>) {
        self.staging.close(timeout);

        // The dispatcher must finish fanning out every envelope already
        // sitting in the staging queue before the registrations it fans out
        // to are torn down below. Otherwise a message published strictly
        // before `close` could find an emptied table or a subscriber queue
        // that has already stopped accepting pushes. This join happens
        // unconditionally, even for `timeout == None`: unlike `Queue::close`,
        // `AsyncBroker::close` never returns before every pre-close message
        // has been delivered to its matching subscriber queues.
        if let Some(handle) = self.dispatcher.lock().unwrap().take() {
            let _ = handle.join();
        }

        self.table.close_all(timeout);
    }
}

impl<V: Send + Clone + 'static> Default for AsyncBroker<V> {
    fn default() -> Self {
        Self::new()
    }
}
