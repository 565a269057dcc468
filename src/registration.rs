//! The registration table shared by [`crate::SyncBroker`] and
//! [`crate::AsyncBroker`]: a sequence of `(queue, matcher)` pairs guarded by
//! a reader/writer lock.

use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

use crate::matcher::Matcher;
use crate::queue::Queue;

/// The read end of a subscription.
pub type Poller<V> = Arc<Queue<V>>;

struct Registration<V> {
    queue: Arc<Queue<V>>,
    matcher: Box<dyn Matcher>,
}

pub(crate) struct RegistrationTable<V> {
    entries: RwLock<Vec<Registration<V>>>,
}

impl<V: Send + Clone + 'static> RegistrationTable<V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Registers a new subscription and returns its poller. New subscribers
    /// only ever see messages published after this call returns.
    pub(crate) fn subscribe(&self, matcher: impl Matcher + 'static) -> Poller<V> {
        let queue = Arc::new(Queue::new());
        let mut entries = self.entries.write().unwrap();
        entries.push(Registration {
            queue: queue.clone(),
            matcher: Box::new(matcher),
        });
        queue
    }

    /// Fans `value` out to every registration whose matcher accepts `topic`,
    /// returning the number of registrations matched.
    pub(crate) fn publish(&self, topic: &str, value: V) -> usize {
        let entries = self.entries.read().unwrap();
        let mut count = 0;
        for entry in entries.iter() {
            if entry.matcher.matches(topic) {
                // A push racing with that subscriber's own close is allowed
                // to be rejected; fan-out to the other subscribers must not
                // be affected by it.
                let _ = entry.queue.push(value.clone());
                count += 1;
            }
        }
        count
    }

    /// The number of currently-registered subscriptions.
    pub(crate) fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Tears the table down: takes every registration, closes each queue in
    /// parallel with the same `timeout`, and waits for all of them. After
    /// this call the table is empty.
    pub(crate) fn close_all(&self, timeout: Option<Duration>) {
        let taken = std::mem::take(&mut *self.entries.write().unwrap());

        thread::scope(|scope| {
            for entry in &taken {
                let queue = &entry.queue;
                scope.spawn(move || queue.close(timeout));
            }
        });
    }
}
