//! An in-process publish/subscribe broker with topic pattern matching and
//! per-subscriber unbounded queues.
//!
//! Publishers submit a `(topic, value)` pair; each subscription supplies a
//! [`Matcher`] predicate deciding which published topics its queue
//! receives. Subscribers drain their queue with a blocking
//! [`Queue::poll`][crate::queue::Queue::poll]. Two broker flavors are
//! provided:
//!
//! - [`SyncBroker`]: `publish` performs matching and fan-out on the calling
//!   thread.
//! - [`AsyncBroker`]: `publish` only enqueues into a staging queue; a single
//!   dispatcher thread performs matching and fan-out, decoupling publishers
//!   from slow subscribers.
//!
//! # Example
//!
//! ```
//! use fanout::{Exact, SyncBroker};
//!
//! let broker = SyncBroker::new();
//! let poller = broker.subscribe(Exact::new("users"));
//!
//! assert_eq!(broker.publish("users", "alice"), 1);
//! assert_eq!(broker.publish("groups", "admins"), 0);
//!
//! assert_eq!(poller.poll(), Some("alice"));
//!
//! broker.close(None);
//! assert_eq!(poller.poll(), None);
//! ```
//!
//! Subscriptions only ever see messages published after `subscribe`
//! returns; there is no replay of earlier traffic. There is no
//! unsubscribe, no message acknowledgement or redelivery, no persistence,
//! and no cross-process transport — this is a purely in-process library.
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

mod async_broker;
mod diagnostics;
mod matcher;
mod queue;
mod registration;
mod sync_broker;

pub use async_broker::AsyncBroker;
pub use diagnostics::active_worker_threads;
pub use matcher::{Exact, Matcher};
pub use queue::{PushError, Queue};
pub use registration::Poller;
pub use sync_broker::SyncBroker;

// Callers implementing a regex matcher only need `fanout::Regex`, not a
// direct dependency on the `regex` crate.
pub use regex::Regex;
