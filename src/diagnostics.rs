//! Process-wide introspection of background worker threads.
//!
//! Every [`crate::Queue`] coordinator and every [`crate::AsyncBroker`]
//! dispatcher registers itself here on spawn and deregisters on exit. This
//! exists solely so tests (and curious callers) can confirm that `close`
//! leaves no thread running, without resorting to platform-specific process
//! introspection.

use std::sync::atomic::{AtomicUsize, Ordering};

static ACTIVE_WORKERS: AtomicUsize = AtomicUsize::new(0);

pub(crate) fn worker_spawned() {
    ACTIVE_WORKERS.fetch_add(1, Ordering::AcqRel);
}

pub(crate) fn worker_exited() {
    ACTIVE_WORKERS.fetch_sub(1, Ordering::AcqRel);
}

/// Returns the number of coordinator and dispatcher threads currently alive
/// across every [`crate::Queue`] and [`crate::AsyncBroker`] in this process.
///
/// Intended for tests and diagnostics; production code should have no reason
/// to branch on this value.
pub fn active_worker_threads() -> usize {
    ACTIVE_WORKERS.load(Ordering::Acquire)
}
