//! The unbounded, thread-safe, closable queue underlying every subscriber
//! queue and the async broker's staging queue.
//!
//! A background coordinator thread owns the buffer outright; producers and
//! consumers only ever touch the single-slot `in`/`out` handoff channels, so
//! the buffer itself needs no lock.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Select, Sender, TryRecvError};
use tracing::{debug, trace};

use crate::diagnostics;

/// Returned by [`Queue::push`] when the queue has entered phase-1 close (or
/// later). Carries the rejected value back to the caller.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct PushError<T>(pub T);

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushError").finish_non_exhaustive()
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "pushing into a closed queue".fmt(f)
    }
}

impl<T: fmt::Debug> std::error::Error for PushError<T> {}

/// An unbounded multi-producer, multi-consumer FIFO queue with blocking
/// `poll` and a two-phase `close`.
pub struct Queue<T> {
    in_tx: Mutex<Option<Sender<T>>>,
    out_rx: Receiver<T>,
    force_close_tx: Mutex<Option<Sender<()>>>,
    done_rx: Receiver<()>,
    accepting: AtomicBool,
    close_started: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<T> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Queue<T> {
    /// Creates a new queue and starts its background coordinator thread.
    pub fn new() -> Self {
        let (in_tx, in_rx) = bounded::<T>(1);
        let (out_tx, out_rx) = bounded::<T>(1);
        let (force_close_tx, force_close_rx) = bounded::<()>(0);
        let (done_tx, done_rx) = bounded::<()>(0);

        diagnostics::worker_spawned();
        let worker = thread::Builder::new()
            .name("queue-coordinator".into())
            .spawn(move || {
                coordinate(in_rx, out_tx, force_close_rx);
                drop(done_tx);
                diagnostics::worker_exited();
            })
            .expect("failed to spawn queue coordinator thread");

        Self {
            in_tx: Mutex::new(Some(in_tx)),
            out_rx,
            force_close_tx: Mutex::new(Some(force_close_tx)),
            done_rx,
            accepting: AtomicBool::new(true),
            close_started: AtomicBool::new(false),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Hands `value` to the coordinator. Non-blocking in the common case;
    /// may block briefly if the single-slot `in` handoff is currently full.
    ///
    /// Returns `Err` without side effects if the queue has already entered
    /// phase-1 close.
    pub fn push(&self, value: T) -> Result<(), PushError<T>> {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(PushError(value));
        }

        let guard = self.in_tx.lock().unwrap();
        match guard.as_ref() {
            Some(tx) => tx.send(value).map_err(|e| PushError(e.into_inner())),
            None => Err(PushError(value)),
        }
    }

    /// Blocks until a value is available, returning `Some(value)`, or until
    /// the queue is fully closed and drained, returning `None`. Once `None`
    /// has been observed, every later call also returns `None` immediately.
    pub fn poll(&self) -> Option<T> {
        self.out_rx.recv().ok()
    }

    /// True once the queue will accept no further pushes (it may still have
    /// buffered values left to drain).
    pub fn is_closed(&self) -> bool {
        !self.accepting.load(Ordering::Acquire)
    }

    /// Initiates close.
    ///
    /// `None` starts phase-1 close and returns immediately: already-buffered
    /// values keep draining in the background. `Some(timeout)` additionally
    /// blocks until the coordinator has drained naturally or, failing that
    /// within `timeout`, forces it to abandon the buffer — either way this
    /// call does not return until the coordinator thread has been joined.
    ///
    /// Calling this more than once is a no-op after the first call.
    pub fn close(&self, timeout: Option<Duration>) {
        if self.close_started.swap(true, Ordering::AcqRel) {
            return;
        }

        trace!(?timeout, "queue close initiated");
        self.accepting.store(false, Ordering::Release);
        self.in_tx.lock().unwrap().take();

        if let Some(timeout) = timeout {
            match self.done_rx.recv_timeout(timeout) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    debug!("queue coordinator drained naturally within timeout");
                }
                Err(RecvTimeoutError::Timeout) => {
                    debug!("queue close timed out, forcing shutdown");
                    self.force_close_tx.lock().unwrap().take();
                    let _ = self.done_rx.recv();
                }
            }

            if let Some(handle) = self.worker.lock().unwrap().take() {
                let _ = handle.join();
            }
        }
    }
}

impl<T: Send + 'static> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Queue<T> {
    fn drop(&mut self) {
        // Safety net for queues whose owner never called `close`: make sure
        // the coordinator thread is not leaked past this point.
        self.accepting.store(false, Ordering::Release);
        if !self.close_started.swap(true, Ordering::AcqRel) {
            self.in_tx.lock().unwrap().take();
            self.force_close_tx.lock().unwrap().take();
        }
        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

/// True if `force_close` has been signaled, i.e. its sender has been
/// dropped. The channel is never actually sent on; closure is the signal.
fn is_force_closed(force_close_rx: &Receiver<()>) -> bool {
    !matches!(force_close_rx.try_recv(), Err(TryRecvError::Empty))
}

fn coordinate<T>(in_rx: Receiver<T>, out_tx: Sender<T>, force_close_rx: Receiver<()>) {
    let mut buffer: VecDeque<T> = VecDeque::new();
    let mut in_closed = false;

    loop {
        if is_force_closed(&force_close_rx) {
            break;
        }
        if buffer.is_empty() && in_closed {
            break;
        }

        let mut sel = Select::new();
        let force_idx = sel.recv(&force_close_rx);
        let in_idx = if in_closed {
            None
        } else {
            Some(sel.recv(&in_rx))
        };
        let out_idx = if buffer.is_empty() {
            None
        } else {
            Some(sel.send(&out_tx))
        };

        let oper = sel.select();
        let idx = oper.index();

        if idx == force_idx {
            let _ = oper.recv(&force_close_rx);
            break;
        } else if Some(idx) == in_idx {
            match oper.recv(&in_rx) {
                Ok(value) => buffer.push_back(value),
                Err(_) => in_closed = true,
            }
        } else if Some(idx) == out_idx {
            let front = buffer
                .pop_front()
                .expect("out was only registered when buffer is non-empty");
            if oper.send(&out_tx, front).is_err() {
                // The consumer side (the Queue itself) was dropped; nothing
                // left to do.
                break;
            }
        }
    }

    drop(out_tx);
}
