//! Counting wake-up primitive between the pool and its reclaimer

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// Create a counting semaphore with no permits, split into its signal and wait sides.
pub(crate) fn counting() -> (Semaphore, SemaphoreWaiter) {
    let inner = Arc::new(Inner {
        state: Mutex::new(State::default()),
        available: Condvar::new(),
    });

    (
        Semaphore {
            inner: Arc::clone(&inner),
        },
        SemaphoreWaiter { inner },
    )
}

/// Outcome of waiting on a [`SemaphoreWaiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Acquire {
    /// One permit was consumed.
    Acquired,

    /// The semaphore was closed.
    Cancelled,
}

#[derive(Debug, Default)]
struct State {
    permits: usize,
    closed: bool,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<State>,
    available: Condvar,
}

/// Signal side: each call to [`signal`](Self::signal) makes one more permit available.
#[derive(Debug, Clone)]
pub(crate) struct Semaphore {
    inner: Arc<Inner>,
}

impl Semaphore {
    pub fn signal(&self) {
        let mut state = self.inner.state.lock();
        state.permits = state.permits.saturating_add(1);
        drop(state);

        self.inner.available.notify_one();
    }

    /// Number of permits not yet consumed by the waiter.
    pub fn available(&self) -> usize {
        self.inner.state.lock().permits
    }

    /// Wake the waiter for good. Later waits return [`Acquire::Cancelled`]
    /// even if permits remain.
    pub fn close(&self) {
        self.inner.state.lock().closed = true;
        self.inner.available.notify_all();
    }
}

/// Wait side, owned by the single consumer.
#[derive(Debug)]
pub(crate) struct SemaphoreWaiter {
    inner: Arc<Inner>,
}

impl SemaphoreWaiter {
    /// Block until a permit can be consumed, or until the semaphore is closed.
    pub fn wait(&self) -> Acquire {
        let mut state = self.inner.state.lock();

        while state.permits == 0 && !state.closed {
            self.inner.available.wait(&mut state);
        }

        if state.closed {
            return Acquire::Cancelled;
        }

        state.permits -= 1;
        Acquire::Acquired
    }

    /// A signal side sharing this waiter's count.
    pub fn semaphore(&self) -> Semaphore {
        Semaphore {
            inner: Arc::clone(&self.inner),
        }
    }
}
