//! Background removal of expired pool entries

use std::io;
use std::panic;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::select;
use tracing::{debug, trace};

use crate::pool::Store;
use crate::semaphore::{Acquire, Semaphore, SemaphoreWaiter};

/// Owned handle to the thread that discards expired entries of one pool.
///
/// The thread runs until the handle is shut down or dropped. Shutdown interrupts
/// both the idle wait and the wait for a deadline, so it never lingers until the
/// next entry expires.
#[derive(Debug)]
pub(crate) struct Reclaimer {
    permits: Semaphore,
    // Never sent on: disconnecting it is the shutdown signal.
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Reclaimer {
    pub fn spawn<T>(
        store: Arc<Store<T>>,
        permits: SemaphoreWaiter,
        thread_name: &str,
    ) -> io::Result<Self>
    where
        T: Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = channel::bounded(0);
        let signal_side = permits.semaphore();

        let handle = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || {
                debug!("reclaimer thread started");
                reclaim_loop(&store, &permits, &shutdown_rx);
                debug!("reclaimer thread exiting");
            })?;

        Ok(Self {
            permits: signal_side,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Stop the thread and wait for it to exit.
    pub fn shutdown(&mut self) {
        // Close interrupts the idle wait, the disconnect interrupts the deadline wait.
        self.permits.close();
        drop(self.shutdown.take());

        if let Some(handle) = self.handle.take()
            && let Err(payload) = handle.join()
            && !thread::panicking()
        {
            panic::resume_unwind(payload);
        }
    }
}

impl Drop for Reclaimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Each permit stands for one `add`. Per permit, wait for the oldest entry's
/// deadline and remove that one entry if it is still due. Permits are hints:
/// the store is re-checked under the lock before anything is removed.
fn reclaim_loop<T>(store: &Store<T>, permits: &SemaphoreWaiter, shutdown: &Receiver<()>) {
    loop {
        if permits.wait() == Acquire::Cancelled {
            return;
        }

        // Emptied by retrieval since the permit was issued.
        let Some(deadline) = store.back_deadline() else {
            continue;
        };

        let delay = deadline.saturating_duration_since(Instant::now());
        trace!(?delay, "waiting for oldest entry to expire");

        select! {
            recv(shutdown) -> _ => return,
            default(delay) => {}
        }

        // The entry is dropped here, outside the store lock.
        if store.reclaim_back(Instant::now()).is_some() {
            trace!("reclaimed expired entry");
        }
    }
}
