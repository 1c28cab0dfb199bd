//! Writer lease for the memory backend
//!
//! At most one writer holds the lease at a time. Waiting is bounded by a
//! timeout and observes the caller's [`Context`].

use parking_lot::{Condvar, Mutex};
use recordstore_core::{Context, Result, StoreError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Upper bound on one condvar wait, so cancellation is noticed promptly
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Default)]
pub(crate) struct WriterLock {
    held: Mutex<bool>,
    released: Condvar,
}

impl WriterLock {
    /// Block until the lease is free, the context stops, or `timeout` passes
    pub(crate) fn acquire(self: &Arc<Self>, ctx: &Context, timeout: Duration) -> Result<WriterLease> {
        ctx.check()?;
        let give_up = Instant::now() + timeout;

        let mut held = self.held.lock();
        while *held {
            ctx.check()?;
            let now = Instant::now();
            if now >= give_up {
                return Err(StoreError::storage_msg(format!(
                    "timed out after {:?} waiting for write lock",
                    timeout
                )));
            }
            let wait = (give_up - now).min(POLL_INTERVAL);
            self.released.wait_for(&mut held, wait);
        }
        *held = true;

        Ok(WriterLease {
            lock: Arc::clone(self),
        })
    }

    fn release(&self) {
        *self.held.lock() = false;
        self.released.notify_one();
    }

    #[cfg(test)]
    pub(crate) fn is_held(&self) -> bool {
        *self.held.lock()
    }
}

/// Exclusive write permission; released on drop
#[derive(Debug)]
pub(crate) struct WriterLease {
    lock: Arc<WriterLock>,
}

impl Drop for WriterLease {
    fn drop(&mut self) {
        self.lock.release();
    }
}
