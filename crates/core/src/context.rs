//! Cancellation context for store operations
//!
//! Every store and repository call takes a `&Context`. The store never
//! imposes a timeout of its own; a caller that wants one attaches a deadline
//! or cancels the context from another thread. Repositories check the
//! context before each storage statement and while waiting for a lock.

use crate::error::{Result, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why a context stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// [`CancelHandle::cancel`] was called
    Requested,
    /// The context's deadline passed
    DeadlineExceeded,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::Requested => write!(f, "cancellation requested"),
            CancelReason::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// Cancellation and deadline carrier
///
/// Cloning a context shares its cancellation flag.
///
/// # Examples
///
/// ```
/// use recordstore_core::Context;
///
/// let (ctx, handle) = Context::with_cancel();
/// assert!(ctx.check().is_ok());
/// handle.cancel();
/// assert!(ctx.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

/// Cancels the [`Context`] it was created with
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Cancel every clone of the associated context
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }
}

impl Context {
    /// Context that never stops
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancellable context and the handle that cancels it
    pub fn with_cancel() -> (Self, CancelHandle) {
        let flag = Arc::new(AtomicBool::new(false));
        let ctx = Self {
            cancelled: Some(Arc::clone(&flag)),
            deadline: None,
        };
        (ctx, CancelHandle { flag })
    }

    /// Context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::default().deadline_in(timeout)
    }

    /// Add (or tighten) a deadline `timeout` from now
    pub fn deadline_in(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        self
    }

    /// Deadline, if one is set
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Why the context stopped, if it has
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        if let Some(flag) = &self.cancelled {
            if flag.load(Ordering::Acquire) {
                return Some(CancelReason::Requested);
            }
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    /// Fail with [`StoreError::Cancelled`] if the context has stopped
    #[inline]
    pub fn check(&self) -> Result<()> {
        match self.cancel_reason() {
            Some(reason) => Err(StoreError::Cancelled { reason }),
            None => Ok(()),
        }
    }
}
