//! Bounded execution scopes for data source reads.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

/// Read timeout declared by the data source.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Deadlines are capped this far in the future.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeoutError {
    #[error("deadline of `{0:?}` exceeded")]
    DeadlineExceeded(Duration),
    #[error("operation cancelled")]
    Cancelled,
}

/// Stop signal owned by the host. Clones share the same signal.
#[derive(Debug, Clone, Default)]
pub struct StopContext {
    stopped: Arc<AtomicBool>,
}

impl StopContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Scope of a single read: a deadline derived from the host stop signal.
///
/// The scope is cancelled when dropped, whichever way the read exits.
#[derive(Debug)]
pub struct ReadContext {
    parent: StopContext,
    cancelled: Arc<AtomicBool>,
    timeout: Duration,
    deadline: Instant,
}

impl ReadContext {
    pub fn for_read(parent: &StopContext, timeout: Duration) -> Self {
        let now = Instant::now();
        let deadline = now.checked_add(timeout.min(FAR_FUTURE)).unwrap_or(now);
        Self {
            parent: parent.clone(),
            cancelled: Arc::new(AtomicBool::new(false)),
            timeout,
            deadline,
        }
    }

    /// Time left before the deadline. Fails once the scope is cancelled or expired.
    pub fn remaining(&self) -> Result<Duration, TimeoutError> {
        if self.is_cancelled() {
            return Err(TimeoutError::Cancelled);
        }
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(TimeoutError::DeadlineExceeded(self.timeout));
        }
        Ok(remaining)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst) || self.parent.is_stopped()
    }

    /// Handle observing this scope's cancellation, usable after the scope is gone.
    pub fn cancellation(&self) -> Cancellation {
        Cancellation(self.cancelled.clone())
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl Drop for ReadContext {
    fn drop(&mut self) {
        self.cancel();
        debug!("read scope released");
    }
}

/// Read-only view of a [`ReadContext`] cancellation flag.
#[derive(Debug, Clone)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
