//! Cooperative cancellation for integrity scans.
//!
//! A `CheckContext` is cheap to clone; clones share one cancellation flag so
//! a caller can cancel a scan running elsewhere. Work is never preempted: the
//! engine polls `check()` at phase and entity-kind boundaries.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why a context is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    Cancelled,
    DeadlineExceeded,
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "context canceled"),
            Self::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

impl Error for ContextError {}

/// Cancellation flag plus optional deadline.
#[derive(Debug, Clone, Default)]
pub struct CheckContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CheckContext {
    /// A context that is never done unless cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::default(),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Marks this context and every clone of it as cancelled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns why the context is done, or `None` while it is still live.
    ///
    /// Cancellation wins over an expired deadline.
    pub fn err(&self) -> Option<ContextError> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// `Err` once the context is done.
    pub fn check(&self) -> Result<(), ContextError> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CheckContext, ContextError};
    use std::time::{Duration, Instant};

    #[test]
    fn background_context_is_live() {
        let ctx = CheckContext::background();
        assert_eq!(ctx.err(), None);
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let ctx = CheckContext::background();
        let handle = ctx.clone();
        handle.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));
    }

    #[test]
    fn expired_deadline_reports_deadline_exceeded() {
        let ctx = CheckContext::with_deadline(Instant::now() - Duration::from_millis(1));
        assert_eq!(ctx.check(), Err(ContextError::DeadlineExceeded));
    }

    #[test]
    fn cancellation_takes_precedence_over_deadline() {
        let ctx = CheckContext::with_timeout(Duration::ZERO);
        ctx.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));
    }
}
