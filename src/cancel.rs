//! Cooperative cancellation for extraction and rendering.
//!
//! Long-running work polls a [`CancelToken`] at page and stage boundaries.
//! Once a token reports cancellation the work returns [`Outcome::Cancelled`]
//! without touching any shared state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation signal polled by long-running work.
pub trait CancelToken {
    fn is_cancelled(&self) -> bool;
}

/// Token that never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancelToken for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shared flag that can be tripped from any clone.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    /// Create a new, untripped flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the flag. Every clone observes the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

impl CancelToken for CancellationFlag {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Result of cancellable work.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The work ran to completion.
    Completed(T),
    /// The work observed cancellation and produced nothing.
    Cancelled,
}

impl<T> Outcome<T> {
    /// Whether the work was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    /// Convert into an `Option`, dropping the cancellation marker.
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }

    /// Map the completed value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Completed(value) => Outcome::Completed(f(value)),
            Outcome::Cancelled => Outcome::Cancelled,
        }
    }
}
