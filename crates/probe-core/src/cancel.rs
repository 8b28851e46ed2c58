//! One-shot stop signal shared between tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A flag that goes from "running" to "cancelled" once and never back.
///
/// Clones share the same flag. Used both for the session deadline and for
/// operator interrupts.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag. Later calls have no further effect.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
