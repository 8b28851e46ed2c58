//! Session deadline watchdog.

use crate::CancellationToken;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// A background task that cancels a token once a duration has passed.
///
/// The task is aborted when the timer is dropped, so a session that ends
/// early never waits on it.
pub struct DeadlineTimer {
    handle: Option<JoinHandle<()>>,
    expired: CancellationToken,
}

impl DeadlineTimer {
    /// Starts the watchdog. With `None` no task is spawned and the token
    /// never fires.
    pub fn start(deadline: Option<Duration>) -> Self {
        let expired = CancellationToken::new();
        let handle = deadline.filter(|d| !d.is_zero()).map(|deadline| {
            let flag = expired.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                debug!(deadline_ms = deadline.as_millis() as u64, "Deadline reached");
                flag.cancel();
            })
        });

        Self { handle, expired }
    }

    /// Whether the deadline has passed.
    pub fn expired(&self) -> bool {
        self.expired.is_cancelled()
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
