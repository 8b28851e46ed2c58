//! Ctrl-C handling.

use probe_core::CancellationToken;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Cancels `token` when the operator presses Ctrl-C.
///
/// Once installed, SIGINT no longer kills the process; the running loop
/// notices the token and winds down into its normal report.
pub fn watch_interrupt(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                debug!("Interrupted by operator");
                token.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    })
}
