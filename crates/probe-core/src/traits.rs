//! Core trait for probe driver implementations.

use crate::{ProbeError, ProbeReply};
use async_trait::async_trait;
use std::time::Duration;

/// Sends probes towards one destination and reports what comes back.
///
/// The echo session and the hop sweep only talk to this trait, which keeps
/// packet layout and socket handling out of the control loops.
#[async_trait]
pub trait ProbeDriver: Send {
    /// Sends one echo request carrying `sequence`.
    ///
    /// When `ttl` is given the outbound TTL is set before sending.
    async fn send_probe(&mut self, sequence: u32, ttl: Option<u8>) -> Result<(), ProbeError>;

    /// Waits up to `timeout` for the next reply.
    ///
    /// Returns `Ok(None)` if nothing arrived in time. Datagrams that are not
    /// probe replies surface as retryable errors.
    async fn receive_probe(&mut self, timeout: Duration)
        -> Result<Option<ProbeReply>, ProbeError>;

    /// Closes the driver, releasing the socket.
    async fn close(&mut self) -> Result<(), ProbeError>;
}
