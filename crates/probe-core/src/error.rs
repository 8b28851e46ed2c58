//! Error types for probe operations.

use thiserror::Error;

/// Main error type for the probe engine and the tools built on it.
#[derive(Error, Debug)]
pub enum ProbeError {
    // Socket/IO errors
    #[error("Failed to create socket: {0}")]
    SocketCreation(#[source] std::io::Error),

    #[error("Operation not permitted: raw ICMP sockets require root or CAP_NET_RAW ({0})")]
    PermissionDenied(#[source] std::io::Error),

    #[error("Failed to set TTL {ttl}: {source}")]
    SetTtl {
        ttl: u8,
        #[source]
        source: std::io::Error,
    },

    #[error("Read timeout exceeded")]
    ReadTimeout,

    #[error("Write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Read failed: {0}")]
    ReadFailed(#[source] std::io::Error),

    // Packet errors
    #[error("Packet too short: expected at least {expected} bytes, got {actual}")]
    PacketTooShort { expected: usize, actual: usize },

    #[error("Failed to parse {layer} layer: {reason}")]
    PacketParseFailed { layer: &'static str, reason: String },

    #[error("Packet did not match any outstanding probe")]
    PacketMismatch,

    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    // Resolution errors
    #[error("unknown host {hostname}")]
    HostNotFound { hostname: String, reason: String },

    #[error("{hostname} has no IPv4 address")]
    NoIpv4Address { hostname: String },

    // Configuration errors
    #[error("bad number of packets to transmit: {0}")]
    InvalidCount(i64),

    #[error("bad timing interval {0}: interval must be a positive number of seconds")]
    InvalidInterval(f64),

    #[error("illegal negative packet size {0}")]
    NegativePacketSize(i64),

    #[error("packet size {size} is too large, maximum is {max}")]
    PacketTooLarge { size: usize, max: usize },

    #[error("bad wait time {0}")]
    InvalidDeadline(f64),

    #[error("bad number of probes per hop {0}: no more than 10 probes per hop")]
    InvalidProbesPerHop(i64),

    #[error("invalid max TTL {0}: must be between 1 and 255")]
    InvalidMaxTtl(u8),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProbeError {
    /// Returns true if this error only means "nothing usable arrived yet".
    ///
    /// Raw ICMP sockets see every ICMP datagram addressed to the host, so a
    /// receive loop routinely reads packets that belong to someone else.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ReadTimeout
                | Self::PacketMismatch
                | Self::MalformedPacket(_)
                | Self::PacketParseFailed { .. }
                | Self::PacketTooShort { .. }
        )
    }

    /// Returns true for network errors that cost a single probe.
    ///
    /// A failed send or a pending socket error (unreachable network, full
    /// buffers) is recorded as a loss and the loop goes on.
    pub fn is_probe_lost(&self) -> bool {
        matches!(self, Self::WriteFailed(_) | Self::ReadFailed(_))
    }

    /// Returns true for errors raised while validating options.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidCount(_)
                | Self::InvalidInterval(_)
                | Self::NegativePacketSize(_)
                | Self::PacketTooLarge { .. }
                | Self::InvalidDeadline(_)
                | Self::InvalidProbesPerHop(_)
                | Self::InvalidMaxTtl(_)
        )
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => ProbeError::ReadTimeout,
            std::io::ErrorKind::WouldBlock => ProbeError::ReadTimeout,
            _ => ProbeError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ProbeError::ReadTimeout.is_retryable());
        assert!(ProbeError::PacketMismatch.is_retryable());
        assert!(ProbeError::MalformedPacket("test".into()).is_retryable());
        assert!(ProbeError::PacketParseFailed {
            layer: "IPv4",
            reason: "test".into()
        }
        .is_retryable());
        assert!(ProbeError::PacketTooShort {
            expected: 28,
            actual: 10
        }
        .is_retryable());
        assert!(!ProbeError::PermissionDenied(std::io::ErrorKind::PermissionDenied.into())
            .is_retryable());
        assert!(!ProbeError::Internal("boom".into()).is_retryable());
    }

    #[test]
    fn test_network_failures_lose_one_probe() {
        let unreachable = || std::io::Error::from_raw_os_error(101);
        assert!(ProbeError::WriteFailed(unreachable()).is_probe_lost());
        assert!(ProbeError::ReadFailed(unreachable()).is_probe_lost());
        assert!(!ProbeError::WriteFailed(unreachable()).is_retryable());
        assert!(!ProbeError::Internal("boom".into()).is_probe_lost());
        assert!(!ProbeError::SocketCreation(unreachable()).is_probe_lost());
    }

    #[test]
    fn test_configuration_errors() {
        assert!(ProbeError::InvalidInterval(0.0).is_configuration());
        assert!(ProbeError::NegativePacketSize(-1).is_configuration());
        assert!(ProbeError::InvalidProbesPerHop(11).is_configuration());
        assert!(!ProbeError::ReadTimeout.is_configuration());
    }

    #[test]
    fn test_io_error_conversion() {
        let timed_out: ProbeError = std::io::Error::from(std::io::ErrorKind::TimedOut).into();
        assert!(matches!(timed_out, ProbeError::ReadTimeout));

        let would_block: ProbeError = std::io::Error::from(std::io::ErrorKind::WouldBlock).into();
        assert!(matches!(would_block, ProbeError::ReadTimeout));

        let other: ProbeError = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert!(matches!(other, ProbeError::Internal(_)));
    }
}
