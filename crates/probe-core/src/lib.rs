//! Core types, traits, and control loops for the ICMP probe tools.
//!
//! This crate provides the protocol-independent half of `ping` and
//! `traceroute`:
//!
//! - [`ProbeDriver`] trait implemented by the ICMP driver
//! - [`execution`] with the echo session and the hop sweep
//! - [`stats`] for round-trip reduction
//! - [`ProbeError`] for error handling
//! - [`result`] types for JSON output

pub mod cancel;
pub mod error;
pub mod execution;
pub mod result;
pub mod stats;
pub mod traits;
pub mod types;

pub use cancel::CancellationToken;
pub use error::ProbeError;
pub use result::{EchoReport, HopReport, ReplyReport, ResultDestination, SweepReport};
pub use stats::{summarize, RttStats, Summary};
pub use traits::ProbeDriver;
pub use types::{
    convert_duration_to_ms, EchoConfig, EchoParams, Hop, ProbeReply, ProbeResult, ReplyKind,
    SweepConfig, SweepParams, ICMP_HEADER_LEN, IPV4_HEADER_LEN, MAX_PAYLOAD_SIZE,
    MAX_PROBES_PER_HOP,
};
