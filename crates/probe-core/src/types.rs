//! Core types for probe operations.

use crate::ProbeError;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Size of an IPv4 header without options.
pub const IPV4_HEADER_LEN: usize = 20;

/// Size of an ICMP echo header.
pub const ICMP_HEADER_LEN: usize = 8;

/// Largest echo payload that fits in a single IPv4 datagram.
pub const MAX_PAYLOAD_SIZE: usize = 65535 - IPV4_HEADER_LEN - ICMP_HEADER_LEN;

/// Hard ceiling on the number of probes per hop.
pub const MAX_PROBES_PER_HOP: u8 = 10;

/// The kind of ICMP message a probe elicited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// Echo reply (type 0): the destination answered.
    EchoReply,
    /// Destination unreachable (type 3).
    DestinationUnreachable,
    /// Time exceeded (type 11): a router dropped the probe when its TTL ran out.
    TimeExceeded,
}

impl ReplyKind {
    /// Maps an ICMP type onto a reply kind. Other types are not probe replies.
    pub fn from_icmp_type(icmp_type: u8) -> Option<Self> {
        match icmp_type {
            0 => Some(ReplyKind::EchoReply),
            3 => Some(ReplyKind::DestinationUnreachable),
            11 => Some(ReplyKind::TimeExceeded),
            _ => None,
        }
    }
}

/// A datagram received in answer to a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReply {
    /// Address of the host that sent the datagram.
    pub responder: Ipv4Addr,
    /// TTL field of the reply's IP header.
    pub ttl: u8,
    /// Reply size as reported to the user: IP total length minus the IP header.
    pub size: u16,
    /// ICMP sequence field of the reply.
    pub sequence: u16,
    pub kind: ReplyKind,
}

impl ProbeReply {
    /// Whether this is the echo reply for the probe with `sequence`.
    pub fn answers_echo(&self, sequence: u32) -> bool {
        self.kind == ReplyKind::EchoReply && self.sequence == sequence as u16
    }
}

/// Outcome of a single probe: a reply with its round-trip time, or a loss.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeResult {
    /// Logical sequence number of the probe (the wire value wraps at 65536).
    pub sequence: u32,
    /// Round-trip time, absent when the probe timed out.
    pub rtt: Option<Duration>,
    /// The reply, absent when the probe timed out.
    pub reply: Option<ProbeReply>,
}

impl ProbeResult {
    pub fn answered(sequence: u32, rtt: Duration, reply: ProbeReply) -> Self {
        Self {
            sequence,
            rtt: Some(rtt),
            reply: Some(reply),
        }
    }

    pub fn timed_out(sequence: u32) -> Self {
        Self {
            sequence,
            rtt: None,
            reply: None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.rtt.is_none()
    }

    /// Round-trip time in milliseconds.
    pub fn rtt_ms(&self) -> Option<f64> {
        self.rtt.map(convert_duration_to_ms)
    }
}

/// One TTL step of a hop sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct Hop {
    /// The TTL used for every probe of this hop.
    pub ttl: u8,
    /// One entry per probe, in send order.
    pub probes: Vec<ProbeResult>,
}

impl Hop {
    pub fn new(ttl: u8) -> Self {
        Self {
            ttl,
            probes: Vec::new(),
        }
    }

    /// The responder observed for this hop: the last probe that got a reply.
    pub fn responder(&self) -> Option<Ipv4Addr> {
        self.probes
            .iter()
            .rev()
            .find_map(|p| p.reply.map(|r| r.responder))
    }

    pub fn lost(&self) -> usize {
        self.probes.iter().filter(|p| p.is_timeout()).count()
    }

    /// Percentage of this hop's probes that timed out.
    pub fn loss_percent(&self) -> f64 {
        if self.probes.is_empty() {
            return 0.0;
        }
        100.0 * self.lost() as f64 / self.probes.len() as f64
    }
}

/// Parameters for an echo session.
#[derive(Debug, Clone)]
pub struct EchoParams {
    /// Number of probes to send; 0 means unbounded.
    pub count: u32,
    /// Time between consecutive probes, which is also each probe's wait window.
    pub interval: Duration,
    /// Wall-clock limit for the whole session; `None` means unbounded.
    pub deadline: Option<Duration>,
    /// Longest single receive wait, bounding how late a stop request is seen.
    pub poll_frequency: Duration,
}

impl Default for EchoParams {
    fn default() -> Self {
        Self {
            count: 0,
            interval: Duration::from_secs(1),
            deadline: None,
            poll_frequency: Duration::from_millis(100),
        }
    }
}

impl EchoParams {
    /// Validates the parameters.
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.interval.is_zero() {
            return Err(ProbeError::InvalidInterval(0.0));
        }
        if self.poll_frequency.is_zero() {
            return Err(ProbeError::Internal(
                "poll frequency must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `sent` probes exhaust the configured count.
    pub fn count_reached(&self, sent: u32) -> bool {
        self.count != 0 && sent >= self.count
    }
}

/// Parameters for a hop sweep.
#[derive(Debug, Clone)]
pub struct SweepParams {
    /// Highest TTL to probe.
    pub max_ttl: u8,
    /// Probes sent for every TTL.
    pub probes_per_hop: u8,
    /// How long each probe waits for a reply.
    pub probe_timeout: Duration,
    /// Longest single receive wait, bounding how late an interrupt is seen.
    pub poll_frequency: Duration,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            max_ttl: 30,
            probes_per_hop: 3,
            probe_timeout: Duration::from_secs(1),
            poll_frequency: Duration::from_millis(100),
        }
    }
}

impl SweepParams {
    /// Validates the parameters.
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.probes_per_hop == 0 || self.probes_per_hop > MAX_PROBES_PER_HOP {
            return Err(ProbeError::InvalidProbesPerHop(self.probes_per_hop as i64));
        }
        if self.max_ttl == 0 {
            return Err(ProbeError::InvalidMaxTtl(self.max_ttl));
        }
        if self.poll_frequency.is_zero() {
            return Err(ProbeError::Internal(
                "poll frequency must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// High-level ping configuration.
#[derive(Debug, Clone)]
pub struct EchoConfig {
    /// Target hostname or IPv4 address.
    pub hostname: String,
    /// Bytes of filler carried by each echo request.
    pub payload_size: usize,
    pub params: EchoParams,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            payload_size: 56,
            params: EchoParams::default(),
        }
    }
}

impl EchoConfig {
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.payload_size > MAX_PAYLOAD_SIZE {
            return Err(ProbeError::PacketTooLarge {
                size: self.payload_size,
                max: MAX_PAYLOAD_SIZE,
            });
        }
        self.params.validate()
    }
}

/// High-level traceroute configuration.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Target hostname or IPv4 address.
    pub hostname: String,
    /// Print hop addresses without reverse resolution.
    pub numeric: bool,
    /// Append each hop's loss percentage.
    pub loss_summary: bool,
    /// Bytes of filler carried by each probe.
    pub payload_size: usize,
    pub params: SweepParams,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            numeric: false,
            loss_summary: false,
            payload_size: 32,
            params: SweepParams::default(),
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<(), ProbeError> {
        self.params.validate()
    }

    /// On-wire size of one probe including the IP header.
    pub fn packet_size(&self) -> usize {
        IPV4_HEADER_LEN + ICMP_HEADER_LEN + self.payload_size
    }
}

pub fn convert_duration_to_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
