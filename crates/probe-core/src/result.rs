//! Result types for JSON output.

use crate::execution::{EchoOutcome, SweepOutcome};
use crate::stats::Summary;
use crate::{Hop, ProbeResult};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// The probed destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultDestination {
    /// Hostname as given on the command line.
    pub hostname: String,
    /// Resolved IPv4 address.
    pub ip_address: Ipv4Addr,
}

/// A single echo reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyReport {
    pub sequence: u32,
    pub responder: Ipv4Addr,
    pub ttl: u8,
    /// Reply size in bytes, excluding the IP header.
    pub size: u16,
    /// Round-trip time in milliseconds.
    pub rtt: f64,
}

impl ReplyReport {
    /// Builds a report entry from an answered probe.
    pub fn from_result(result: &ProbeResult) -> Option<Self> {
        let reply = result.reply?;
        Some(Self {
            sequence: result.sequence,
            responder: reply.responder,
            ttl: reply.ttl,
            size: reply.size,
            rtt: result.rtt_ms()?,
        })
    }
}

/// Complete ping results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EchoReport {
    pub destination: ResultDestination,
    /// Payload bytes per request.
    pub payload_size: usize,
    pub replies: Vec<ReplyReport>,
    pub statistics: Summary,
    /// Session duration in milliseconds.
    pub elapsed: f64,
}

impl EchoReport {
    pub fn new(destination: ResultDestination, payload_size: usize, outcome: &EchoOutcome) -> Self {
        Self {
            destination,
            payload_size,
            replies: outcome
                .results
                .iter()
                .filter_map(ReplyReport::from_result)
                .collect(),
            statistics: outcome.summary(),
            elapsed: outcome.elapsed.as_secs_f64() * 1000.0,
        }
    }

    /// Serializes the results to JSON with indentation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A single hop of a traceroute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HopReport {
    pub ttl: u8,
    /// The address that responded (None if no probe was answered).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<Ipv4Addr>,
    /// Reverse DNS name of the responder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Per-probe round-trip times in milliseconds; null marks a loss.
    pub rtts: Vec<Option<f64>>,
    pub loss_percent: f64,
}

impl HopReport {
    pub fn new(hop: &Hop, hostname: Option<String>) -> Self {
        Self {
            ttl: hop.ttl,
            ip_address: hop.responder(),
            hostname,
            rtts: hop.probes.iter().map(|p| p.rtt_ms()).collect(),
            loss_percent: hop.loss_percent(),
        }
    }
}

/// Complete traceroute results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub destination: ResultDestination,
    pub max_ttl: u8,
    pub hops: Vec<HopReport>,
    /// Whether the destination answered.
    pub reached: bool,
}

impl SweepReport {
    pub fn new(destination: ResultDestination, max_ttl: u8, outcome: &SweepOutcome) -> Self {
        Self {
            destination,
            max_ttl,
            hops: outcome.hops.iter().map(|h| HopReport::new(h, None)).collect(),
            reached: outcome.reached,
        }
    }

    /// Serializes the results to JSON with indentation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::StopReason;
    use crate::{ProbeReply, ReplyKind};
    use std::time::Duration;

    fn destination() -> ResultDestination {
        ResultDestination {
            hostname: "example.com".to_string(),
            ip_address: Ipv4Addr::new(93, 184, 216, 34),
        }
    }

    fn reply(kind: ReplyKind) -> ProbeReply {
        ProbeReply {
            responder: Ipv4Addr::new(93, 184, 216, 34),
            ttl: 55,
            size: 64,
            sequence: 1,
            kind,
        }
    }

    #[test]
    fn test_echo_report_serialization() {
        let outcome = EchoOutcome {
            sent: 2,
            results: vec![
                ProbeResult::answered(1, Duration::from_millis(12), reply(ReplyKind::EchoReply)),
                ProbeResult::timed_out(2),
            ],
            elapsed: Duration::from_secs(2),
            stop: StopReason::CountReached,
        };

        let report = EchoReport::new(destination(), 56, &outcome);
        assert_eq!(report.replies.len(), 1);
        assert_eq!(report.statistics.transmitted, 2);
        assert_eq!(report.statistics.received, 1);

        let json = report.to_json().unwrap();
        assert!(json.contains("\"hostname\": \"example.com\""));
        assert!(json.contains("\"loss_percent\": 50.0"));
    }

    #[test]
    fn test_sweep_report_marks_losses() {
        let mut hop = Hop::new(1);
        hop.probes.push(ProbeResult::answered(
            1,
            Duration::from_millis(2),
            reply(ReplyKind::EchoReply),
        ));
        hop.probes.push(ProbeResult::timed_out(2));
        let outcome = SweepOutcome {
            hops: vec![hop],
            reached: true,
            interrupted: false,
        };

        let report = SweepReport::new(destination(), 30, &outcome);
        assert_eq!(report.hops[0].rtts, vec![Some(2.0), None]);
        assert_eq!(report.hops[0].loss_percent, 50.0);

        let json = report.to_json().unwrap();
        assert!(json.contains("\"reached\": true"));
        assert!(json.contains("null"));
    }
}
