//! Console report lines.

use probe_core::{Hop, ProbeReply, Summary, ICMP_HEADER_LEN, IPV4_HEADER_LEN};
use std::fmt::Write;
use std::net::Ipv4Addr;
use std::time::Duration;

/// `PING host (ip) S(S+28) bytes of data.`
pub fn ping_header(hostname: &str, ip: Ipv4Addr, payload_size: usize) -> String {
    format!(
        "PING {} ({}) {}({}) bytes of data.",
        hostname,
        ip,
        payload_size,
        payload_size + IPV4_HEADER_LEN + ICMP_HEADER_LEN
    )
}

/// One line per echo reply.
pub fn reply_line(reply: &ProbeReply, name: &str, rtt: Duration) -> String {
    format!(
        "{} bytes from {} ({}): icmp_seq={} ttl={} time={:.1} ms",
        reply.size,
        name,
        reply.responder,
        reply.sequence,
        reply.ttl,
        rtt.as_secs_f64() * 1000.0
    )
}

/// Statistics block printed when the echo session ends.
///
/// The rtt line is only present when at least one reply arrived.
pub fn ping_statistics(hostname: &str, summary: &Summary, elapsed: Duration) -> Vec<String> {
    let mut lines = vec![
        format!("--- {} ping statistics ---", hostname),
        format!(
            "{} packets transmitted, {} received, {:.1}% packet loss, time {:.0}ms",
            summary.transmitted,
            summary.received,
            summary.loss_percent,
            elapsed.as_secs_f64() * 1000.0
        ),
    ];

    if let Some(rtt) = &summary.rtt {
        lines.push(format!(
            "rtt min/avg/max/mdev = {:.3}/{:.3}/{:.3}/{:.3} ms",
            rtt.min, rtt.avg, rtt.max, rtt.stddev
        ));
    }
    lines
}

/// `traceroute to host (ip), N hops max, M byte packets`
pub fn traceroute_header(hostname: &str, ip: Ipv4Addr, max_ttl: u8, packet_size: usize) -> String {
    format!(
        "traceroute to {} ({}), {} hops max, {} byte packets",
        hostname, ip, max_ttl, packet_size
    )
}

/// Formats a finished hop.
///
/// `name` is the responder's symbolic name; pass `None` for numeric output.
pub fn hop_line(hop: &Hop, name: Option<&str>, loss_summary: bool) -> String {
    let mut out = format!("{:>2}  ", hop.ttl);

    match (hop.responder(), name) {
        (None, _) => {}
        (Some(ip), Some(name)) => {
            let _ = write!(out, "{} ({})  ", name, ip);
        }
        (Some(ip), None) => {
            let _ = write!(out, "{}  ", ip);
        }
    }

    for probe in &hop.probes {
        match probe.rtt_ms() {
            Some(ms) => {
                let _ = write!(out, "{:.3} ms  ", ms);
            }
            None => out.push_str("* "),
        }
    }

    let mut line = out.trim_end().to_string();
    if loss_summary {
        let _ = write!(line, " ({:.0}% loss)", hop.loss_percent());
    }
    line
}
