//! Incremental TTL sweep.
//!
//! Probes one TTL at a time, a fixed number of probes per TTL, each probe
//! waiting for its reply before the next one is sent.

use crate::{CancellationToken, Hop, ProbeDriver, ProbeError, ProbeResult, SweepParams};
use std::net::Ipv4Addr;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Everything a hop sweep collected.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    /// Resolved hops, starting at TTL 1.
    pub hops: Vec<Hop>,
    /// Whether the destination answered.
    pub reached: bool,
    /// Whether the operator stopped the sweep early.
    pub interrupted: bool,
}

/// Sweeps TTLs from 1 up to `params.max_ttl` until `destination` responds.
///
/// Each hop is pushed to `hops_tx` once all of its probes are resolved.
/// `interrupt` is checked before every probe and between poll slices while
/// waiting; a hop cut short by it is not reported. A probe whose send fails
/// at the network level is recorded as lost.
pub async fn hop_sweep<D: ProbeDriver + ?Sized>(
    driver: &mut D,
    params: &SweepParams,
    destination: Ipv4Addr,
    interrupt: &CancellationToken,
    hops_tx: UnboundedSender<Hop>,
) -> Result<SweepOutcome, ProbeError> {
    params.validate()?;

    let mut hops = Vec::new();
    let mut sequence: u32 = 0;
    let mut reached = false;
    let mut interrupted = false;

    'ttl: for ttl in 1..=params.max_ttl {
        let mut hop = Hop::new(ttl);

        for _ in 0..params.probes_per_hop {
            if interrupt.is_cancelled() {
                interrupted = true;
                break 'ttl;
            }
            sequence = sequence.wrapping_add(1);
            match probe_once(driver, params, ttl, sequence, interrupt).await? {
                Some(result) => hop.probes.push(result),
                None => {
                    interrupted = true;
                    break 'ttl;
                }
            }
        }

        let responder = hop.responder();
        debug!(
            ttl,
            responder = ?responder,
            lost = hop.lost(),
            "Hop resolved"
        );
        let _ = hops_tx.send(hop.clone());
        hops.push(hop);

        if responder == Some(destination) {
            debug!("Reached destination, stopping");
            reached = true;
            break;
        }
    }

    Ok(SweepOutcome {
        hops,
        reached,
        interrupted,
    })
}

/// Sends one probe at `ttl` and waits up to the probe timeout for any hop
/// response. Returns `None` if `interrupt` fires while waiting.
async fn probe_once<D: ProbeDriver + ?Sized>(
    driver: &mut D,
    params: &SweepParams,
    ttl: u8,
    sequence: u32,
    interrupt: &CancellationToken,
) -> Result<Option<ProbeResult>, ProbeError> {
    let send_time = Instant::now();
    let deadline = send_time + params.probe_timeout;

    trace!(ttl, sequence, "Sending probe");
    if let Err(e) = driver.send_probe(sequence, Some(ttl)).await {
        if !e.is_probe_lost() {
            return Err(e);
        }
        warn!(ttl, sequence, error = %e, "Failed to send probe, counting it as lost");
        return Ok(Some(ProbeResult::timed_out(sequence)));
    }

    loop {
        if interrupt.is_cancelled() {
            debug!(ttl, sequence, "Interrupted while waiting for response");
            return Ok(None);
        }
        let now = Instant::now();
        if now >= deadline {
            trace!(ttl, sequence, "Timeout waiting for response");
            return Ok(Some(ProbeResult::timed_out(sequence)));
        }
        let slice = params.poll_frequency.min(deadline - now);

        match driver.receive_probe(slice).await {
            Ok(Some(reply)) => {
                let rtt = send_time.elapsed();
                trace!(
                    ttl,
                    responder = %reply.responder,
                    kind = ?reply.kind,
                    rtt_ms = rtt.as_secs_f64() * 1000.0,
                    "Received probe response"
                );
                return Ok(Some(ProbeResult::answered(sequence, rtt, reply)));
            }
            Ok(None) => continue,
            Err(e) if e.is_retryable() => {
                trace!(error = %e, "Retryable error, continuing");
                continue;
            }
            Err(e) if e.is_probe_lost() => {
                warn!(ttl, error = %e, "Receive failed");
                tokio::time::sleep(slice).await;
            }
            Err(e) => {
                debug!(ttl, error = %e, "Fatal error during receive");
                return Err(e);
            }
        }
    }
}
