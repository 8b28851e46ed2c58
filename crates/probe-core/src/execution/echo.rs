//! Continuous echo probing.
//!
//! Sends one probe per interval and waits out the interval for its reply,
//! polling in short slices so that a deadline or an interrupt is noticed
//! well before the interval ends.

use super::deadline::DeadlineTimer;
use crate::stats::{summarize, Summary};
use crate::{CancellationToken, EchoParams, ProbeDriver, ProbeError, ProbeResult};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Why an echo session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured number of probes was sent.
    CountReached,
    /// The deadline timer fired.
    Deadline,
    /// The operator interrupted the session.
    Interrupted,
}

/// Everything an echo session collected.
#[derive(Debug, Clone)]
pub struct EchoOutcome {
    /// Number of probes sent.
    pub sent: u32,
    /// One entry per probe sent, in order.
    pub results: Vec<ProbeResult>,
    /// Wall-clock time from session start to stop.
    pub elapsed: Duration,
    pub stop: StopReason,
}

impl EchoOutcome {
    /// Round-trip times of the answered probes, in milliseconds.
    pub fn rtts_ms(&self) -> Vec<f64> {
        self.results.iter().filter_map(|r| r.rtt_ms()).collect()
    }

    pub fn summary(&self) -> Summary {
        summarize(self.sent, &self.rtts_ms())
    }
}

/// Runs an echo session until the count is reached, the deadline passes or
/// `interrupt` is cancelled.
///
/// Every answered probe is also pushed to `replies` as soon as it arrives.
/// A send or receive that fails at the network level costs only the probe
/// in flight; the session carries on.
/// Round-trip times are measured from the start of each probe's wait window,
/// which begins right after the request is handed to the driver.
pub async fn echo_session<D: ProbeDriver + ?Sized>(
    driver: &mut D,
    params: &EchoParams,
    interrupt: &CancellationToken,
    replies: UnboundedSender<ProbeResult>,
) -> Result<EchoOutcome, ProbeError> {
    params.validate()?;

    let timer = DeadlineTimer::start(params.deadline);
    let started = Instant::now();
    let mut sent: u32 = 0;
    let mut results = Vec::new();

    let stop = loop {
        if let Some(reason) = stop_requested(&timer, interrupt) {
            break reason;
        }
        if params.count_reached(sent) {
            break StopReason::CountReached;
        }

        sent += 1;
        let sequence = sent;
        trace!(sequence, "Sending echo probe");
        let delivered = match driver.send_probe(sequence, None).await {
            Ok(()) => true,
            Err(e) if e.is_probe_lost() => {
                warn!(sequence, error = %e, "Failed to send echo probe, counting it as lost");
                false
            }
            Err(e) => return Err(e),
        };

        // The window is waited out either way to keep the send rate.
        let mut result = wait_for_reply(driver, params, sequence, &timer, interrupt).await?;
        if !delivered {
            result = ProbeResult::timed_out(sequence);
        }
        if !result.is_timeout() {
            let _ = replies.send(result);
        }
        results.push(result);
    };

    let elapsed = started.elapsed();
    debug!(
        sent,
        received = results.iter().filter(|r| !r.is_timeout()).count(),
        elapsed_ms = elapsed.as_millis() as u64,
        stop = ?stop,
        "Echo session stopped"
    );

    Ok(EchoOutcome {
        sent,
        results,
        elapsed,
        stop,
    })
}

fn stop_requested(timer: &DeadlineTimer, interrupt: &CancellationToken) -> Option<StopReason> {
    if interrupt.is_cancelled() {
        Some(StopReason::Interrupted)
    } else if timer.expired() {
        Some(StopReason::Deadline)
    } else {
        None
    }
}

/// Polls for the reply to `sequence` until the interval elapses or a stop is
/// requested. Only the first matching reply counts; the rest of the window
/// is still waited out.
async fn wait_for_reply<D: ProbeDriver + ?Sized>(
    driver: &mut D,
    params: &EchoParams,
    sequence: u32,
    timer: &DeadlineTimer,
    interrupt: &CancellationToken,
) -> Result<ProbeResult, ProbeError> {
    let window_start = Instant::now();
    let mut result = ProbeResult::timed_out(sequence);

    loop {
        let elapsed = window_start.elapsed();
        if elapsed >= params.interval || stop_requested(timer, interrupt).is_some() {
            break;
        }
        let slice = params.poll_frequency.min(params.interval - elapsed);

        match driver.receive_probe(slice).await {
            Ok(Some(reply)) if result.is_timeout() && reply.answers_echo(sequence) => {
                let rtt = window_start.elapsed();
                debug!(
                    sequence,
                    responder = %reply.responder,
                    rtt_ms = rtt.as_secs_f64() * 1000.0,
                    "Received echo reply"
                );
                result = ProbeResult::answered(sequence, rtt, reply);
            }
            Ok(Some(reply)) => {
                trace!(
                    sequence,
                    reply_sequence = reply.sequence,
                    kind = ?reply.kind,
                    "Ignored reply outside the current probe"
                );
            }
            Ok(None) => continue,
            Err(e) if e.is_retryable() => {
                trace!(error = %e, "Retryable error, continuing");
                continue;
            }
            Err(e) if e.is_probe_lost() => {
                warn!(sequence, error = %e, "Receive failed");
                tokio::time::sleep(slice).await;
            }
            Err(e) => {
                debug!(sequence, error = %e, "Fatal error during receive");
                return Err(e);
            }
        }
    }

    Ok(result)
}
