//! Round-trip statistics.

use serde::{Deserialize, Serialize};

/// Min/avg/max/stddev of a set of round-trip times, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RttStats {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    /// Population standard deviation.
    pub stddev: f64,
}

/// Reduction of an echo session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub transmitted: u32,
    pub received: u32,
    pub loss_percent: f64,
    /// Absent when nothing was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtt: Option<RttStats>,
}

/// Reduces `sent` probes and the round-trip times of the answered ones.
///
/// With nothing sent the loss is reported as zero.
pub fn summarize(sent: u32, rtts_ms: &[f64]) -> Summary {
    let received = rtts_ms.len() as u32;
    let loss_percent = if sent == 0 {
        0.0
    } else {
        100.0 * (1.0 - received as f64 / sent as f64)
    };

    Summary {
        transmitted: sent,
        received,
        loss_percent,
        rtt: rtt_stats(rtts_ms),
    }
}

fn rtt_stats(samples: &[f64]) -> Option<RttStats> {
    if samples.is_empty() {
        return None;
    }

    let n = samples.len() as f64;
    let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let avg = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|s| (s - avg).powi(2)).sum::<f64>() / n;

    Some(RttStats {
        min,
        avg,
        max,
        stddev: variance.sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_full_reception() {
        let summary = summarize(4, &[10.0, 20.0, 30.0, 40.0]);
        assert_eq!(summary.transmitted, 4);
        assert_eq!(summary.received, 4);
        assert!(approx(summary.loss_percent, 0.0));

        let rtt = summary.rtt.unwrap();
        assert!(approx(rtt.min, 10.0));
        assert!(approx(rtt.max, 40.0));
        assert!(approx(rtt.avg, 25.0));
        assert!(approx(rtt.stddev, 125f64.sqrt()));
    }

    #[test]
    fn test_nothing_received() {
        let summary = summarize(4, &[]);
        assert_eq!(summary.received, 0);
        assert!(approx(summary.loss_percent, 100.0));
        assert!(summary.rtt.is_none());
    }

    #[test]
    fn test_partial_loss() {
        let summary = summarize(3, &[12.5]);
        assert!(approx(summary.loss_percent, 100.0 * (1.0 - 1.0 / 3.0)));
        let rtt = summary.rtt.unwrap();
        assert!(approx(rtt.stddev, 0.0));
        assert!(approx(rtt.min, rtt.max));
    }

    #[test]
    fn test_nothing_sent() {
        let summary = summarize(0, &[]);
        assert!(approx(summary.loss_percent, 0.0));
        assert!(summary.rtt.is_none());
    }

    #[test]
    fn test_summary_omits_rtt_when_empty() {
        let json = serde_json::to_string(&summarize(2, &[])).unwrap();
        assert!(!json.contains("rtt"));
        assert!(json.contains("\"loss_percent\":100.0"));
    }
}
