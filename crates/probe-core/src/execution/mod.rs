//! Control loops that drive a [`ProbeDriver`](crate::ProbeDriver).
//!
//! - [`echo_session`]: repeated echo probes at a fixed interval, bounded by a
//!   count, a deadline or an interrupt.
//! - [`hop_sweep`]: increasing TTLs with several probes per hop until the
//!   destination answers.

pub mod deadline;
pub mod echo;
pub mod sweep;

pub use deadline::DeadlineTimer;
pub use echo::{echo_session, EchoOutcome, StopReason};
pub use sweep::{hop_sweep, SweepOutcome};
