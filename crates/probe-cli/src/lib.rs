//! Shared plumbing for the `ping` and `traceroute` binaries.

pub mod exit;
pub mod interrupt;
pub mod logging;
pub mod ping;
pub mod report;
pub mod resolve;
pub mod traceroute;
