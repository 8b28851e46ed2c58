//! ICMP echo probing.

mod checksum;
mod driver;
mod packet;

pub use checksum::checksum;
pub use driver::IcmpDriver;
pub use packet::{build_echo_request, ECHO_IDENTIFIER, FILLER_BYTE, ICMP_ECHO_REQUEST};
