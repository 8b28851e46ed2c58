//! Packet I/O for the ICMP probe tools.
//!
//! Provides the raw IPv4 ICMP socket and extraction of the reply fields the
//! tools report.

pub mod parser;
pub mod socket;

pub use parser::{
    extract_icmp_sequence, extract_ip_header_fields, parse_datagram, IpHeaderFields,
    ParsedDatagram,
};
pub use socket::{PacketSocket, RawIcmpSocket};
