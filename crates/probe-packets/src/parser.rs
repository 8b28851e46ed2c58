//! Inbound datagram parsing.
//!
//! A raw ICMP socket hands back whole IPv4 datagrams. The fields the tools
//! report live at fixed offsets: total length at bytes 2-3 and TTL at byte 8
//! of the IP header, and the ICMP sequence at bytes 26-27 (offset 6-7 of the
//! ICMP message behind a 20-byte IP header).

use etherparse::{IpNumber, Ipv4HeaderSlice};
use probe_core::{ProbeError, ReplyKind, IPV4_HEADER_LEN};

/// Offset of the ICMP sequence field in a datagram without IP options.
const ICMP_SEQUENCE_OFFSET: usize = IPV4_HEADER_LEN + 6;

/// Fields read from the IP header of an inbound datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpHeaderFields {
    pub total_length: u16,
    pub ttl: u8,
}

impl IpHeaderFields {
    /// Size reported to the user: total length minus the IP header.
    pub fn reply_size(&self) -> u16 {
        self.total_length.saturating_sub(IPV4_HEADER_LEN as u16)
    }
}

/// Reads total length and TTL from an IPv4 header.
pub fn extract_ip_header_fields(datagram: &[u8]) -> Result<IpHeaderFields, ProbeError> {
    if datagram.len() < IPV4_HEADER_LEN {
        return Err(ProbeError::PacketTooShort {
            expected: IPV4_HEADER_LEN,
            actual: datagram.len(),
        });
    }

    Ok(IpHeaderFields {
        total_length: u16::from_be_bytes([datagram[2], datagram[3]]),
        ttl: datagram[8],
    })
}

/// Reads the ICMP sequence number of a datagram with a 20-byte IP header.
pub fn extract_icmp_sequence(datagram: &[u8]) -> Result<u16, ProbeError> {
    let needed = ICMP_SEQUENCE_OFFSET + 2;
    if datagram.len() < needed {
        return Err(ProbeError::PacketTooShort {
            expected: needed,
            actual: datagram.len(),
        });
    }

    Ok(u16::from_be_bytes([
        datagram[ICMP_SEQUENCE_OFFSET],
        datagram[ICMP_SEQUENCE_OFFSET + 1],
    ]))
}

/// An inbound ICMP datagram reduced to what the probe loops need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDatagram {
    pub header: IpHeaderFields,
    pub icmp_type: u8,
    pub icmp_code: u8,
    pub sequence: u16,
}

impl ParsedDatagram {
    /// The probe reply kind, if this ICMP type answers a probe.
    pub fn reply_kind(&self) -> Option<ReplyKind> {
        ReplyKind::from_icmp_type(self.icmp_type)
    }
}

/// Validates an IPv4/ICMP datagram and extracts its fields.
///
/// Datagrams that are not ICMP or that carry IP options are rejected, since
/// the fixed offsets above only hold for a bare 20-byte header.
pub fn parse_datagram(datagram: &[u8]) -> Result<ParsedDatagram, ProbeError> {
    let ip = Ipv4HeaderSlice::from_slice(datagram).map_err(|e| {
        ProbeError::PacketParseFailed {
            layer: "IPv4",
            reason: e.to_string(),
        }
    })?;

    if ip.protocol() != IpNumber::ICMP {
        return Err(ProbeError::PacketMismatch);
    }
    if ip.slice().len() != IPV4_HEADER_LEN {
        return Err(ProbeError::MalformedPacket(format!(
            "unexpected IPv4 header length {}",
            ip.slice().len()
        )));
    }

    let header = extract_ip_header_fields(datagram)?;
    let sequence = extract_icmp_sequence(datagram)?;

    Ok(ParsedDatagram {
        header,
        icmp_type: datagram[IPV4_HEADER_LEN],
        icmp_code: datagram[IPV4_HEADER_LEN + 1],
        sequence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// An echo reply from 8.8.4.4 with TTL 117, sequence 0x0102 and 56 bytes
    /// of payload.
    fn echo_reply() -> Vec<u8> {
        let total_len: u16 = 20 + 8 + 56;
        let mut datagram = vec![0u8; total_len as usize];
        datagram[0] = 0x45;
        datagram[2..4].copy_from_slice(&total_len.to_be_bytes());
        datagram[8] = 117;
        datagram[9] = 1;
        datagram[12..16].copy_from_slice(&[8, 8, 4, 4]);
        datagram[16..20].copy_from_slice(&[192, 168, 1, 10]);
        datagram[20] = 0;
        datagram[26] = 0x01;
        datagram[27] = 0x02;
        datagram
    }

    #[test]
    fn test_extract_ip_header_fields() {
        let fields = extract_ip_header_fields(&echo_reply()).unwrap();
        assert_eq!(fields.total_length, 84);
        assert_eq!(fields.ttl, 117);
        assert_eq!(fields.reply_size(), 64);
    }

    #[test]
    fn test_extract_icmp_sequence() {
        assert_eq!(extract_icmp_sequence(&echo_reply()).unwrap(), 0x0102);
    }

    #[test]
    fn test_short_datagrams() {
        assert!(matches!(
            extract_ip_header_fields(&[0x45; 10]),
            Err(ProbeError::PacketTooShort {
                expected: 20,
                actual: 10
            })
        ));
        assert!(matches!(
            extract_icmp_sequence(&echo_reply()[..27]),
            Err(ProbeError::PacketTooShort { expected: 28, .. })
        ));
    }

    #[test]
    fn test_parse_echo_reply() {
        let parsed = parse_datagram(&echo_reply()).unwrap();
        assert_eq!(parsed.icmp_type, 0);
        assert_eq!(parsed.sequence, 0x0102);
        assert_eq!(parsed.reply_kind(), Some(ReplyKind::EchoReply));
    }

    #[test]
    fn test_parse_rejects_non_icmp() {
        let mut datagram = echo_reply();
        datagram[9] = 17;
        assert!(matches!(
            parse_datagram(&datagram),
            Err(ProbeError::PacketMismatch)
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_datagram(&[0x60, 0, 0]).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_echo_request_has_no_reply_kind() {
        let mut datagram = echo_reply();
        datagram[20] = 8;
        let parsed = parse_datagram(&datagram).unwrap();
        assert_eq!(parsed.reply_kind(), None);
    }
}
