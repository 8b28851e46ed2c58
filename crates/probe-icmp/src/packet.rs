//! ICMP echo request construction.

use crate::checksum::checksum;
use probe_core::ICMP_HEADER_LEN;

/// ICMP type of an echo request.
pub const ICMP_ECHO_REQUEST: u8 = 8;

/// Identifier carried by every request.
pub const ECHO_IDENTIFIER: u16 = 0;

/// Byte used to fill the payload.
pub const FILLER_BYTE: u8 = 0x01;

/// Builds an echo request with `payload_size` filler bytes.
///
/// The sequence number is written modulo 65536. The result is exactly
/// `8 + payload_size` bytes with the checksum already filled in.
pub fn build_echo_request(payload_size: usize, sequence: u32) -> Vec<u8> {
    let mut packet = vec![FILLER_BYTE; ICMP_HEADER_LEN + payload_size];

    packet[0] = ICMP_ECHO_REQUEST;
    packet[1] = 0;
    packet[2..4].copy_from_slice(&[0, 0]);
    packet[4..6].copy_from_slice(&ECHO_IDENTIFIER.to_be_bytes());
    packet[6..8].copy_from_slice(&(sequence as u16).to_be_bytes());

    let sum = checksum(&packet);
    packet[2..4].copy_from_slice(&sum.to_be_bytes());
    packet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let packet = build_echo_request(56, 7);

        assert_eq!(packet.len(), 64);
        assert_eq!(packet[0], 8);
        assert_eq!(packet[1], 0);
        assert_eq!(u16::from_be_bytes([packet[4], packet[5]]), ECHO_IDENTIFIER);
        assert_eq!(u16::from_be_bytes([packet[6], packet[7]]), 7);
        assert!(packet[8..].iter().all(|&b| b == FILLER_BYTE));
    }

    #[test]
    fn test_length_and_sequence_for_many_sizes() {
        for (size, sequence) in [(0usize, 0u32), (1, 1), (31, 300), (32, 65535), (1472, 65536), (57, 70000)] {
            let packet = build_echo_request(size, sequence);
            assert_eq!(packet.len(), 8 + size);
            assert_eq!(packet[0], ICMP_ECHO_REQUEST);
            assert_eq!(
                u16::from_be_bytes([packet[6], packet[7]]) as u32,
                sequence % 65536
            );
        }
    }

    #[test]
    fn test_checksum_verifies() {
        for size in [0, 32, 56, 100] {
            let packet = build_echo_request(size, 12);
            assert_eq!(checksum(&packet), 0);
        }
    }

    #[test]
    fn test_odd_payload_checksum_matches_padded_sum() {
        let packet = build_echo_request(3, 1);
        let stored = u16::from_be_bytes([packet[2], packet[3]]);

        let mut zeroed = packet.clone();
        zeroed[2..4].copy_from_slice(&[0, 0]);
        assert_eq!(checksum(&zeroed), stored);
    }
}
