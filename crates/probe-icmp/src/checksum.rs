//! Internet checksum (RFC 1071).

/// Computes the 16-bit one's-complement checksum of `buf`.
///
/// The buffer is summed as big-endian 16-bit words, an odd trailing byte
/// being padded with a zero low byte. Carries are folded back into the low
/// 16 bits until none remain, and the complement of the result is returned.
pub fn checksum(buf: &[u8]) -> u16 {
    // A u64 cannot overflow for any buffer that fits in memory.
    let mut sum: u64 = 0;
    let mut chunks = buf.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u16::from_be_bytes([chunk[0], chunk[1]]) as u64;
    }
    if let [last] = chunks.remainder() {
        sum += (*last as u64) << 8;
    }

    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}
