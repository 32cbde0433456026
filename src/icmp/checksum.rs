//! Internet checksum (RFC 1071).

/// Compute the ones'-complement checksum of `data`.
///
/// Words are read little-endian, the same byte order the codec writes the
/// checksum field in. A trailing odd byte is added as a standalone low byte.
pub fn compute(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum += u16::from_le_bytes([word[0], word[1]]) as u32;
    }

    if let [last] = words.remainder() {
        sum += *last as u32;
    }

    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    !(sum as u16)
}

/// True when `data`, checksum field included as transmitted, sums to zero.
pub fn validate(data: &[u8]) -> bool {
    compute(data) == 0
}
