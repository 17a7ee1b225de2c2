//! The Navien frame checksum.
//!
//! CRC-like but nonstandard: an 8-bit rolling register seeded with 0xFF is
//! shifted left once per input byte, folded with a seed value whenever the
//! shift carries out of the low byte, then XORed with the input byte. No
//! industry CRC parameterization matches it; the algorithm was reverse
//! engineered from NaviLink firmware and validated against captured RS-485
//! traces.

/// Compute the checksum over `data` with the given seed.
///
/// Status frames from the cascade primary (src 0x50) use
/// [`CHECKSUM_SEED_STATUS`]; everything else on the bus, control frames and
/// cascade units 1..=15 alike, uses [`CHECKSUM_SEED_CONTROL`]. The checksum
/// covers the header and payload; the result is the trailing frame byte.
///
/// [`CHECKSUM_SEED_STATUS`]: crate::constants::CHECKSUM_SEED_STATUS
/// [`CHECKSUM_SEED_CONTROL`]: crate::constants::CHECKSUM_SEED_CONTROL
pub fn checksum(data: &[u8], seed: u16) -> u8 {
    if data.len() < 2 {
        return 0x00;
    }

    let mut result: u16 = 0xFF;
    for &byte in data {
        result <<= 1;
        if result > 0xFF {
            result = (result & 0xFF) ^ seed;
        }
        // Only the low byte participates in the XOR.
        result = (result as u8 as u16) ^ (byte as u16);
    }
    result as u8
}
