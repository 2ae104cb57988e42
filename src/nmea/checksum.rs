//! NMEA 0183 sentence checksum
//!
//! A sentence carries its own parity byte after a `*` delimiter:
//!
//! ```text
//! $GPGGA,092750.000,5321.6802,N,...,M,,*76
//! │└──────────── XOR of these bytes ───┘│└┴─ two hex digits
//! └ start delimiter ($ or !), excluded   └── checksum delimiter
//! ```
//!
//! Validation never fails loudly. Every malformed input (no `*`, `*` in
//! the first position, empty or oversized tail, non-hex digits) is simply
//! reported as an invalid sentence.

/// Checksum delimiter
pub const CHECKSUM_DELIMITER: u8 = b'*';

/// Compute the XOR parity of a sentence body.
///
/// `body` is the span strictly between the start delimiter and `*`.
///
/// # Example
/// ```
/// use nmea_relay::nmea::compute_checksum;
///
/// assert_eq!(compute_checksum(b"GPGGA,092750.000,5321.6802,N,00630.3372,W,1,8,1.03,61.7,M,55.2,M,,"), 0x76);
/// ```
#[inline]
pub fn compute_checksum(body: &[u8]) -> u8 {
    body.iter().fold(0u8, |crc, &b| crc ^ b)
}

/// Check the embedded checksum of a framed sentence.
///
/// Locates the first `*`, XORs every byte between the first byte and the
/// `*`, then compares the two-digit hex rendering of the result against
/// the text after `*` (surrounding whitespace trimmed, case-insensitive).
pub fn validate(sentence: &[u8]) -> bool {
    if sentence.len() < 2 {
        return false;
    }

    let Some(star) = sentence.iter().position(|&b| b == CHECKSUM_DELIMITER) else {
        return false;
    };

    // `*` as the start byte leaves no body to XOR
    if star == 0 {
        return false;
    }

    let crc = compute_checksum(&sentence[1..star]);
    let expected = sentence[star + 1..].trim_ascii();
    if expected.is_empty() {
        return false;
    }

    let computed = hex_digits(crc);
    expected.eq_ignore_ascii_case(&computed)
}

/// Upper-case two-digit hex rendering of a checksum byte
#[inline]
fn hex_digits(crc: u8) -> [u8; 2] {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    [DIGITS[(crc >> 4) as usize], DIGITS[(crc & 0x0F) as usize]]
}
