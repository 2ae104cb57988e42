//! Validated sentence frames

use super::checksum;
use std::fmt;
use std::sync::Arc;

/// Frames shorter than this after trimming are line noise, not sentences
pub const MIN_FRAME_LEN: usize = 10;

/// Why a raw line was not accepted as a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Fewer than [`MIN_FRAME_LEN`] bytes after trimming
    TooShort,
    /// Embedded checksum missing or wrong
    BadChecksum,
}

/// One validated sentence, trimmed of surrounding whitespace.
///
/// The payload is shared read-only between the network and persistence
/// queues, so cloning a `Frame` is a reference-count bump.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Arc<[u8]>,
}

impl Frame {
    /// Normalize and validate one raw line from the stream source.
    ///
    /// The line is trimmed, checked against [`MIN_FRAME_LEN`], then run
    /// through the checksum validator.
    pub fn parse(raw: &[u8]) -> Result<Self, Rejection> {
        let trimmed = raw.trim_ascii();
        if trimmed.len() < MIN_FRAME_LEN {
            return Err(Rejection::TooShort);
        }
        if !checksum::validate(trimmed) {
            return Err(Rejection::BadChecksum);
        }
        Ok(Self {
            bytes: Arc::from(trimmed),
        })
    }

    /// Frame bytes exactly as they will go on the wire
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Frame payload as text (lossy for non-UTF-8 bytes)
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Frame")
            .field(&String::from_utf8_lossy(&self.bytes))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GGA: &str = "$GPGGA,092750.000,5321.6802,N,00630.3372,W,1,8,1.03,61.7,M,55.2,M,,*76";

    #[test]
    fn test_parse_trims_line_ending() {
        let raw = format!("  {}\r\n", GGA);
        let frame = Frame::parse(raw.as_bytes()).unwrap();
        assert_eq!(frame.as_bytes(), GGA.as_bytes());
        assert_eq!(frame.to_text(), GGA);
    }

    #[test]
    fn test_parse_rejects_short_lines() {
        assert_eq!(Frame::parse(b"$*00\r\n"), Err(Rejection::TooShort));
        assert_eq!(Frame::parse(b"   \r\n"), Err(Rejection::TooShort));
        assert_eq!(Frame::parse(b""), Err(Rejection::TooShort));
    }

    #[test]
    fn test_min_length_applies_after_trimming() {
        // Valid checksum, 9 bytes of content padded well past 10 with whitespace
        let raw = b"    $ABCDE*41      \n";
        assert_eq!(Frame::parse(raw), Err(Rejection::TooShort));
    }

    #[test]
    fn test_parse_rejects_bad_checksum() {
        let bad = GGA.replace("*76", "*77");
        assert_eq!(Frame::parse(bad.as_bytes()), Err(Rejection::BadChecksum));
        assert_eq!(
            Frame::parse(b"$GPGGA,no,checksum,at,all"),
            Err(Rejection::BadChecksum)
        );
    }

    #[test]
    fn test_clone_shares_payload() {
        let frame = Frame::parse(GGA.as_bytes()).unwrap();
        let copy = frame.clone();
        assert!(Arc::ptr_eq(&frame.bytes, &copy.bytes));
    }
}
