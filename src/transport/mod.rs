//! Stream source abstraction for line-delimited input

use crate::error::Result;
use std::io::{BufRead, ErrorKind, Read};

mod mock;
mod serial;

pub use mock::MockLineSource;
pub use serial::SerialTransport;

/// Frame delimiter on the serial line
pub const LINE_DELIMITER: u8 = b'\n';

/// Longest line kept, terminator included. NMEA allows 82 bytes; anything
/// past this is noise such as a receiver at the wrong baud rate.
pub const MAX_LINE_LEN: usize = 1024;

/// Outcome of one blocking line read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRead {
    /// A complete line (or the tail of a closed stream) is in the buffer
    Line,
    /// Read timed out; any partial line stays in the buffer
    Idle,
    /// Source reached end of stream
    Closed,
}

/// Byte-stream source that yields newline-delimited lines
///
/// Implementations must return within one read timeout so the reader loop
/// can observe the shutdown signal between calls.
pub trait LineSource: Send {
    /// Append bytes up to and including the next newline to `buf`
    fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<LineRead>;
}

/// Shared `read_until` handling for buffered readers.
///
/// Timeouts keep the partial line in `buf` so a sentence split across two
/// reads is not lost. One call never grows `buf` past `MAX_LINE_LEN + 1`
/// bytes; a line cut off at that limit is returned as `Line` without a
/// terminator and the caller discards it.
pub(crate) fn read_line_from<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> Result<LineRead> {
    let had_partial = !buf.is_empty();
    let room = (MAX_LINE_LEN + 1).saturating_sub(buf.len()) as u64;
    match reader.by_ref().take(room).read_until(LINE_DELIMITER, buf) {
        Ok(0) if !had_partial => Ok(LineRead::Closed),
        Ok(_) => Ok(LineRead::Line),
        Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
            Ok(LineRead::Idle)
        }
        Err(e) => Err(e.into()),
    }
}
