//! Frame reader - pulls lines from the stream source and validates them
//!
//! The reader is the only owner of the stream source. It is an iterator of
//! validated [`Frame`]s that ends when the source closes or the shutdown
//! signal fires; the signal is checked before every blocking read, so a
//! shutdown request is honoured within one read timeout.
//!
//! # Per-line handling
//!
//! | Outcome | Action |
//! |---------|--------|
//! | read fault | counted, partial line discarded, loop continues; logged on the first and every 100th |
//! | longer than `MAX_LINE_LEN` | counted, dropped silently |
//! | < 10 bytes after trim | counted, dropped silently |
//! | checksum mismatch | counted, dropped silently |
//! | valid | yielded as a [`Frame`] |

use super::fanout::Fanout;
use super::stats::{PipelineStats, is_log_point};
use crate::nmea::{Frame, Rejection};
use crate::shutdown::ShutdownSignal;
use crate::transport::{LineRead, LineSource, MAX_LINE_LEN};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Back-off after a read fault so a dead port does not spin the CPU
const READ_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// Typical sentence length is under 82 bytes; AIS multipart lines run longer
const LINE_BUFFER_CAPACITY: usize = 256;

pub struct FrameReader<S: LineSource> {
    source: S,
    shutdown: ShutdownSignal,
    stats: Arc<PipelineStats>,
    line: Vec<u8>,
    finished: bool,
}

impl<S: LineSource> FrameReader<S> {
    pub fn new(source: S, shutdown: ShutdownSignal, stats: Arc<PipelineStats>) -> Self {
        Self {
            source,
            shutdown,
            stats,
            line: Vec::with_capacity(LINE_BUFFER_CAPACITY),
            finished: false,
        }
    }

    /// Read and publish frames until the source closes or shutdown fires.
    ///
    /// Consumes the reader, so the stream source and the fanout (and with
    /// it the producer side of both queues) are released on return.
    pub fn run(self, fanout: Fanout) {
        log::info!("Frame reader started");
        for frame in self {
            log::trace!("Rx: {:?}", frame);
            fanout.publish(frame);
        }
        log::info!("Frame reader stopped");
    }

    /// Drop a line that has grown past `MAX_LINE_LEN`, terminated or not
    fn discard_oversized(&mut self) -> bool {
        if self.line.len() <= MAX_LINE_LEN {
            return false;
        }
        PipelineStats::bump(&self.stats.lines_read);
        PipelineStats::bump(&self.stats.oversized);
        self.line.clear();
        true
    }

    fn accept(&self, raw: &[u8]) -> Option<Frame> {
        PipelineStats::bump(&self.stats.lines_read);
        match Frame::parse(raw) {
            Ok(frame) => {
                PipelineStats::bump(&self.stats.frames_validated);
                Some(frame)
            }
            Err(Rejection::TooShort) => {
                PipelineStats::bump(&self.stats.too_short);
                None
            }
            Err(Rejection::BadChecksum) => {
                PipelineStats::bump(&self.stats.bad_checksum);
                None
            }
        }
    }
}

impl<S: LineSource> Iterator for FrameReader<S> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        while !self.finished {
            if self.shutdown.is_fired() {
                log::debug!("Reader observed shutdown signal");
                self.finished = true;
                break;
            }

            match self.source.read_line(&mut self.line) {
                Ok(LineRead::Line) => {
                    if self.discard_oversized() {
                        continue;
                    }
                    let frame = self.accept(&self.line);
                    self.line.clear();
                    if frame.is_some() {
                        return frame;
                    }
                }
                Ok(LineRead::Idle) => {
                    self.discard_oversized();
                }
                Ok(LineRead::Closed) => {
                    log::info!("Stream source closed");
                    self.finished = true;
                }
                Err(e) => {
                    let total = PipelineStats::bump(&self.stats.read_errors);
                    if is_log_point(total) {
                        log::warn!("Serial read error: {} ({} so far)", e, total);
                    }
                    self.line.clear();
                    thread::sleep(READ_ERROR_BACKOFF);
                }
            }
        }
        None
    }
}
