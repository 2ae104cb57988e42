//! Scripted line source for testing

use super::{LineRead, LineSource};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Simulated read timeout when the script is empty and the source is open
const IDLE_READ: Duration = Duration::from_millis(1);

enum Step {
    Line(Vec<u8>),
    Fault(io::ErrorKind),
}

/// Mock line source for unit and pipeline tests
///
/// Clones share the same script, so a test can keep a handle for injecting
/// lines and inspecting read counts after the source moves into the
/// reader thread.
#[derive(Clone)]
pub struct MockLineSource {
    inner: Arc<Mutex<MockInner>>,
}

struct MockInner {
    script: VecDeque<Step>,
    close_when_drained: bool,
    reads: u64,
}

impl MockLineSource {
    /// Create an open source that idles once its script runs out
    pub fn new() -> Self {
        MockLineSource {
            inner: Arc::new(Mutex::new(MockInner {
                script: VecDeque::new(),
                close_when_drained: false,
                reads: 0,
            })),
        }
    }

    /// Report end of stream once the script runs out
    pub fn close_when_drained(self) -> Self {
        self.inner.lock().close_when_drained = true;
        self
    }

    /// Queue one line; a trailing newline is appended if missing
    pub fn inject_line(&self, line: &[u8]) {
        let mut bytes = line.to_vec();
        if bytes.last() != Some(&b'\n') {
            bytes.push(b'\n');
        }
        self.inner.lock().script.push_back(Step::Line(bytes));
    }

    /// Queue a read fault
    pub fn inject_error(&self, kind: io::ErrorKind) {
        self.inner.lock().script.push_back(Step::Fault(kind));
    }

    /// Number of `read_line` calls served so far
    pub fn reads(&self) -> u64 {
        self.inner.lock().reads
    }

    /// Scripted steps not yet consumed
    pub fn pending(&self) -> usize {
        self.inner.lock().script.len()
    }
}

impl LineSource for MockLineSource {
    fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<LineRead> {
        let step = {
            let mut inner = self.inner.lock();
            inner.reads += 1;
            match inner.script.pop_front() {
                Some(step) => step,
                None if inner.close_when_drained => return Ok(LineRead::Closed),
                None => {
                    drop(inner);
                    std::thread::sleep(IDLE_READ);
                    return Ok(LineRead::Idle);
                }
            }
        };

        match step {
            Step::Line(bytes) => {
                buf.extend_from_slice(&bytes);
                Ok(LineRead::Line)
            }
            Step::Fault(kind) => Err(Error::Io(io::Error::new(kind, "injected read fault"))),
        }
    }
}

impl Default for MockLineSource {
    fn default() -> Self {
        Self::new()
    }
}
