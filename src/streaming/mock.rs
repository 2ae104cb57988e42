//! In-memory datagram sink for testing

use super::DatagramSink;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::io;
use std::sync::Arc;

/// Records every datagram; selected sends can be forced to fail
#[derive(Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<RecordingInner>>,
}

#[derive(Default)]
struct RecordingInner {
    sent: Vec<Vec<u8>>,
    attempts: usize,
    fail_on: HashSet<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the send attempt with zero-based index `n` fail
    pub fn fail_nth(&self, n: usize) {
        self.inner.lock().fail_on.insert(n);
    }

    /// Datagrams delivered so far, in send order
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.inner.lock().sent.clone()
    }

    /// Send attempts, including failed ones
    pub fn attempts(&self) -> usize {
        self.inner.lock().attempts
    }
}

impl DatagramSink for RecordingSink {
    fn send(&mut self, datagram: &[u8]) -> Result<usize> {
        let mut inner = self.inner.lock();
        let attempt = inner.attempts;
        inner.attempts += 1;
        if inner.fail_on.contains(&attempt) {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "injected send fault",
            )));
        }
        inner.sent.push(datagram.to_vec());
        Ok(datagram.len())
    }
}
