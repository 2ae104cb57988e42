//! In-memory record store for testing

use super::{PersistedRecord, RecordStore};
use crate::error::{Error, Result};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Keeps records in a shared vector; selected appends can be forced to fail
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    records: Vec<PersistedRecord>,
    appends: usize,
    fail_on: HashSet<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the append with zero-based index `n` fail
    pub fn fail_nth(&self, n: usize) {
        self.inner.lock().fail_on.insert(n);
    }

    pub fn records(&self) -> Vec<PersistedRecord> {
        self.inner.lock().records.clone()
    }

    /// Append calls, including failed ones
    pub fn appends(&self) -> usize {
        self.inner.lock().appends
    }
}

impl RecordStore for MemoryStore {
    fn append(&mut self, payload: &str) -> Result<PersistedRecord> {
        let mut inner = self.inner.lock();
        let attempt = inner.appends;
        inner.appends += 1;
        if inner.fail_on.contains(&attempt) {
            return Err(Error::Other("injected store fault".to_string()));
        }
        let record = PersistedRecord {
            id: inner.records.len() as i64 + 1,
            created_at: Utc::now(),
            payload: payload.to_string(),
        };
        inner.records.push(record.clone());
        Ok(record)
    }
}
