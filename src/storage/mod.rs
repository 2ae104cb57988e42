//! Frame capture storage
//!
//! Persistence is optional and fixed at startup. When enabled, every
//! validated frame becomes one append-only row; rows are never updated or
//! deleted by the relay.

mod memory;
mod sqlite;
mod worker;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use worker::{PersistenceMode, PersistenceWorker};

use crate::error::Result;
use chrono::{DateTime, Utc};

/// One stored frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRecord {
    /// Identifier assigned by the store
    pub id: i64,
    pub created_at: DateTime<Utc>,
    /// Frame payload as text
    pub payload: String,
}

/// Append-only record sink
pub trait RecordStore: Send {
    /// Store one payload, returns the generated record
    fn append(&mut self, payload: &str) -> Result<PersistedRecord>;
}
