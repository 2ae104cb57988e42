//! SQLite-backed record store
//!
//! Table layout follows the capture database the relay has always written,
//! so existing tooling that reads `db_packets` keeps working:
//!
//! | Column | Type | Notes |
//! |--------|------|-------|
//! | `id` | INTEGER PK | autoincrement |
//! | `created_at` | DATETIME | insert time, RFC 3339 text in UTC |
//! | `updated_at` | DATETIME | same as `created_at`, rows are never updated |
//! | `deleted_at` | DATETIME | always NULL |
//! | `payload` | TEXT | the sentence |

use super::{PersistedRecord, RecordStore};
use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, params};
use std::path::Path;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS db_packets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at DATETIME,
    updated_at DATETIME,
    deleted_at DATETIME,
    payload VARCHAR(255)
)";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_db_packets_deleted_at ON db_packets(deleted_at)";

const INSERT: &str = "INSERT INTO db_packets (created_at, updated_at, deleted_at, payload)
    VALUES (?1, ?1, NULL, ?2)";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the capture database and ensure the schema exists
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.execute(CREATE_TABLE, [])?;
        conn.execute(CREATE_INDEX, [])?;
        log::info!("Opened frame store: {}", path.display());
        Ok(Self { conn })
    }

    /// In-memory database, mainly for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute(CREATE_TABLE, [])?;
        conn.execute(CREATE_INDEX, [])?;
        Ok(Self { conn })
    }

    /// Number of stored records
    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM db_packets", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// All records in insertion order
    pub fn records(&self) -> Result<Vec<PersistedRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, created_at, payload FROM db_packets ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(PersistedRecord {
                id: row.get(0)?,
                created_at: parse_timestamp(&row.get::<_, String>(1)?)?,
                payload: row.get(2)?,
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

fn parse_timestamp(text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))
}

impl RecordStore for SqliteStore {
    fn append(&mut self, payload: &str) -> Result<PersistedRecord> {
        let created_at = Utc::now();
        self.conn
            .execute(INSERT, params![created_at.to_rfc3339(), payload])?;
        Ok(PersistedRecord {
            id: self.conn.last_insert_rowid(),
            created_at,
            payload: payload.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_assigns_increasing_ids() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let a = store.append("!AIVDM,1,1,,A,344Nv<5P001DG;=dVBlTs76v0P00,0*6C").unwrap();
        let b = store.append("!AIVDM,1,1,,B,18uF3s?P001DDNadVB>`Mwv:00Rf,0*42").unwrap();

        assert!(b.id > a.id);
        assert!(b.created_at >= a.created_at);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_records_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ais.db");

        let appended = {
            let mut store = SqliteStore::open(&path).unwrap();
            store.append("!AIVDM,2,2,9,A,?wwh0000000,2*7A").unwrap()
        };

        // Reopening must not recreate or truncate the table
        let store = SqliteStore::open(&path).unwrap();
        let records = store.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, appended.id);
        assert_eq!(records[0].payload, "!AIVDM,2,2,9,A,?wwh0000000,2*7A");
        assert_eq!(records[0].created_at, appended.created_at);
    }

    #[test]
    fn test_created_at_stored_as_rfc3339() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let record = store.append("!AIVDM,2,2,9,A,?wwh0000000,2*7A").unwrap();

        let raw: String = store
            .conn
            .query_row(
                "SELECT created_at FROM db_packets WHERE id = ?1",
                [record.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(raw.as_bytes()[10], b'T');
        assert_eq!(raw, record.created_at.to_rfc3339());
        assert!(DateTime::parse_from_rfc3339(&raw).is_ok());
    }
}
