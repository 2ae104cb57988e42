//! Pipeline counters
//!
//! Every stage bumps its own counters with relaxed atomics; nothing reads
//! them on the hot path. The app thread takes a [`StatsSnapshot`] for the
//! periodic statistics line and the shutdown summary.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Repeating warnings are logged on the first occurrence and every Nth after
pub const LOG_EVERY: u64 = 100;

/// Whether the `total`-th occurrence of a repeating fault should be logged
#[inline]
pub fn is_log_point(total: u64) -> bool {
    total == 1 || total % LOG_EVERY == 0
}

/// Shared counters for all pipeline stages
#[derive(Debug, Default)]
pub struct PipelineStats {
    // Reader
    pub lines_read: AtomicU64,
    pub read_errors: AtomicU64,
    pub too_short: AtomicU64,
    pub oversized: AtomicU64,
    pub bad_checksum: AtomicU64,
    pub frames_validated: AtomicU64,
    // Fanout
    pub network_enqueued: AtomicU64,
    pub network_dropped: AtomicU64,
    pub persistence_enqueued: AtomicU64,
    pub persistence_dropped: AtomicU64,
    // Network sender
    pub datagrams_sent: AtomicU64,
    pub send_failures: AtomicU64,
    // Persistence worker
    pub records_stored: AtomicU64,
    pub store_failures: AtomicU64,
    pub records_discarded: AtomicU64,
    // Frames left in a queue when the grace period ran out
    pub abandoned: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn bump(counter: &AtomicU64) -> u64 {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            lines_read: load(&self.lines_read),
            read_errors: load(&self.read_errors),
            too_short: load(&self.too_short),
            oversized: load(&self.oversized),
            bad_checksum: load(&self.bad_checksum),
            frames_validated: load(&self.frames_validated),
            network_enqueued: load(&self.network_enqueued),
            network_dropped: load(&self.network_dropped),
            persistence_enqueued: load(&self.persistence_enqueued),
            persistence_dropped: load(&self.persistence_dropped),
            datagrams_sent: load(&self.datagrams_sent),
            send_failures: load(&self.send_failures),
            records_stored: load(&self.records_stored),
            store_failures: load(&self.store_failures),
            records_discarded: load(&self.records_discarded),
            abandoned: load(&self.abandoned),
        }
    }
}

/// Point-in-time copy of [`PipelineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub lines_read: u64,
    pub read_errors: u64,
    pub too_short: u64,
    pub oversized: u64,
    pub bad_checksum: u64,
    pub frames_validated: u64,
    pub network_enqueued: u64,
    pub network_dropped: u64,
    pub persistence_enqueued: u64,
    pub persistence_dropped: u64,
    pub datagrams_sent: u64,
    pub send_failures: u64,
    pub records_stored: u64,
    pub store_failures: u64,
    pub records_discarded: u64,
    pub abandoned: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lines={} Valid={} Short={} Long={} BadCRC={} ReadErr={} | UDP sent={} failed={} dropped={} | DB stored={} failed={} discarded={} dropped={}",
            self.lines_read,
            self.frames_validated,
            self.too_short,
            self.oversized,
            self.bad_checksum,
            self.read_errors,
            self.datagrams_sent,
            self.send_failures,
            self.network_dropped,
            self.records_stored,
            self.store_failures,
            self.records_discarded,
            self.persistence_dropped,
        )?;
        if self.abandoned > 0 {
            write!(f, " | abandoned={}", self.abandoned)?;
        }
        Ok(())
    }
}
