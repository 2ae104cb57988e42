//! Persistence worker
//!
//! Owns the record store. In `Disabled` mode it still drains its queue so
//! the fanout never backs up, but the store is never touched.

use super::RecordStore;
use crate::nmea::Frame;
use crate::pipeline::{PipelineStats, QueueReceiver};
use std::sync::Arc;
use std::sync::atomic::Ordering;

/// Persistence mode, chosen once at startup
pub enum PersistenceMode {
    Disabled,
    Enabled(Box<dyn RecordStore>),
}

impl PersistenceMode {
    pub fn is_enabled(&self) -> bool {
        matches!(self, PersistenceMode::Enabled(_))
    }
}

pub struct PersistenceWorker {
    mode: PersistenceMode,
    queue: QueueReceiver<Frame>,
    stats: Arc<PipelineStats>,
}

impl PersistenceWorker {
    pub fn new(
        mode: PersistenceMode,
        queue: QueueReceiver<Frame>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self { mode, queue, stats }
    }

    /// Drain the queue until it is closed and empty
    pub fn run(mut self) {
        log::info!(
            "Persistence worker started ({})",
            if self.mode.is_enabled() {
                "enabled"
            } else {
                "disabled"
            }
        );

        while let Some(frame) = self.queue.dequeue() {
            match &mut self.mode {
                PersistenceMode::Disabled => {
                    PipelineStats::bump(&self.stats.records_discarded);
                }
                PersistenceMode::Enabled(store) => match store.append(&frame.to_text()) {
                    Ok(record) => {
                        PipelineStats::bump(&self.stats.records_stored);
                        log::trace!("Stored record {}", record.id);
                    }
                    Err(e) => {
                        PipelineStats::bump(&self.stats.store_failures);
                        log::error!("Failed to store frame: {}", e);
                    }
                },
            }
        }

        if !self.queue.is_empty() {
            let left = self.queue.len() as u64;
            self.stats.abandoned.fetch_add(left, Ordering::Relaxed);
            log::warn!("Abandoned {} frames in the {} queue", left, self.queue.name());
        }
        log::info!("Persistence worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Backpressure, pipeline_queue};
    use crate::shutdown::ShutdownSignal;
    use crate::storage::MemoryStore;

    const LINES: [&str; 3] = [
        "!AIVDM,1,1,,A,344Nv<5P001DG;=dVBlTs76v0P00,0*6C",
        "!AIVDM,1,1,,B,18uF3s?P001DDNadVB>`Mwv:00Rf,0*42",
        "!AIVDM,1,1,,B,13aOBG@0081DMuAdVov6BrMf0<1U,0*16",
    ];

    fn filled_queue() -> crate::pipeline::QueueReceiver<Frame> {
        let (tx, rx) = pipeline_queue("persistence", 8, Backpressure::DropNewest);
        let shutdown = ShutdownSignal::new();
        for line in LINES {
            tx.enqueue(Frame::parse(line.as_bytes()).unwrap(), &shutdown);
        }
        rx
    }

    #[test]
    fn test_enabled_stores_in_order() {
        let store = MemoryStore::new();
        let stats = Arc::new(PipelineStats::new());
        let mode = PersistenceMode::Enabled(Box::new(store.clone()));
        PersistenceWorker::new(mode, filled_queue(), Arc::clone(&stats)).run();

        let payloads: Vec<String> = store.records().into_iter().map(|r| r.payload).collect();
        assert_eq!(payloads, LINES);
        assert_eq!(stats.snapshot().records_stored, 3);
    }

    #[test]
    fn test_disabled_never_touches_store() {
        let store = MemoryStore::new();
        let stats = Arc::new(PipelineStats::new());
        PersistenceWorker::new(PersistenceMode::Disabled, filled_queue(), Arc::clone(&stats))
            .run();

        assert_eq!(store.appends(), 0);
        assert_eq!(stats.snapshot().records_discarded, 3);
    }

    #[test]
    fn test_store_failure_does_not_stop_worker() {
        let store = MemoryStore::new();
        store.fail_nth(0);
        let stats = Arc::new(PipelineStats::new());
        let mode = PersistenceMode::Enabled(Box::new(store.clone()));
        PersistenceWorker::new(mode, filled_queue(), Arc::clone(&stats)).run();

        assert_eq!(store.appends(), 3);
        assert_eq!(store.records().len(), 2);
        let snap = stats.snapshot();
        assert_eq!(snap.store_failures, 1);
        assert_eq!(snap.records_stored, 2);
    }
}
