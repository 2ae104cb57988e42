//! Worker threads for a running pipeline
//!
//! # Thread Model
//!
//! 1. **frame-reader**: owns the stream source, validates, fans out
//! 2. **network-sender**: owns the datagram sink, drains the network queue
//! 3. **persistence-worker**: owns the record store, drains the persistence queue
//!
//! # Shutdown
//!
//! 1. Fire the [`ShutdownSignal`]; the reader stops before its next read
//!    (within one read timeout) and drops the source and the fanout,
//!    which closes both queues.
//! 2. Consumers drain what is left and exit on their own.
//! 3. If they have not finished within the grace period, both queues are
//!    abandoned; workers stop after the frame in hand and the remainder is
//!    counted as abandoned.

use super::fanout::Fanout;
use super::queue::{AbandonHandle, pipeline_queue};
use super::reader::FrameReader;
use super::stats::{PipelineStats, StatsSnapshot};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::shutdown::ShutdownSignal;
use crate::storage::{PersistenceMode, PersistenceWorker};
use crate::streaming::{DatagramSink, NetworkSender};
use crate::transport::LineSource;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Poll interval while waiting for workers to drain
const DRAIN_POLL: Duration = Duration::from_millis(10);

/// Handles to the three pipeline threads
pub struct Pipeline {
    shutdown: ShutdownSignal,
    stats: Arc<PipelineStats>,
    reader: JoinHandle<()>,
    network: JoinHandle<()>,
    persistence: JoinHandle<()>,
    abandon: [AbandonHandle; 2],
}

impl Pipeline {
    /// Wire up both queues and start all three workers
    pub fn spawn<S, D>(
        source: S,
        sink: D,
        persistence: PersistenceMode,
        config: &PipelineConfig,
        shutdown: ShutdownSignal,
    ) -> Result<Self>
    where
        S: LineSource + 'static,
        D: DatagramSink + 'static,
    {
        let stats = Arc::new(PipelineStats::new());

        let (net_tx, net_rx) =
            pipeline_queue("network", config.queue_capacity, config.network_policy());
        let (db_tx, db_rx) = pipeline_queue(
            "persistence",
            config.queue_capacity,
            config.persistence_policy(),
        );
        let abandon = [net_rx.abandon_handle(), db_rx.abandon_handle()];

        log::info!(
            "Queues: capacity={} network={:?} persistence={:?}",
            config.queue_capacity,
            config.network_policy(),
            config.persistence_policy()
        );

        // Consumers first so nothing is queued without someone to drain it
        let sender = NetworkSender::new(sink, net_rx, Arc::clone(&stats));
        let network = thread::Builder::new()
            .name("network-sender".to_string())
            .spawn(move || sender.run())
            .map_err(|e| Error::Other(format!("Failed to spawn network sender: {}", e)))?;

        let worker = PersistenceWorker::new(persistence, db_rx, Arc::clone(&stats));
        let persistence = thread::Builder::new()
            .name("persistence-worker".to_string())
            .spawn(move || worker.run())
            .map_err(|e| Error::Other(format!("Failed to spawn persistence worker: {}", e)))?;

        let fanout = Fanout::new(net_tx, db_tx, shutdown.clone(), Arc::clone(&stats));
        let reader = FrameReader::new(source, shutdown.clone(), Arc::clone(&stats));
        let reader = thread::Builder::new()
            .name("frame-reader".to_string())
            .spawn(move || reader.run(fanout))
            .map_err(|e| Error::Other(format!("Failed to spawn frame reader: {}", e)))?;

        Ok(Self {
            shutdown,
            stats,
            reader,
            network,
            persistence,
            abandon,
        })
    }

    /// Shared signal for this pipeline
    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Whether the reader has stopped (source closed or shutdown observed)
    pub fn reader_finished(&self) -> bool {
        self.reader.is_finished()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Stop reading, drain both queues within `grace`, join every worker
    pub fn shutdown(self, grace: Duration) -> Result<StatsSnapshot> {
        if self.shutdown.fire() {
            log::info!("Shutdown requested, stopping reader...");
        }

        self.reader
            .join()
            .map_err(|_| Error::ThreadPanic("frame-reader"))?;
        log::info!("Reader stopped, draining queues (grace {:?})", grace);

        let deadline = Instant::now() + grace;
        while !(self.network.is_finished() && self.persistence.is_finished()) {
            if Instant::now() >= deadline {
                log::warn!("Grace period expired, abandoning queued frames");
                for handle in &self.abandon {
                    handle.abandon();
                }
                break;
            }
            thread::sleep(DRAIN_POLL);
        }

        self.network
            .join()
            .map_err(|_| Error::ThreadPanic("network-sender"))?;
        self.persistence
            .join()
            .map_err(|_| Error::ThreadPanic("persistence-worker"))?;

        self.shutdown.mark_stopped();
        Ok(self.stats.snapshot())
    }
}
