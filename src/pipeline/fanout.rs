//! Fanout of validated frames to the network and persistence queues

use super::queue::{Enqueue, QueueSender};
use super::stats::{PipelineStats, is_log_point};
use crate::nmea::Frame;
use crate::shutdown::ShutdownSignal;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

/// Publishes each frame to both consumer queues
///
/// The two enqueues are independent: a full or closed persistence queue
/// never keeps a frame from the network queue, and vice versa. Dropping the
/// `Fanout` closes both queues.
pub struct Fanout {
    network: QueueSender<Frame>,
    persistence: QueueSender<Frame>,
    shutdown: ShutdownSignal,
    stats: Arc<PipelineStats>,
}

impl Fanout {
    pub fn new(
        network: QueueSender<Frame>,
        persistence: QueueSender<Frame>,
        shutdown: ShutdownSignal,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            network,
            persistence,
            shutdown,
            stats,
        }
    }

    /// Enqueue `frame` on both queues
    pub fn publish(&self, frame: Frame) {
        // Network first: it is the live path
        let outcome = self.network.enqueue(frame.clone(), &self.shutdown);
        self.record(
            &self.network,
            outcome,
            &self.stats.network_enqueued,
            &self.stats.network_dropped,
        );

        let outcome = self.persistence.enqueue(frame, &self.shutdown);
        self.record(
            &self.persistence,
            outcome,
            &self.stats.persistence_enqueued,
            &self.stats.persistence_dropped,
        );
    }

    fn record(
        &self,
        queue: &QueueSender<Frame>,
        outcome: Enqueue,
        enqueued: &AtomicU64,
        dropped: &AtomicU64,
    ) {
        match outcome {
            Enqueue::Queued => {
                PipelineStats::bump(enqueued);
            }
            Enqueue::DroppedFull => {
                let total = PipelineStats::bump(dropped);
                if is_log_point(total) {
                    log::warn!(
                        "{} queue full ({:?}), dropped frame ({} dropped so far)",
                        queue.name(),
                        queue.policy(),
                        total
                    );
                }
            }
            Enqueue::DroppedClosed => {
                let total = PipelineStats::bump(dropped);
                if is_log_point(total) {
                    log::warn!(
                        "{} queue closed, dropped frame ({} dropped so far)",
                        queue.name(),
                        total
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::queue::{Backpressure, pipeline_queue};

    fn frame(text: &str) -> Frame {
        Frame::parse(text.as_bytes()).unwrap()
    }

    const A: &str = "!AIVDM,1,1,,A,344Nv<5P001DG;=dVBlTs76v0P00,0*6C";
    const B: &str = "!AIVDM,1,1,,B,18uF3s?P001DDNadVB>`Mwv:00Rf,0*42";

    #[test]
    fn test_publish_reaches_both_queues_in_order() {
        let (net_tx, net_rx) = pipeline_queue("network", 4, Backpressure::DropNewest);
        let (db_tx, db_rx) = pipeline_queue("persistence", 4, Backpressure::DropNewest);
        let stats = Arc::new(PipelineStats::new());
        let fanout = Fanout::new(net_tx, db_tx, ShutdownSignal::new(), Arc::clone(&stats));

        fanout.publish(frame(A));
        fanout.publish(frame(B));
        drop(fanout);

        assert_eq!(net_rx.dequeue().unwrap().as_bytes(), A.as_bytes());
        assert_eq!(net_rx.dequeue().unwrap().as_bytes(), B.as_bytes());
        assert!(net_rx.dequeue().is_none());
        assert_eq!(db_rx.dequeue().unwrap().as_bytes(), A.as_bytes());
        assert_eq!(db_rx.dequeue().unwrap().as_bytes(), B.as_bytes());
        assert!(db_rx.dequeue().is_none());

        let snap = stats.snapshot();
        assert_eq!(snap.network_enqueued, 2);
        assert_eq!(snap.persistence_enqueued, 2);
    }

    #[test]
    fn test_full_persistence_queue_does_not_block_network() {
        let (net_tx, net_rx) = pipeline_queue("network", 4, Backpressure::DropNewest);
        let (db_tx, _db_rx) = pipeline_queue("persistence", 1, Backpressure::DropNewest);
        let stats = Arc::new(PipelineStats::new());
        let fanout = Fanout::new(net_tx, db_tx, ShutdownSignal::new(), Arc::clone(&stats));

        fanout.publish(frame(A));
        fanout.publish(frame(B));

        assert_eq!(net_rx.len(), 2);
        let snap = stats.snapshot();
        assert_eq!(snap.network_enqueued, 2);
        assert_eq!(snap.persistence_enqueued, 1);
        assert_eq!(snap.persistence_dropped, 1);
    }

    #[test]
    fn test_closed_network_queue_does_not_block_persistence() {
        let (net_tx, net_rx) = pipeline_queue("network", 4, Backpressure::DropNewest);
        let (db_tx, db_rx) = pipeline_queue("persistence", 4, Backpressure::DropNewest);
        drop(net_rx);
        let stats = Arc::new(PipelineStats::new());
        let fanout = Fanout::new(net_tx, db_tx, ShutdownSignal::new(), Arc::clone(&stats));

        fanout.publish(frame(A));

        assert_eq!(db_rx.len(), 1);
        assert_eq!(stats.snapshot().network_dropped, 1);
    }
}
