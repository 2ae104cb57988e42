//! Bounded FIFO queues between the reader and the two consumers
//!
//! Each queue is a crossbeam bounded channel with an explicit overflow
//! policy on the producer side:
//!
//! | Policy | Producer on full queue |
//! |--------|------------------------|
//! | [`Backpressure::DropNewest`] | drops the incoming frame immediately (default for both queues) |
//! | [`Backpressure::Block`] | waits up to `timeout`, then drops |
//!
//! `Block` trades latency for completeness. The producer is the serial
//! reader, so while one queue is saturated every frame costs up to
//! `timeout` of reader time and the other queue is fed at that pace too.
//! It is never indefinite: the wait gives up as soon as shutdown is
//! requested.
//!
//! Consumers block on an empty queue and see end-of-stream once every
//! producer handle is dropped and the remaining items are drained, or
//! immediately once the queue has been abandoned.

use crate::shutdown::ShutdownSignal;
use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Default queue capacity (frames)
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Granularity at which blocked producers and idle consumers re-check flags
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Producer behaviour when a queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backpressure {
    /// Drop the incoming item without waiting
    DropNewest,
    /// Wait for space up to `timeout`, then drop the incoming item
    Block { timeout: Duration },
}

/// Result of one enqueue attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    Queued,
    /// Queue stayed full under the configured policy
    DroppedFull,
    /// Consumer is gone
    DroppedClosed,
}

/// Create a named bounded queue
pub fn pipeline_queue<T>(
    name: &'static str,
    capacity: usize,
    policy: Backpressure,
) -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    let abandoned = Arc::new(AtomicBool::new(false));
    (
        QueueSender { name, tx, policy },
        QueueReceiver {
            name,
            rx,
            abandoned,
        },
    )
}

/// Producer half of a pipeline queue
pub struct QueueSender<T> {
    name: &'static str,
    tx: Sender<T>,
    policy: Backpressure,
}

impl<T> QueueSender<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn policy(&self) -> Backpressure {
        self.policy
    }

    /// Hand one item to the consumer according to the queue's policy
    pub fn enqueue(&self, item: T, shutdown: &ShutdownSignal) -> Enqueue {
        match self.policy {
            Backpressure::DropNewest => match self.tx.try_send(item) {
                Ok(()) => Enqueue::Queued,
                Err(TrySendError::Full(_)) => Enqueue::DroppedFull,
                Err(TrySendError::Disconnected(_)) => Enqueue::DroppedClosed,
            },
            Backpressure::Block { timeout } => self.enqueue_blocking(item, timeout, shutdown),
        }
    }

    fn enqueue_blocking(&self, item: T, timeout: Duration, shutdown: &ShutdownSignal) -> Enqueue {
        let deadline = Instant::now() + timeout;
        let mut item = item;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.tx.send_timeout(item, remaining.min(POLL_INTERVAL)) {
                Ok(()) => return Enqueue::Queued,
                Err(SendTimeoutError::Disconnected(_)) => return Enqueue::DroppedClosed,
                Err(SendTimeoutError::Timeout(back)) => {
                    if shutdown.is_fired() || Instant::now() >= deadline {
                        return Enqueue::DroppedFull;
                    }
                    item = back;
                }
            }
        }
    }
}

/// Consumer half of a pipeline queue
pub struct QueueReceiver<T> {
    name: &'static str,
    rx: Receiver<T>,
    abandoned: Arc<AtomicBool>,
}

impl<T> QueueReceiver<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Block until the next item arrives.
    ///
    /// Returns `None` once all producers are gone and the queue is empty,
    /// or as soon as the queue has been abandoned.
    pub fn dequeue(&self) -> Option<T> {
        loop {
            if self.abandoned.load(Ordering::Relaxed) {
                return None;
            }
            match self.rx.recv_timeout(POLL_INTERVAL) {
                Ok(item) => return Some(item),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Items currently buffered
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Handle that stops draining from another thread
    pub fn abandon_handle(&self) -> AbandonHandle {
        AbandonHandle {
            flag: Arc::clone(&self.abandoned),
        }
    }
}

/// Tells a consumer to stop draining once the grace period is over
#[derive(Clone)]
pub struct AbandonHandle {
    flag: Arc<AtomicBool>,
}

impl AbandonHandle {
    pub fn abandon(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let (tx, rx) = pipeline_queue("test", 8, Backpressure::DropNewest);
        let shutdown = ShutdownSignal::new();
        for i in 0..5 {
            assert_eq!(tx.enqueue(i, &shutdown), Enqueue::Queued);
        }
        drop(tx);

        let drained: Vec<i32> = std::iter::from_fn(|| rx.dequeue()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_drop_newest_on_full() {
        let (tx, rx) = pipeline_queue("test", 2, Backpressure::DropNewest);
        let shutdown = ShutdownSignal::new();
        assert_eq!(tx.enqueue(1, &shutdown), Enqueue::Queued);
        assert_eq!(tx.enqueue(2, &shutdown), Enqueue::Queued);
        assert_eq!(tx.enqueue(3, &shutdown), Enqueue::DroppedFull);

        assert_eq!(rx.dequeue(), Some(1));
        assert_eq!(rx.dequeue(), Some(2));
        assert_eq!(rx.len(), 0);
    }

    #[test]
    fn test_block_times_out() {
        let (tx, _rx) = pipeline_queue(
            "test",
            1,
            Backpressure::Block {
                timeout: Duration::from_millis(20),
            },
        );
        let shutdown = ShutdownSignal::new();
        assert_eq!(tx.enqueue(1, &shutdown), Enqueue::Queued);

        let start = Instant::now();
        assert_eq!(tx.enqueue(2, &shutdown), Enqueue::DroppedFull);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_block_waits_for_consumer() {
        let (tx, rx) = pipeline_queue(
            "test",
            1,
            Backpressure::Block {
                timeout: Duration::from_secs(5),
            },
        );
        let shutdown = ShutdownSignal::new();
        assert_eq!(tx.enqueue(1, &shutdown), Enqueue::Queued);

        let consumer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            std::iter::from_fn(|| rx.dequeue()).collect::<Vec<i32>>()
        });

        assert_eq!(tx.enqueue(2, &shutdown), Enqueue::Queued);
        drop(tx);
        assert_eq!(consumer.join().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_block_gives_up_after_shutdown() {
        let (tx, _rx) = pipeline_queue(
            "test",
            1,
            Backpressure::Block {
                timeout: Duration::from_secs(60),
            },
        );
        let shutdown = ShutdownSignal::new();
        assert_eq!(tx.enqueue(1, &shutdown), Enqueue::Queued);
        shutdown.fire();

        let start = Instant::now();
        assert_eq!(tx.enqueue(2, &shutdown), Enqueue::DroppedFull);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_halves_share_name() {
        let (tx, rx) = pipeline_queue::<i32>("persistence", 4, Backpressure::DropNewest);
        assert_eq!(tx.name(), "persistence");
        assert_eq!(rx.name(), "persistence");
        assert!(rx.is_empty());
    }

    #[test]
    fn test_closed_consumer() {
        let (tx, rx) = pipeline_queue::<i32>("test", 4, Backpressure::DropNewest);
        drop(rx);
        assert_eq!(tx.enqueue(1, &ShutdownSignal::new()), Enqueue::DroppedClosed);
    }

    #[test]
    fn test_abandon_stops_dequeue() {
        let (tx, rx) = pipeline_queue("test", 4, Backpressure::DropNewest);
        let shutdown = ShutdownSignal::new();
        tx.enqueue(1, &shutdown);
        tx.enqueue(2, &shutdown);

        rx.abandon_handle().abandon();
        assert_eq!(rx.dequeue(), None);
        assert_eq!(rx.len(), 2);
    }
}
