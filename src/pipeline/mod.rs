//! Ingest-validate-fanout pipeline
//!
//! ```text
//!                                 ┌─▶ network queue ─────▶ NetworkSender ──▶ UDP
//! serial ─▶ FrameReader ─▶ Fanout ┤
//!           (checksum)            └─▶ persistence queue ─▶ PersistenceWorker ─▶ SQLite
//! ```
//!
//! Three threads, one per exclusively owned resource. The queues are the
//! only shared state; each preserves source order on its own, with no
//! ordering relation between the two.

pub mod fanout;
pub mod queue;
pub mod reader;
pub mod runner;
pub mod stats;

pub use fanout::Fanout;
pub use queue::{
    AbandonHandle, Backpressure, DEFAULT_QUEUE_CAPACITY, Enqueue, QueueReceiver, QueueSender,
    pipeline_queue,
};
pub use reader::FrameReader;
pub use runner::Pipeline;
pub use stats::{PipelineStats, StatsSnapshot};
