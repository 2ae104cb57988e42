//! NMEA relay - serial NMEA/AIS sentence forwarder
//!
//! Reads newline-delimited sentences from a serial receiver, drops anything
//! that fails the NMEA checksum, and fans the rest out to a UDP target and
//! (optionally) a SQLite capture database. The two consumers run on their
//! own threads behind bounded queues that drop on overflow, so a slow
//! database loses capture rows rather than delaying the live UDP feed.
//! Setting `persistence_backpressure = "block"` reverses that trade: the
//! reader waits for the database and the UDP feed slows with it.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod nmea;
pub mod pipeline;
pub mod shutdown;
pub mod storage;
pub mod streaming;
pub mod transport;

// Re-export commonly used types
pub use app::RelayApp;
pub use config::AppConfig;
pub use error::{Error, Result};
pub use nmea::Frame;
pub use shutdown::ShutdownSignal;
