//! Application orchestration for the relay daemon
//!
//! Opens the three exclusively owned resources (serial port, UDP socket,
//! optional capture database), starts the pipeline, and supervises it until
//! a termination signal arrives or the serial source closes.
//!
//! Any failure before the pipeline starts is fatal: there is no mode where
//! only part of the pipeline runs.

use crate::config::AppConfig;
use crate::error::Result;
use crate::pipeline::{Pipeline, StatsSnapshot};
use crate::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::storage::{PersistenceMode, SqliteStore};
use crate::streaming::UdpSink;
use crate::transport::SerialTransport;
use log::{info, warn};
use std::time::{Duration, Instant};

/// Supervisor poll interval
const SUPERVISE_INTERVAL: Duration = Duration::from_millis(100);

/// Relay daemon
pub struct RelayApp {
    config: AppConfig,
}

impl RelayApp {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Run until shutdown, returns the final statistics
    pub fn run(&self) -> Result<StatsSnapshot> {
        let config = &self.config;
        let shutdown = ShutdownSignal::new();
        let coordinator = ShutdownCoordinator::install(shutdown.clone())?;

        info!(
            "Serial: {} @ {} baud, UDP target: {}:{}",
            config.serial.port, config.serial.baud_rate, config.network.host, config.network.port
        );

        let source = SerialTransport::open(
            &config.serial.port,
            config.serial.baud_rate,
            Duration::from_millis(config.serial.read_timeout_ms),
        )?;
        let sink = UdpSink::connect(&config.network.host, config.network.port)?;
        let persistence = if config.storage.enabled {
            PersistenceMode::Enabled(Box::new(SqliteStore::open(&config.storage.path)?))
        } else {
            info!("Frame storage disabled");
            PersistenceMode::Disabled
        };

        let pipeline = Pipeline::spawn(source, sink, persistence, &config.pipeline, shutdown)?;
        info!("✓ Relay running. Press Ctrl-C to stop.");

        self.supervise(&pipeline);

        let summary = pipeline.shutdown(config.pipeline.shutdown_grace())?;
        coordinator.close();

        info!("Final statistics: {}", summary);
        Ok(summary)
    }

    /// Wait for a shutdown request, logging statistics along the way
    fn supervise(&self, pipeline: &Pipeline) {
        let stats_interval = Duration::from_secs(self.config.logging.stats_interval_secs);
        let mut last_stats = Instant::now();

        while !pipeline.shutdown_signal().is_fired() {
            std::thread::sleep(SUPERVISE_INTERVAL);

            if pipeline.reader_finished() && pipeline.shutdown_signal().fire() {
                warn!("Stream source closed, shutting down");
            }

            if !stats_interval.is_zero() && last_stats.elapsed() >= stats_interval {
                info!("{}", pipeline.stats());
                last_stats = Instant::now();
            }
        }
    }
}
