//! Configuration for the relay
//!
//! Loaded once at startup from a TOML file, optionally overridden from the
//! command line, validated, then handed by reference to each component's
//! constructor. Nothing reads configuration after the pipeline starts.
//!
//! Every field has a default, so a partial (or empty) file is valid:
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud_rate = 38400
//!
//! [network]
//! host = "5.9.207.224"
//! port = 7018
//!
//! [storage]
//! enabled = true
//! path = "/dev/shm/ais.db"
//! ```

use crate::error::{Error, Result};
use crate::pipeline::{Backpressure, DEFAULT_QUEUE_CAPACITY};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial receiver
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial port path
    pub port: String,
    pub baud_rate: u32,
    /// Blocking read timeout; bounds how long shutdown waits on the reader
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 38400,
            read_timeout_ms: 500,
        }
    }
}

/// UDP relay target
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Target host (IP or domain name)
    pub host: String,
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "5.9.207.224".to_string(),
            port: 7018,
        }
    }
}

/// Frame capture database
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Write every validated frame to the database
    pub enabled: bool,
    /// SQLite database file
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "/dev/shm/ais.db".to_string(),
        }
    }
}

/// Overflow policy names as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackpressureMode {
    DropNewest,
    Block,
}

/// Queue sizing, overflow policy and shutdown timing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capacity of each queue (frames)
    pub queue_capacity: usize,
    pub network_backpressure: BackpressureMode,
    pub persistence_backpressure: BackpressureMode,
    /// Longest a `block` producer waits for space before dropping. The
    /// reader waits with it, so this also delays the network path.
    pub enqueue_timeout_ms: u64,
    /// Time allowed for queued frames to drain after a shutdown request
    pub shutdown_grace_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            network_backpressure: BackpressureMode::DropNewest,
            persistence_backpressure: BackpressureMode::DropNewest,
            enqueue_timeout_ms: 250,
            shutdown_grace_ms: 5000,
        }
    }
}

impl PipelineConfig {
    pub fn network_policy(&self) -> Backpressure {
        self.policy(self.network_backpressure)
    }

    pub fn persistence_policy(&self) -> Backpressure {
        self.policy(self.persistence_backpressure)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    fn policy(&self, mode: BackpressureMode) -> Backpressure {
        match mode {
            BackpressureMode::DropNewest => Backpressure::DropNewest,
            BackpressureMode::Block => Backpressure::Block {
                timeout: Duration::from_millis(self.enqueue_timeout_ms),
            },
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error); RUST_LOG wins
    pub level: String,
    /// Seconds between statistics lines, 0 to disable
    pub stats_interval_secs: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            stats_interval_secs: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    ///
    /// # Example
    /// ```no_run
    /// use nmea_relay::config::AppConfig;
    ///
    /// let config = AppConfig::from_file("/etc/nmea-relay.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(Error::InvalidConfig("serial.port is empty".to_string()));
        }
        if self.serial.baud_rate == 0 {
            return Err(Error::InvalidConfig("serial.baud_rate must be > 0".to_string()));
        }
        if self.serial.read_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "serial.read_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.network.host.is_empty() {
            return Err(Error::InvalidConfig("network.host is empty".to_string()));
        }
        if self.network.port == 0 {
            return Err(Error::InvalidConfig("network.port must be > 0".to_string()));
        }
        if self.storage.enabled && self.storage.path.is_empty() {
            return Err(Error::InvalidConfig(
                "storage.path is empty but storage is enabled".to_string(),
            ));
        }
        if self.pipeline.queue_capacity == 0 {
            return Err(Error::InvalidConfig(
                "pipeline.queue_capacity must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 38400);
        assert_eq!(config.network.host, "5.9.207.224");
        assert_eq!(config.network.port, 7018);
        assert_eq!(config.storage.path, "/dev/shm/ais.db");
        assert!(!config.storage.enabled);
        assert_eq!(config.pipeline.queue_capacity, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[serial]
port = "/dev/ttyS1"
baud_rate = 4800

[network]
host = "127.0.0.1"
port = 10110

[storage]
enabled = true
path = "/tmp/ais.db"

[pipeline]
queue_capacity = 64
persistence_backpressure = "block"

[logging]
level = "debug"
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyS1");
        assert_eq!(config.serial.baud_rate, 4800);
        assert_eq!(config.serial.read_timeout_ms, 500);
        assert_eq!(config.network.port, 10110);
        assert!(config.storage.enabled);
        assert_eq!(config.pipeline.queue_capacity, 64);
        assert_eq!(
            config.pipeline.persistence_policy(),
            Backpressure::Block {
                timeout: Duration::from_millis(250)
            }
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.stats_interval_secs, 10);
    }

    #[test]
    fn test_policy_mapping() {
        let pipeline = PipelineConfig::default();
        assert_eq!(pipeline.network_policy(), Backpressure::DropNewest);
        assert_eq!(pipeline.persistence_policy(), Backpressure::DropNewest);

        let pipeline = PipelineConfig {
            persistence_backpressure: BackpressureMode::Block,
            ..PipelineConfig::default()
        };
        assert_eq!(
            pipeline.persistence_policy(),
            Backpressure::Block {
                timeout: Duration::from_millis(250)
            }
        );
    }

    #[test]
    fn test_toml_serialization() {
        let toml_string = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert!(toml_string.contains("[serial]"));
        assert!(toml_string.contains("[pipeline]"));
        assert!(toml_string.contains("network_backpressure = \"drop_newest\""));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.pipeline.queue_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.network.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.storage.enabled = true;
        config.storage.path.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.storage.path.clear();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result: std::result::Result<AppConfig, _> =
            toml::from_str("[pipeline]\nnetwork_backpressure = \"drop_oldest\"\n");
        assert!(result.is_err());
    }
}
