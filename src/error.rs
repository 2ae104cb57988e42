//! Error types for the relay

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Relay error types
///
/// Only startup paths return these to the caller. Faults on individual
/// frames are logged and counted inside the worker that hit them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame store error
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration value out of range or missing
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Target host did not resolve to a usable address
    #[error("Address resolution failed for {0}")]
    AddressResolution(String),

    /// Worker thread panicked
    #[error("Thread panic in {0}")]
    ThreadPanic(&'static str),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
