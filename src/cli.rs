//! Command line handling
//!
//! Supports:
//! - `nmea-relay <path>` (positional config path)
//! - `nmea-relay --config <path>` / `-c <path>`
//! - overrides applied on top of the file:
//!   `--serialport <path>`, `--baud <n>`, `--host <host>`, `--port <n>`,
//!   `--db-file <path>`, `--use-db`, `--no-db`
//!
//! Defaults to `/etc/nmea-relay.toml` if no config path is given.

use crate::config::AppConfig;
use crate::error::{Error, Result};

/// Config file used when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "/etc/nmea-relay.toml";

pub const USAGE: &str = "\
Usage: nmea-relay [OPTIONS] [CONFIG]

Options:
    -c, --config <FILE>     Configuration file (default: /etc/nmea-relay.toml)
        --serialport <PATH> Serial port path
        --baud <N>          Serial baud rate
        --host <HOST>       Target host (IP or domain name)
        --port <N>          Target UDP port
        --db-file <PATH>    SQLite database file
        --use-db            Store every validated frame
        --no-db             Do not store frames
    -h, --help              Print this help";

/// Parsed command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    /// Explicit config path, if any
    pub config_path: Option<String>,
    pub help: bool,
    pub serial_port: Option<String>,
    pub baud_rate: Option<u32>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub db_file: Option<String>,
    pub use_db: Option<bool>,
}

impl CliArgs {
    /// Parse arguments (without the program name)
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "-c" | "--config" => parsed.config_path = Some(value(&arg, args.next())?),
                "--serialport" => parsed.serial_port = Some(value(&arg, args.next())?),
                "--baud" => parsed.baud_rate = Some(number(&arg, args.next())?),
                "--host" => parsed.host = Some(value(&arg, args.next())?),
                "--port" => parsed.port = Some(number(&arg, args.next())?),
                "--db-file" => parsed.db_file = Some(value(&arg, args.next())?),
                "--use-db" => parsed.use_db = Some(true),
                "--no-db" => parsed.use_db = Some(false),
                other if !other.starts_with('-') && parsed.config_path.is_none() => {
                    parsed.config_path = Some(other.to_string());
                }
                other => {
                    return Err(Error::InvalidConfig(format!("unknown argument: {}", other)));
                }
            }
        }

        Ok(parsed)
    }

    /// Config path to load, falling back to the default location
    pub fn config_path(&self) -> &str {
        self.config_path.as_deref().unwrap_or(DEFAULT_CONFIG_PATH)
    }

    /// Apply command line overrides on top of a loaded config
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(port) = &self.serial_port {
            config.serial.port = port.clone();
        }
        if let Some(baud) = self.baud_rate {
            config.serial.baud_rate = baud;
        }
        if let Some(host) = &self.host {
            config.network.host = host.clone();
        }
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if let Some(path) = &self.db_file {
            config.storage.path = path.clone();
        }
        if let Some(enabled) = self.use_db {
            config.storage.enabled = enabled;
        }
    }
}

/// Load the config file named on the command line, then apply overrides.
///
/// A missing file is only tolerated for the default path, so the relay can
/// run from flags alone. Runs before the logger exists, so it does not log.
pub fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let path = args.config_path();
    let mut config = match AppConfig::from_file(path) {
        Ok(config) => config,
        Err(Error::Io(e))
            if args.config_path.is_none() && e.kind() == std::io::ErrorKind::NotFound =>
        {
            AppConfig::default()
        }
        Err(e) => return Err(e),
    };
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn value(flag: &str, next: Option<String>) -> Result<String> {
    next.ok_or_else(|| Error::InvalidConfig(format!("{} requires a value", flag)))
}

fn number<T: std::str::FromStr>(flag: &str, next: Option<String>) -> Result<T> {
    let raw = value(flag, next)?;
    raw.parse()
        .map_err(|_| Error::InvalidConfig(format!("{}: invalid number '{}'", flag, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_no_args() {
        let args = CliArgs::parse(Vec::<String>::new()).unwrap();
        assert_eq!(args, CliArgs::default());
        assert_eq!(args.config_path(), DEFAULT_CONFIG_PATH);
    }

    #[test]
    fn test_config_flag_and_positional() {
        let args = CliArgs::parse(["--config", "relay.toml"]).unwrap();
        assert_eq!(args.config_path(), "relay.toml");

        let args = CliArgs::parse(["-c", "relay.toml"]).unwrap();
        assert_eq!(args.config_path(), "relay.toml");

        let args = CliArgs::parse(["relay.toml"]).unwrap();
        assert_eq!(args.config_path(), "relay.toml");
    }

    #[test]
    fn test_overrides_apply() {
        let args = CliArgs::parse([
            "--serialport",
            "/dev/ttyAMA0",
            "--baud",
            "4800",
            "--host",
            "127.0.0.1",
            "--port",
            "10110",
            "--db-file",
            "/tmp/x.db",
            "--use-db",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.serial.port, "/dev/ttyAMA0");
        assert_eq!(config.serial.baud_rate, 4800);
        assert_eq!(config.network.host, "127.0.0.1");
        assert_eq!(config.network.port, 10110);
        assert_eq!(config.storage.path, "/tmp/x.db");
        assert!(config.storage.enabled);
    }

    #[test]
    fn test_bad_arguments() {
        assert!(CliArgs::parse(["--baud"]).is_err());
        assert!(CliArgs::parse(["--port", "seventy"]).is_err());
        assert!(CliArgs::parse(["--port", "70000"]).is_err());
        assert!(CliArgs::parse(["--bogus"]).is_err());
    }

    #[test]
    fn test_load_config_from_file_with_override() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[network]\nhost = \"10.0.0.1\"\nport = 9000").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = CliArgs::parse([
            "--config".to_string(),
            path,
            "--port".to_string(),
            "9001".to_string(),
        ])
        .unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.network.host, "10.0.0.1");
        assert_eq!(config.network.port, 9001);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let args = CliArgs::parse(["--config", "/nonexistent/nmea-relay.toml"]).unwrap();
        assert!(load_config(&args).is_err());
    }
}
