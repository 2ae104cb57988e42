//! nmea-relay - serial NMEA/AIS sentence forwarder daemon
//!
//! ```text
//! serial (/dev/ttyUSB0) ──▶ checksum ──┬──▶ UDP host:port (every frame)
//!                                      └──▶ SQLite db_packets (--use-db)
//! ```
//!
//! Exit: SIGTERM or Ctrl-C. Queued frames are flushed within the shutdown
//! grace period before the process exits.

use nmea_relay::RelayApp;
use nmea_relay::cli::{self, CliArgs, USAGE};
use nmea_relay::error::Result;

fn main() -> Result<()> {
    let args = CliArgs::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = cli::load_config(&args)?;

    // Initialize logger (RUST_LOG overrides the configured level)
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("nmea-relay v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!("Using config: {}", args.config_path());

    RelayApp::new(config).run()?;

    log::info!("nmea-relay stopped");
    Ok(())
}
