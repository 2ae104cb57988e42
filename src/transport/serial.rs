//! Serial transport implementation

use super::{LineRead, LineSource, read_line_from};
use crate::error::Result;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::BufReader;
use std::time::Duration;

/// Serial port line source for the NMEA/AIS receiver
pub struct SerialTransport {
    reader: BufReader<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open a serial port
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "/dev/ttyUSB0")
    /// * `baud_rate` - Baud rate (e.g., 38400 for AIS receivers)
    /// * `read_timeout` - Upper bound on one blocking read; also bounds how
    ///   long shutdown waits for the reader to notice the signal
    pub fn open(path: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(read_timeout)
            .open()?;

        log::info!("Opened serial port: {} at {} baud", path, baud_rate);

        Ok(Self {
            reader: BufReader::new(port),
        })
    }
}

impl LineSource for SerialTransport {
    fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<LineRead> {
        read_line_from(&mut self.reader, buf)
    }
}
