//! Network side of the relay

mod mock;
pub mod udp_sender;

pub use mock::RecordingSink;
pub use udp_sender::{DatagramSink, NetworkSender, UdpSink};
