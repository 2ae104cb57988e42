//! UDP forwarding of validated frames
//!
//! Each frame goes out as exactly one datagram, byte-identical to the
//! validated sentence (no length prefix, no line ending). Delivery is
//! at-most-once: a failed send is logged and counted, and the sender moves
//! on to the next queued frame. There is no retry and no re-queue.

use crate::error::{Error, Result};
use crate::nmea::Frame;
use crate::pipeline::{PipelineStats, QueueReceiver};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;

/// Connectionless write-only sink
pub trait DatagramSink: Send {
    /// Send one datagram, returns number of bytes written
    fn send(&mut self, datagram: &[u8]) -> Result<usize>;
}

/// UDP socket connected to the relay target
pub struct UdpSink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpSink {
    /// Resolve `host:port` and connect an ephemeral UDP socket to it
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let endpoint = format!("{}:{}", host, port);
        let target = endpoint
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::AddressResolution(endpoint.clone()))?;

        // Bind to any available port of the matching family (we only send)
        let bind_addr = if target.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.connect(target)?;

        log::info!("UDP sink connected to {} (resolved from {})", target, endpoint);
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl DatagramSink for UdpSink {
    fn send(&mut self, datagram: &[u8]) -> Result<usize> {
        Ok(self.socket.send(datagram)?)
    }
}

/// Drains the network queue into the datagram sink
pub struct NetworkSender<D: DatagramSink> {
    sink: D,
    queue: QueueReceiver<Frame>,
    stats: Arc<PipelineStats>,
}

impl<D: DatagramSink> NetworkSender<D> {
    pub fn new(sink: D, queue: QueueReceiver<Frame>, stats: Arc<PipelineStats>) -> Self {
        Self { sink, queue, stats }
    }

    /// Forward every queued frame until the queue is closed and drained
    pub fn run(mut self) {
        log::info!("Network sender started");

        while let Some(frame) = self.queue.dequeue() {
            match self.sink.send(frame.as_bytes()) {
                Ok(_) => {
                    PipelineStats::bump(&self.stats.datagrams_sent);
                    log::trace!("Tx: {}", frame.to_text());
                }
                Err(e) => {
                    // Not fatal - drop this frame and keep going
                    PipelineStats::bump(&self.stats.send_failures);
                    log::warn!("Failed to send frame: {}", e);
                }
            }
        }

        if !self.queue.is_empty() {
            let left = self.queue.len() as u64;
            self.stats
                .abandoned
                .fetch_add(left, std::sync::atomic::Ordering::Relaxed);
            log::warn!("Abandoned {} frames in the {} queue", left, self.queue.name());
        }
        log::info!("Network sender stopped");
    }
}
