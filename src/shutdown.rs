//! Cooperative shutdown
//!
//! A single [`ShutdownSignal`] is the only cross-cutting coordination
//! primitive. Workers poll it at their blocking points:
//!
//! ```text
//!  SIGINT/SIGTERM ──▶ ShutdownCoordinator ──fire()──▶ ShutdownSignal
//!                                                      │
//!        ┌─────────────────────────────────────────────┘
//!        ▼
//!  FrameReader stops reading ─▶ Fanout dropped ─▶ queues close
//!                                                  │
//!                 NetworkSender / PersistenceWorker drain, then exit
//! ```
//!
//! The state only moves forward: running → draining → stopped.

use crate::error::{Error, Result};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, JoinHandle};

/// Pipeline lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Running = 0,
    Draining = 1,
    Stopped = 2,
}

impl Phase {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Phase::Running,
            1 => Phase::Draining,
            _ => Phase::Stopped,
        }
    }
}

/// Single-fire shutdown token shared by every worker
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    phase: Arc<AtomicU8>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            phase: Arc::new(AtomicU8::new(Phase::Running as u8)),
        }
    }

    /// Request shutdown.
    ///
    /// Returns `true` only for the call that moved the pipeline out of
    /// `Running`; every later call is a no-op.
    pub fn fire(&self) -> bool {
        self.phase
            .compare_exchange(
                Phase::Running as u8,
                Phase::Draining as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Whether shutdown has been requested
    #[inline]
    pub fn is_fired(&self) -> bool {
        self.phase() != Phase::Running
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    /// Mark draining complete
    pub(crate) fn mark_stopped(&self) {
        self.phase.store(Phase::Stopped as u8, Ordering::SeqCst);
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Translates process termination signals into a [`ShutdownSignal`] fire
pub struct ShutdownCoordinator {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl ShutdownCoordinator {
    /// Register SIGINT/SIGTERM and spawn the listener thread
    pub fn install(signal: ShutdownSignal) -> Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        let handle = signals.handle();

        let thread = thread::Builder::new()
            .name("signal-handler".to_string())
            .spawn(move || {
                for sig in signals.forever() {
                    if signal.fire() {
                        log::info!("Received signal {}, initiating shutdown...", sig);
                    } else {
                        log::debug!("Received signal {} while already draining, ignored", sig);
                    }
                }
                log::debug!("Signal handler thread exiting");
            })
            .map_err(|e| Error::Other(format!("Failed to spawn signal handler: {}", e)))?;

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    /// Unregister the handlers and join the listener thread
    pub fn close(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            log::error!("Signal handler thread panicked");
        }
    }
}

impl Drop for ShutdownCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}
