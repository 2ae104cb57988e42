//! NMEA 0183 / AIS sentence framing
//!
//! Sentences arrive one per line from the receiver. A line becomes a
//! [`Frame`] only if it survives trimming, the minimum length check and
//! checksum validation; everything else is expected line noise and is
//! dropped without logging.

pub mod checksum;
pub mod frame;

pub use checksum::{compute_checksum, validate};
pub use frame::{Frame, MIN_FRAME_LEN, Rejection};
