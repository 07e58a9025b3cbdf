//! Byte transports used to mirror display fields to external devices.

mod serial;

use std::io;

use thiserror::Error;

pub use serial::{DEFAULT_BAUD_RATE, SerialTransport};

/// A relay write failed. The display path carries on without it.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The port could not be opened.
    #[error("cannot open {port}: {source}")]
    Open {
        /// The port name.
        port: String,
        /// The underlying cause.
        #[source]
        source: io::Error,
    },
    /// The port was opened but could not be configured.
    #[error("cannot configure {port}: {reason}")]
    Configure {
        /// The port name.
        port: String,
        /// Why the configuration was rejected.
        reason: String,
    },
    /// Writing the bytes failed.
    #[error("cannot write to {port}: {source}")]
    Write {
        /// The port name.
        port: String,
        /// The underlying cause.
        #[source]
        source: io::Error,
    },
}

/// A capability to write raw bytes to a named port.
///
/// Implementations should treat every call as independent: a failed
/// write must not affect later writes to the same or other ports.
pub trait Transport: Send + Sync {
    /// Writes `bytes` to `port`.
    ///
    /// The returned future owns the payload and must be fully independent
    /// of `self`, so writes to several ports can be in flight together.
    fn write(
        &self,
        port: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send + 'static;
}
