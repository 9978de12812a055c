//! Byte sources for the reader
//!
//! Supports:
//! - Serial ports (USB CDC-ACM, UART)
//! - Replay of captured streams from any reader
//! - Scripted in-memory streams

mod memory;
mod replay;
mod serial;

pub use memory::{MemorySource, WriteLog};
pub use replay::{ReplaySource, DEFAULT_REPLAY_CHUNK};
pub use serial::{list_ports, SerialConfig, SerialSource};

use bytes::Bytes;
use thiserror::Error;

/// Transport error types
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Port not found
    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Not connected
    #[error("Not connected")]
    NotConnected,

    /// Disconnected
    #[error("Disconnected")]
    Disconnected,

    /// Send error
    #[error("Send error: {0}")]
    SendError(String),
}

/// Result of one read from a [`ByteSource`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Bytes received
    Data(Bytes),
    /// Nothing available now (non-blocking) or the blocking read timed out
    Empty,
    /// The source will never produce more bytes
    EndOfStream,
}

/// Raw byte source/sink the reader pulls from
#[cfg_attr(test, mockall::automock)]
pub trait ByteSource {
    /// Read whatever is available.
    ///
    /// With `blocking` set, wait up to the source's own timeout for at least
    /// one byte; otherwise return [`Chunk::Empty`] immediately when idle.
    fn read(&mut self, blocking: bool) -> Result<Chunk, TransportError>;

    /// Write all of `data`
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Release the underlying handle. Safe to call more than once.
    fn close(&mut self);

    /// Connection info string
    fn describe(&self) -> String;
}
