//! # gnss-reader
//!
//! Reader for u-blox GNSS receivers speaking the binary UBX protocol
//! interleaved with NMEA text sentences:
//! - Stream resynchronization over partial reads, garbage and corrupted frames
//! - Checksum validation and length bounds
//! - Decoding of NAV-PVT, NAV-DOP, ESF-STATUS and MON-VER
//! - Poll request encoding
//! - Serial, replay and in-memory byte sources
//!
//! ## Example
//!
//! ```rust,no_run
//! use gnss_reader::{Reader, ReaderConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut reader = Reader::new(ReaderConfig::default());
//!     reader.init("/dev/ttyACM0")?;
//!
//!     while let Some(report) = reader.next_fix(true)? {
//!         println!("{:.7} {:.7}", report.fix.latitude, report.fix.longitude);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod core;

// Re-exports for convenience
pub use crate::cli::{CliResult, ExitCodes, OutputFormat};
pub use crate::config::{AppConfig, ConfigError, LoggingConfig};
pub use crate::core::protocol::{
    FrameScanner, InvalidFrame, Message, MessageId, PollSelector, RawFrame, Scanned,
    ScannerConfig, Sentence,
};
pub use crate::core::reader::{
    Classified, Event, FixReport, Reader, ReaderConfig, ReaderError, ReaderState, Status,
};
pub use crate::core::transport::{
    ByteSource, Chunk, MemorySource, ReplaySource, SerialConfig, SerialSource, TransportError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
