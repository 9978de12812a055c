//! Reader facade
//!
//! Owns one [`ByteSource`] and one [`FrameScanner`] and drives them from a
//! single pull call. The reader is synchronous and single-threaded: nothing
//! happens between calls, and a blocking pull waits at most as long as the
//! source's own read timeout.
//!
//! ```
//! use gnss_reader::core::protocol::{encoder, MessageId};
//! use gnss_reader::core::reader::{Classified, Reader, ReaderConfig};
//! use gnss_reader::core::transport::MemorySource;
//!
//! let frame = encoder::encode(MessageId::new(0x0A, 0x99), &[1, 2]).unwrap();
//! let mut reader = Reader::new(ReaderConfig::default());
//! reader.attach(MemorySource::from_bytes(&frame, 3)).unwrap();
//!
//! match reader.pull(true) {
//!     Classified::BinaryFrame(raw) => assert_eq!(raw.payload(), &[1, 2]),
//!     other => panic!("unexpected {:?}", other.status()),
//! }
//! assert!(matches!(reader.pull(true), Classified::Closed));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::protocol::{
    decode, poll_request, EncodeError, EsfStatus, FrameScanner, InvalidFrame, Message, MessageId,
    MonVer, NavDop, NavPvt, PollSelector, RawFrame, ScanStats, Scanned, ScannerConfig, Sentence,
    Token,
};
use super::transport::{ByteSource, Chunk, SerialConfig, SerialSource, TransportError};

/// Result code of a reader operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(i32)]
pub enum Status {
    /// Success
    Ok = 0,
    /// Nothing complete available yet
    NoData = 1,
    /// Stream ended or reader closed
    Closed = 2,
    /// Bytes rejected and skipped
    InvalidFrame = 3,
    /// Device could not be opened
    TransportOpenFailure = -1,
    /// Device read failed
    TransportReadFailure = -2,
    /// Device write failed
    TransportWriteFailure = -3,
    /// `init` or `attach` on an open reader
    AlreadyOpen = -4,
    /// Operation needs an open reader
    NotOpen = -5,
    /// Request frame could not be built
    EncodeFailure = -6,
}

impl Status {
    /// Stable integer value
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Failure codes are negative
    pub fn is_error(self) -> bool {
        self.code() < 0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "ok",
            Self::NoData => "no data",
            Self::Closed => "closed",
            Self::InvalidFrame => "invalid frame",
            Self::TransportOpenFailure => "transport open failure",
            Self::TransportReadFailure => "transport read failure",
            Self::TransportWriteFailure => "transport write failure",
            Self::AlreadyOpen => "already open",
            Self::NotOpen => "not open",
            Self::EncodeFailure => "encode failure",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// Reader errors
#[derive(Error, Debug)]
pub enum ReaderError {
    /// Device open failed
    #[error("cannot open {device}: {source}")]
    Open {
        /// Device identifier
        device: String,
        /// Transport failure
        #[source]
        source: TransportError,
    },

    /// Device read failed
    #[error("read failed: {0}")]
    Read(#[source] TransportError),

    /// Device write failed
    #[error("write failed: {0}")]
    Write(#[source] TransportError),

    /// Reader already has a source
    #[error("reader is already open")]
    AlreadyOpen,

    /// Reader has no source
    #[error("reader is not open")]
    NotOpen,

    /// Stream ended
    #[error("stream closed")]
    Closed,

    /// Request frame could not be built
    #[error("cannot encode request: {0}")]
    Encode(#[from] EncodeError),
}

impl ReaderError {
    /// Status code for this error
    pub fn status(&self) -> Status {
        match self {
            Self::Open { .. } => Status::TransportOpenFailure,
            Self::Read(_) => Status::TransportReadFailure,
            Self::Write(_) => Status::TransportWriteFailure,
            Self::AlreadyOpen => Status::AlreadyOpen,
            Self::NotOpen => Status::NotOpen,
            Self::Closed => Status::Closed,
            Self::Encode(_) => Status::EncodeFailure,
        }
    }
}

/// Outcome of one pull. Borrowed views are valid until the next pull.
#[derive(Debug)]
pub enum Classified<'a> {
    /// No complete unit available
    NoData,
    /// End of stream, or the reader was closed
    Closed,
    /// Bytes rejected; the scanner has already resynchronized
    InvalidFrame(InvalidFrame),
    /// Text sentence
    TextSentence(Sentence<'a>),
    /// Validated binary frame
    BinaryFrame(RawFrame<'a>),
    /// Transport failure, reported once
    TransportError(ReaderError),
}

impl Classified<'_> {
    /// Status code for this outcome
    pub fn status(&self) -> Status {
        match self {
            Self::NoData => Status::NoData,
            Self::Closed => Status::Closed,
            Self::InvalidFrame(_) => Status::InvalidFrame,
            Self::TextSentence(_) | Self::BinaryFrame(_) => Status::Ok,
            Self::TransportError(err) => err.status(),
        }
    }
}

/// Reader lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReaderState {
    /// No source attached yet
    Idle,
    /// Source attached and readable
    Open,
    /// End of stream seen or `close` called
    Closed,
    /// Source reported a failure; waiting for `close`
    Failed,
}

/// Reader configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Serial port settings used by [`Reader::init`]
    pub serial: SerialConfig,
    /// Scanner limits
    pub scanner: ScannerConfig,
}

/// Owned, decoded unit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Event {
    /// Decoded binary message
    Message(Message),
    /// Text sentence without the terminator
    Sentence(String),
    /// Rejected bytes
    Invalid(InvalidFrame),
    /// Nothing complete available
    NoData,
    /// End of stream
    Closed,
}

/// A navigation solution with the auxiliary records received since the
/// previous one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixReport {
    /// Position, velocity, time solution
    pub fix: NavPvt,
    /// Latest dilution of precision
    pub dop: Option<NavDop>,
    /// Latest sensor fusion status
    pub fusion: Option<EsfStatus>,
    /// Latest version information
    pub version: Option<MonVer>,
}

#[derive(Debug, Default)]
struct Pending {
    dop: Option<NavDop>,
    fusion: Option<EsfStatus>,
    version: Option<MonVer>,
}

enum Drive {
    Token(Token),
    NoData,
    Closed,
    Failed(ReaderError),
}

/// GNSS receiver reader
pub struct Reader {
    config: ReaderConfig,
    scanner: FrameScanner,
    source: Option<Box<dyn ByteSource + Send>>,
    state: ReaderState,
    pending: Pending,
}

impl Reader {
    /// Create an idle reader
    pub fn new(config: ReaderConfig) -> Self {
        let scanner = FrameScanner::with_config(config.scanner);
        Self {
            config,
            scanner,
            source: None,
            state: ReaderState::Idle,
            pending: Pending::default(),
        }
    }

    /// Open the serial device `device` with the configured baud rate and timeout
    pub fn init(&mut self, device: &str) -> Result<(), ReaderError> {
        if self.state == ReaderState::Open {
            return Err(ReaderError::AlreadyOpen);
        }
        let serial = self.config.serial.clone().port(device);
        let source = SerialSource::open(serial).map_err(|source| {
            warn!(device, error = %source, "device open failed");
            ReaderError::Open {
                device: device.to_string(),
                source,
            }
        })?;
        self.attach(source)
    }

    /// Use an already opened source
    pub fn attach<S>(&mut self, source: S) -> Result<(), ReaderError>
    where
        S: ByteSource + Send + 'static,
    {
        if self.state == ReaderState::Open {
            return Err(ReaderError::AlreadyOpen);
        }
        if let Some(mut old) = self.source.take() {
            old.close();
        }
        info!(source = %source.describe(), "reader opened");
        self.source = Some(Box::new(source));
        self.scanner.reset();
        self.pending = Pending::default();
        self.state = ReaderState::Open;
        Ok(())
    }

    /// Release the source. Later pulls return [`Classified::Closed`].
    pub fn close(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.close();
            info!(source = %source.describe(), "reader closed");
        }
        self.state = ReaderState::Closed;
    }

    /// Source attached and readable
    pub fn is_open(&self) -> bool {
        self.state == ReaderState::Open
    }

    /// Lifecycle state
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Active configuration
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Scanner counters since the last open
    pub fn stats(&self) -> &ScanStats {
        self.scanner.stats()
    }

    /// Connection info of the attached source
    pub fn describe(&self) -> Option<String> {
        self.source.as_ref().map(|source| source.describe())
    }

    /// Classify the next unit.
    ///
    /// Blocking pulls keep reading until a unit is complete or the source
    /// times out. Non-blocking pulls read at most once.
    pub fn pull(&mut self, blocking: bool) -> Classified<'_> {
        match self.drive(blocking) {
            Drive::Token(token) => match self.scanner.resolve(token) {
                Scanned::Binary(frame) => Classified::BinaryFrame(frame),
                Scanned::Text(sentence) => Classified::TextSentence(sentence),
                Scanned::Invalid(invalid) => Classified::InvalidFrame(invalid),
            },
            Drive::NoData => Classified::NoData,
            Drive::Closed => Classified::Closed,
            Drive::Failed(err) => Classified::TransportError(err),
        }
    }

    fn drive(&mut self, blocking: bool) -> Drive {
        match self.state {
            ReaderState::Open => {}
            ReaderState::Idle => return Drive::Failed(ReaderError::NotOpen),
            ReaderState::Closed | ReaderState::Failed => return Drive::Closed,
        }
        let Some(source) = self.source.as_mut() else {
            self.state = ReaderState::Closed;
            return Drive::Closed;
        };

        loop {
            if let Some(token) = self.scanner.scan() {
                return Drive::Token(token);
            }
            match source.read(blocking) {
                Ok(Chunk::Data(bytes)) => {
                    self.scanner.feed(&bytes);
                    if !blocking {
                        return self.scanner.scan().map_or(Drive::NoData, Drive::Token);
                    }
                }
                Ok(Chunk::Empty) => return Drive::NoData,
                Ok(Chunk::EndOfStream) => {
                    info!(
                        source = %source.describe(),
                        discarded = self.scanner.buffered(),
                        "end of stream"
                    );
                    source.close();
                    self.source = None;
                    self.state = ReaderState::Closed;
                    return Drive::Closed;
                }
                Err(err) => {
                    warn!(source = %source.describe(), error = %err, "read failed");
                    self.state = ReaderState::Failed;
                    return Drive::Failed(ReaderError::Read(err));
                }
            }
        }
    }

    /// Write a pre-encoded frame. A reply arrives through later pulls.
    pub fn push(&mut self, frame: &[u8]) -> Result<(), ReaderError> {
        if self.state != ReaderState::Open {
            return Err(ReaderError::NotOpen);
        }
        let source = self.source.as_mut().ok_or(ReaderError::NotOpen)?;
        source.write(frame).map_err(|err| {
            warn!(error = %err, len = frame.len(), "write failed");
            ReaderError::Write(err)
        })?;
        debug!(len = frame.len(), "frame written");
        Ok(())
    }

    /// Send a poll request for `msg`
    pub fn poll(&mut self, msg: MessageId, selector: PollSelector) -> Result<(), ReaderError> {
        let frame = poll_request(msg, selector)?;
        debug!(%msg, ?selector, "polling");
        self.push(&frame)
    }

    /// Pull and decode one unit into an owned [`Event`]
    pub fn next_message(&mut self, blocking: bool) -> Result<Event, ReaderError> {
        let event = match self.pull(blocking) {
            Classified::NoData => Event::NoData,
            Classified::Closed => Event::Closed,
            Classified::InvalidFrame(invalid) => Event::Invalid(invalid),
            Classified::TextSentence(sentence) => Event::Sentence(sentence.trimmed().to_string()),
            Classified::BinaryFrame(frame) => match decode(&frame) {
                Ok(message) => Event::Message(message),
                Err(err) => {
                    warn!(error = %err, "undecodable frame");
                    Event::Invalid(InvalidFrame::from(err))
                }
            },
            Classified::TransportError(err) => return Err(err),
        };
        Ok(event)
    }

    /// Pull until a NAV-PVT arrives.
    ///
    /// NAV-DOP, ESF-STATUS and MON-VER records seen on the way are kept
    /// (latest wins) and attached to the report. `Ok(None)` means no complete
    /// unit was available.
    pub fn next_fix(&mut self, blocking: bool) -> Result<Option<FixReport>, ReaderError> {
        loop {
            match self.next_message(blocking)? {
                Event::Message(Message::NavPvt(fix)) => {
                    let Pending { dop, fusion, version } = std::mem::take(&mut self.pending);
                    return Ok(Some(FixReport {
                        fix,
                        dop,
                        fusion,
                        version,
                    }));
                }
                Event::Message(Message::NavDop(dop)) => self.pending.dop = Some(dop),
                Event::Message(Message::EsfStatus(status)) => self.pending.fusion = Some(status),
                Event::Message(Message::MonVer(version)) => self.pending.version = Some(version),
                Event::Message(Message::Unknown(_)) | Event::Sentence(_) | Event::Invalid(_) => {}
                Event::NoData => return Ok(None),
                Event::Closed => return Err(ReaderError::Closed),
            }
        }
    }
}

impl Drop for Reader {
    fn drop(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.close();
        }
    }
}
