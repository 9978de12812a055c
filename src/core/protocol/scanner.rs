//! Frame scanner
//!
//! Turns an arbitrary byte stream into validated, classified units. Bytes are
//! accumulated in a `BytesMut`; every unit starts at offset 0 once the buffer
//! has been compacted, so a classification only has to remember lengths.
//!
//! Scanning states, resumable across calls:
//! - searching for a sync pair (`B5 62`) or a sentence start (`$`)
//! - binary header pending: class, id and LE length
//! - binary payload pending: `length` bytes plus CK_A/CK_B
//! - sentence pending: printable ASCII up to CR LF
//!
//! Non-marker bytes form a garbage run that is reported once, when a marker
//! ends it. Garbage that follows an already reported invalid frame is folded
//! into that report. The resulting sequence of classifications depends only
//! on the bytes, never on how they were chunked.
//!
//! ```
//! use gnss_reader::core::protocol::{encoder, FrameScanner, MessageId, Scanned};
//!
//! let frame = encoder::encode(MessageId::MON_VER, &[]).unwrap();
//! let mut scanner = FrameScanner::new();
//! scanner.feed(&frame[..3]);
//! assert!(scanner.next().is_none());
//! scanner.feed(&frame[3..]);
//! match scanner.next() {
//!     Some(Scanned::Binary(f)) => assert_eq!(f.message_id(), MessageId::MON_VER),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use bytes::{Buf, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::checksum;
use super::constants::{
    MessageId, CHECKSUM_LEN, CLASS_OFFSET, DEFAULT_MAX_PAYLOAD_LEN, DEFAULT_MAX_SENTENCE_LEN,
    HEADER_LEN, ID_OFFSET, LENGTH_OFFSET, MIN_SENTENCE_LEN, SENTENCE_END, SENTENCE_START,
    SYNC_CHAR_1, SYNC_CHAR_2,
};
use super::frame::{InvalidFrame, RawFrame, Scanned, Sentence};

const INITIAL_CAPACITY: usize = 4 * 1024;

/// Scanner limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Largest accepted binary payload length field
    pub max_payload_len: usize,
    /// Longest accepted sentence, '$' through CR LF
    pub max_sentence_len: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
            max_sentence_len: DEFAULT_MAX_SENTENCE_LEN,
        }
    }
}

/// Scanner counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Bytes fed into the scanner
    pub bytes_fed: u64,
    /// Valid binary frames
    pub binary_frames: u64,
    /// Complete text sentences
    pub text_sentences: u64,
    /// Invalid frame classifications (garbage runs included)
    pub invalid_frames: u64,
    /// Bytes discarded while searching for a marker
    pub garbage_bytes: u64,
}

/// A classified unit at the front of the buffer.
///
/// Resolve it with [`FrameScanner::resolve`] before the next `feed` or `scan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Binary frame with `len` payload bytes
    Binary {
        /// Message identifier
        msg: MessageId,
        /// Payload length
        len: usize,
    },
    /// Sentence of `len` bytes including the terminator
    Text {
        /// Sentence length
        len: usize,
    },
    /// Rejected bytes, already skipped
    Invalid(InvalidFrame),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GarbageRun {
    None,
    Unreported(usize),
    Reported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Sync(usize),
    Text(usize),
    /// Possible sync start as the very last buffered byte
    Partial(usize),
    None,
}

/// Stream demultiplexer for binary frames and text sentences
pub struct FrameScanner {
    buffer: BytesMut,
    /// Length of the unit handed out last; dropped on the next scan or feed
    consumed: usize,
    garbage: GarbageRun,
    config: ScannerConfig,
    stats: ScanStats,
}

impl Default for FrameScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScanner {
    /// Scanner with default limits
    pub fn new() -> Self {
        Self::with_config(ScannerConfig::default())
    }

    /// Scanner with custom limits
    pub fn with_config(config: ScannerConfig) -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_CAPACITY),
            consumed: 0,
            garbage: GarbageRun::None,
            config,
            stats: ScanStats::default(),
        }
    }

    /// Active limits
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Counters since creation or the last reset
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Bytes buffered and not yet classified
    pub fn buffered(&self) -> usize {
        self.buffer.len() - self.consumed
    }

    /// Drop all buffered bytes and counters
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.consumed = 0;
        self.garbage = GarbageRun::None;
        self.stats = ScanStats::default();
    }

    /// Append bytes from the transport
    pub fn feed(&mut self, data: &[u8]) {
        self.compact();
        self.buffer.extend_from_slice(data);
        self.stats.bytes_fed += data.len() as u64;
    }

    /// Classify the next unit and borrow it from the buffer.
    ///
    /// `None` means more bytes are needed.
    pub fn next(&mut self) -> Option<Scanned<'_>> {
        let token = self.scan()?;
        Some(self.resolve(token))
    }

    /// Classify the next unit without borrowing the buffer.
    ///
    /// `None` means more bytes are needed.
    pub fn scan(&mut self) -> Option<Token> {
        self.compact();

        let at = match find_marker(&self.buffer) {
            Marker::None => {
                self.skip_garbage(self.buffer.len());
                return None;
            }
            Marker::Partial(at) => {
                self.skip_garbage(at);
                return None;
            }
            Marker::Sync(at) | Marker::Text(at) => at,
        };
        self.skip_garbage(at);

        match self.garbage {
            GarbageRun::Unreported(bytes) => {
                self.garbage = GarbageRun::None;
                self.stats.invalid_frames += 1;
                trace!(bytes, "garbage run ended");
                return Some(Token::Invalid(InvalidFrame::Garbage { bytes }));
            }
            GarbageRun::Reported => self.garbage = GarbageRun::None,
            GarbageRun::None => {}
        }

        if self.buffer[0] == SENTENCE_START {
            self.scan_sentence()
        } else {
            self.scan_binary()
        }
    }

    /// Borrow the unit described by `token` from the buffer
    pub fn resolve(&self, token: Token) -> Scanned<'_> {
        match token {
            Token::Binary { msg, len } => {
                Scanned::Binary(RawFrame::new(msg, &self.buffer[HEADER_LEN..HEADER_LEN + len]))
            }
            Token::Text { len } => match Sentence::from_bytes(&self.buffer[..len]) {
                Some(sentence) => Scanned::Text(sentence),
                None => Scanned::Invalid(InvalidFrame::MalformedSentence),
            },
            Token::Invalid(invalid) => Scanned::Invalid(invalid),
        }
    }

    fn compact(&mut self) {
        if self.consumed > 0 {
            self.buffer.advance(self.consumed);
            self.consumed = 0;
        }
    }

    fn skip_garbage(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.buffer.advance(count);
        self.stats.garbage_bytes += count as u64;
        self.garbage = match self.garbage {
            GarbageRun::None => GarbageRun::Unreported(count),
            GarbageRun::Unreported(run) => GarbageRun::Unreported(run + count),
            GarbageRun::Reported => GarbageRun::Reported,
        };
    }

    /// Reject the unit at the front, resynchronizing one byte further on
    fn reject(&mut self, invalid: InvalidFrame) -> Token {
        self.consumed = 1;
        self.garbage = GarbageRun::Reported;
        self.stats.invalid_frames += 1;
        Token::Invalid(invalid)
    }

    fn scan_binary(&mut self) -> Option<Token> {
        if self.buffer.len() < HEADER_LEN {
            return None;
        }

        let msg = MessageId::new(self.buffer[CLASS_OFFSET], self.buffer[ID_OFFSET]);
        let len = usize::from(u16::from_le_bytes([
            self.buffer[LENGTH_OFFSET],
            self.buffer[LENGTH_OFFSET + 1],
        ]));

        if len > self.config.max_payload_len {
            warn!(%msg, len, max = self.config.max_payload_len, "payload length out of bounds");
            return Some(self.reject(InvalidFrame::LengthExceeded { msg, len }));
        }

        let end = HEADER_LEN + len;
        if self.buffer.len() < end + CHECKSUM_LEN {
            return None;
        }

        let trailer = [self.buffer[end], self.buffer[end + 1]];
        if !checksum::verify(&self.buffer[CLASS_OFFSET..end], trailer) {
            warn!(%msg, len, "checksum mismatch");
            return Some(self.reject(InvalidFrame::ChecksumMismatch { msg }));
        }

        debug!(%msg, len, "binary frame");
        self.consumed = end + CHECKSUM_LEN;
        self.stats.binary_frames += 1;
        Some(Token::Binary { msg, len })
    }

    fn scan_sentence(&mut self) -> Option<Token> {
        let limit = self.config.max_sentence_len;
        let window = &self.buffer[..self.buffer.len().min(limit)];
        let [cr, lf] = SENTENCE_END;

        for i in 1..window.len() {
            let byte = window[i];
            if window[i - 1] == cr {
                if byte != lf {
                    return Some(self.reject(InvalidFrame::MalformedSentence));
                }
                let len = i + 1;
                if len < MIN_SENTENCE_LEN {
                    return Some(self.reject(InvalidFrame::MalformedSentence));
                }
                trace!(len, "text sentence");
                self.consumed = len;
                self.stats.text_sentences += 1;
                return Some(Token::Text { len });
            }
            let printable = (0x20..=0x7E).contains(&byte) && byte != SENTENCE_START;
            if byte != cr && !printable {
                return Some(self.reject(InvalidFrame::MalformedSentence));
            }
        }

        if window.len() >= limit {
            debug!(limit, "sentence without terminator");
            return Some(self.reject(InvalidFrame::UnterminatedSentence));
        }
        None
    }
}

fn find_marker(buf: &[u8]) -> Marker {
    for (i, &byte) in buf.iter().enumerate() {
        match byte {
            SENTENCE_START => return Marker::Text(i),
            SYNC_CHAR_1 => match buf.get(i + 1) {
                Some(&SYNC_CHAR_2) => return Marker::Sync(i),
                None => return Marker::Partial(i),
                Some(_) => {}
            },
            _ => {}
        }
    }
    Marker::None
}
