//! Validated frame views handed out by the scanner
//!
//! Views borrow the scanner's accumulation buffer and are invalidated by the
//! next pull.

use super::constants::MessageId;
use serde::Serialize;
use std::fmt;

/// A structurally valid binary frame: length and checksum already checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame<'a> {
    msg: MessageId,
    payload: &'a [u8],
}

impl<'a> RawFrame<'a> {
    /// Wrap an already validated payload
    pub fn new(msg: MessageId, payload: &'a [u8]) -> Self {
        Self { msg, payload }
    }

    /// (class, id) pair
    pub fn message_id(&self) -> MessageId {
        self.msg
    }

    /// Message class
    pub fn class(&self) -> u8 {
        self.msg.class
    }

    /// Message id
    pub fn id(&self) -> u8 {
        self.msg.id
    }

    /// Payload bytes, exactly as long as the validated length field
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Validated payload length
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True for zero-length payloads (poll requests, acks without body)
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// A complete text sentence, from '$' through CR LF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence<'a> {
    text: &'a str,
}

impl<'a> Sentence<'a> {
    /// Build from bytes the scanner has checked to be printable ASCII.
    /// Returns `None` if the bytes are not valid UTF-8.
    pub fn from_bytes(bytes: &'a [u8]) -> Option<Self> {
        std::str::from_utf8(bytes).ok().map(|text| Self { text })
    }

    /// Full sentence including '$' and the CR LF terminator
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    /// Sentence without the terminator
    pub fn trimmed(&self) -> &'a str {
        self.text.trim_end_matches(['\r', '\n'])
    }

    /// Address field, e.g. `GNGGA` or `PUBX`
    pub fn address(&self) -> &'a str {
        let body = self.trimmed().trim_start_matches('$');
        let end = body.find([',', '*']).unwrap_or(body.len());
        &body[..end]
    }
}

/// Why a run of bytes was rejected
///
/// Returned as a classification, never as an error: the scanner has already
/// resynchronized by the time the caller sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum InvalidFrame {
    /// Bytes skipped while searching for a frame or sentence start
    Garbage {
        /// Number of bytes skipped
        bytes: usize,
    },
    /// Trailing CK_A/CK_B did not match the frame body
    ChecksumMismatch {
        /// Claimed message identifier
        msg: MessageId,
    },
    /// Length field above the configured maximum
    LengthExceeded {
        /// Claimed message identifier
        msg: MessageId,
        /// Claimed payload length
        len: usize,
    },
    /// Non-printable byte or stray start marker inside a sentence
    MalformedSentence,
    /// No terminator within the maximum sentence length
    UnterminatedSentence,
    /// Recognized message whose payload is shorter than its fixed layout
    Truncated {
        /// Message identifier
        msg: MessageId,
        /// Actual payload length
        len: usize,
        /// Minimum length the layout needs
        expected: usize,
    },
}

impl fmt::Display for InvalidFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Garbage { bytes } => write!(f, "skipped {} garbage bytes", bytes),
            Self::ChecksumMismatch { msg } => write!(f, "checksum mismatch in {}", msg),
            Self::LengthExceeded { msg, len } => {
                write!(f, "{} length {} exceeds limit", msg, len)
            }
            Self::MalformedSentence => f.write_str("malformed text sentence"),
            Self::UnterminatedSentence => f.write_str("unterminated text sentence"),
            Self::Truncated { msg, len, expected } => {
                write!(f, "{} payload {} bytes, need {}", msg, len, expected)
            }
        }
    }
}

/// One classified unit produced by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scanned<'a> {
    /// Valid binary frame
    Binary(RawFrame<'a>),
    /// Complete text sentence
    Text(Sentence<'a>),
    /// Rejected bytes
    Invalid(InvalidFrame),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_address() {
        let s = Sentence::from_bytes(b"$GNGGA,092725.00,4717.11399,N*5B\r\n").unwrap();
        assert_eq!(s.address(), "GNGGA");
        assert_eq!(s.trimmed(), "$GNGGA,092725.00,4717.11399,N*5B");
    }

    #[test]
    fn test_sentence_address_no_fields() {
        let s = Sentence::from_bytes(b"$GPTXT*00\r\n").unwrap();
        assert_eq!(s.address(), "GPTXT");
    }

    #[test]
    fn test_invalid_display() {
        let inv = InvalidFrame::ChecksumMismatch {
            msg: MessageId::NAV_PVT,
        };
        assert_eq!(inv.to_string(), "checksum mismatch in NAV-PVT");
    }
}
