//! Outbound frame encoder
//!
//! `[B5][62][class][id][len LE][payload][CK_A][CK_B]`

use thiserror::Error;

use super::checksum::Checksum;
use super::constants::{MessageId, HEADER_LEN, MIN_FRAME_LEN, SYNC_CHAR_1, SYNC_CHAR_2};

/// Encoder failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// Payload does not fit the 16-bit length field
    #[error("payload of {0} bytes does not fit a frame")]
    PayloadTooLong(usize),

    /// Caller buffer cannot hold the frame
    #[error("output buffer holds {available} bytes, frame needs {needed}")]
    BufferTooSmall {
        /// Bytes the frame needs
        needed: usize,
        /// Bytes the buffer offers
        available: usize,
    },

    /// Poll selector outside the one-byte parameter range
    #[error("poll selector {0} is out of range 0..=255")]
    SelectorOutOfRange(i32),
}

/// Selector parameter of a poll request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollSelector {
    /// No parameter; the receiver answers with its default/all
    #[default]
    Default,
    /// One-byte parameter (port id, sensor index...)
    Param(u8),
}

impl PollSelector {
    /// Map the conventional integer form: any negative value means default,
    /// values above 255 are rejected
    pub fn from_raw(raw: i32) -> Result<Self, EncodeError> {
        match u8::try_from(raw) {
            Ok(param) => Ok(Self::Param(param)),
            Err(_) if raw < 0 => Ok(Self::Default),
            Err(_) => Err(EncodeError::SelectorOutOfRange(raw)),
        }
    }
}

/// Total frame length for a payload of `payload_len` bytes
pub fn frame_len(payload_len: usize) -> usize {
    MIN_FRAME_LEN + payload_len
}

/// Encode a frame into `out`, returning the number of bytes written
pub fn encode_into(msg: MessageId, payload: &[u8], out: &mut [u8]) -> Result<usize, EncodeError> {
    let len = u16::try_from(payload.len()).map_err(|_| EncodeError::PayloadTooLong(payload.len()))?;
    let needed = frame_len(payload.len());
    if out.len() < needed {
        return Err(EncodeError::BufferTooSmall {
            needed,
            available: out.len(),
        });
    }

    out[0] = SYNC_CHAR_1;
    out[1] = SYNC_CHAR_2;
    out[2] = msg.class;
    out[3] = msg.id;
    out[4..HEADER_LEN].copy_from_slice(&len.to_le_bytes());
    out[HEADER_LEN..HEADER_LEN + payload.len()].copy_from_slice(payload);

    let mut ck = Checksum::new();
    ck.update(&out[2..HEADER_LEN + payload.len()]);
    out[HEADER_LEN + payload.len()..needed].copy_from_slice(&ck.finish());

    Ok(needed)
}

/// Encode a frame into a fresh buffer
pub fn encode(msg: MessageId, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let mut out = vec![0u8; frame_len(payload.len())];
    let written = encode_into(msg, payload, &mut out)?;
    out.truncate(written);
    Ok(out)
}

/// Poll request for `msg`: empty payload, or the one-byte selector
pub fn poll_request(msg: MessageId, selector: PollSelector) -> Result<Vec<u8>, EncodeError> {
    match selector {
        PollSelector::Default => encode(msg, &[]),
        PollSelector::Param(param) => encode(msg, &[param]),
    }
}
