//! Message decoder
//!
//! Reinterprets validated payloads under the fixed layouts of the known
//! messages. Every field access is bounded by the frame's validated length;
//! a payload shorter than the fixed part of a layout is rejected as
//! [`DecodeError::Truncated`] instead of being read.

mod esf_status;
mod mon_ver;
mod nav_dop;
mod nav_pvt;

pub use esf_status::{EsfStatus, FusionMode, SensorStatus, MAX_SENSORS};
pub use mon_ver::{MonVer, FIRMWARE_PREFIX};
pub use nav_dop::NavDop;
pub use nav_pvt::{FixType, NavPvt, UtcTime};

use serde::Serialize;
use thiserror::Error;

use super::constants::MessageId;
use super::frame::{InvalidFrame, RawFrame};

/// Decoder failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload shorter than the layout requires
    #[error("{msg} payload is {len} bytes, layout needs {expected}")]
    Truncated {
        /// Message identifier
        msg: MessageId,
        /// Actual payload length
        len: usize,
        /// Bytes the layout needs
        expected: usize,
    },
}

impl From<DecodeError> for InvalidFrame {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Truncated { msg, len, expected } => {
                InvalidFrame::Truncated { msg, len, expected }
            }
        }
    }
}

/// A decoded binary message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "message", rename_all = "SCREAMING-KEBAB-CASE")]
pub enum Message {
    /// Position, velocity, time solution
    NavPvt(NavPvt),
    /// Dilution of precision
    NavDop(NavDop),
    /// Sensor fusion status
    EsfStatus(EsfStatus),
    /// Version information
    MonVer(MonVer),
    /// Valid frame without a known layout
    Unknown(MessageId),
}

impl Message {
    /// Identifier of the decoded message
    pub fn message_id(&self) -> MessageId {
        match self {
            Self::NavPvt(_) => MessageId::NAV_PVT,
            Self::NavDop(_) => MessageId::NAV_DOP,
            Self::EsfStatus(_) => MessageId::ESF_STATUS,
            Self::MonVer(_) => MessageId::MON_VER,
            Self::Unknown(msg) => *msg,
        }
    }
}

/// Decode a validated frame. Unknown (class, id) pairs pass through as
/// [`Message::Unknown`].
pub fn decode(frame: &RawFrame<'_>) -> Result<Message, DecodeError> {
    let payload = frame.payload();
    match frame.message_id() {
        MessageId::NAV_PVT => NavPvt::decode(payload).map(Message::NavPvt),
        MessageId::NAV_DOP => NavDop::decode(payload).map(Message::NavDop),
        MessageId::ESF_STATUS => EsfStatus::decode(payload).map(Message::EsfStatus),
        MessageId::MON_VER => MonVer::decode(payload).map(Message::MonVer),
        other => Ok(Message::Unknown(other)),
    }
}

/// Bounded little-endian field reader over a payload
pub(crate) struct Fields<'a> {
    msg: MessageId,
    payload: &'a [u8],
}

impl<'a> Fields<'a> {
    /// Reader over `payload`, which must hold at least `min_len` bytes
    pub(crate) fn new(
        msg: MessageId,
        payload: &'a [u8],
        min_len: usize,
    ) -> Result<Self, DecodeError> {
        let fields = Self { msg, payload };
        if payload.len() < min_len {
            return Err(fields.truncated(min_len));
        }
        Ok(fields)
    }

    pub(crate) fn len(&self) -> usize {
        self.payload.len()
    }

    fn truncated(&self, expected: usize) -> DecodeError {
        DecodeError::Truncated {
            msg: self.msg,
            len: self.payload.len(),
            expected,
        }
    }

    pub(crate) fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = offset.saturating_add(len);
        self.payload.get(offset..end).ok_or_else(|| self.truncated(end))
    }

    fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N], DecodeError> {
        let bytes = self.slice(offset, N)?;
        bytes.try_into().map_err(|_| self.truncated(offset.saturating_add(N)))
    }

    pub(crate) fn u8(&self, offset: usize) -> Result<u8, DecodeError> {
        Ok(self.array::<1>(offset)?[0])
    }

    pub(crate) fn u16(&self, offset: usize) -> Result<u16, DecodeError> {
        self.array(offset).map(u16::from_le_bytes)
    }

    pub(crate) fn u32(&self, offset: usize) -> Result<u32, DecodeError> {
        self.array(offset).map(u32::from_le_bytes)
    }

    pub(crate) fn i32(&self, offset: usize) -> Result<i32, DecodeError> {
        self.array(offset).map(i32::from_le_bytes)
    }
}

/// NUL-terminated fixed-width string, lossily decoded
pub(crate) fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_passes_through() {
        let payload = [0u8; 4];
        let frame = RawFrame::new(MessageId::new(0x02, 0x15), &payload);
        assert_eq!(decode(&frame), Ok(Message::Unknown(MessageId::new(0x02, 0x15))));
    }

    #[test]
    fn test_short_known_frame_is_truncated() {
        let payload = [0u8; 10];
        let frame = RawFrame::new(MessageId::NAV_PVT, &payload);
        assert_eq!(
            decode(&frame),
            Err(DecodeError::Truncated {
                msg: MessageId::NAV_PVT,
                len: 10,
                expected: 92,
            })
        );
    }

    #[test]
    fn test_fields_bounded() {
        let payload = [1u8, 2, 3];
        let fields = Fields::new(MessageId::NAV_DOP, &payload, 0).unwrap();
        assert_eq!(fields.u16(0), Ok(0x0201));
        assert!(fields.u16(2).is_err());
        assert!(fields.u32(usize::MAX - 1).is_err());
    }

    #[test]
    fn test_c_string() {
        assert_eq!(c_string(b"ROM CORE 3.01\0\0\0"), "ROM CORE 3.01");
        assert_eq!(c_string(b"00080000"), "00080000");
    }
}
