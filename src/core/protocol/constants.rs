//! Wire constants for the binary (UBX) and text (NMEA 0183) protocols

use serde::Serialize;
use std::fmt;

// ============ Binary framing ============

/// First sync byte of a binary frame
pub const SYNC_CHAR_1: u8 = 0xB5;
/// Second sync byte of a binary frame
pub const SYNC_CHAR_2: u8 = 0x62;

/// Sync (2) + class (1) + id (1) + length (2)
pub const HEADER_LEN: usize = 6;
/// CK_A + CK_B
pub const CHECKSUM_LEN: usize = 2;
/// Smallest possible binary frame (empty payload)
pub const MIN_FRAME_LEN: usize = HEADER_LEN + CHECKSUM_LEN;

pub(crate) const CLASS_OFFSET: usize = 2;
pub(crate) const ID_OFFSET: usize = 3;
pub(crate) const LENGTH_OFFSET: usize = 4;

/// Default upper bound for a binary payload length field
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 2048;

// ============ Text sentences ============

/// Start of a text sentence ('$')
pub const SENTENCE_START: u8 = b'$';
/// Sentence terminator, CR LF
pub const SENTENCE_END: [u8; 2] = [b'\r', b'\n'];
/// Maximum sentence length including '$' and CR LF
pub const DEFAULT_MAX_SENTENCE_LEN: usize = 82;
/// '$' + talker (2) + type (3) + CR LF
pub const MIN_SENTENCE_LEN: usize = 8;

// ============ Message classes ============

/// Navigation results
pub const CLASS_NAV: u8 = 0x01;
/// Monitoring
pub const CLASS_MON: u8 = 0x0A;
/// External sensor fusion
pub const CLASS_ESF: u8 = 0x10;

/// Binary message identifier: a (class, id) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MessageId {
    /// Message class
    pub class: u8,
    /// Message id within the class
    pub id: u8,
}

impl MessageId {
    /// Navigation position/velocity/time solution
    pub const NAV_PVT: Self = Self::new(CLASS_NAV, 0x07);
    /// Dilution of precision
    pub const NAV_DOP: Self = Self::new(CLASS_NAV, 0x04);
    /// Sensor fusion status
    pub const ESF_STATUS: Self = Self::new(CLASS_ESF, 0x10);
    /// Receiver and software version
    pub const MON_VER: Self = Self::new(CLASS_MON, 0x04);

    /// Build an identifier from raw class and id bytes
    pub const fn new(class: u8, id: u8) -> Self {
        Self { class, id }
    }

    /// Short name of a known message, `None` otherwise
    pub fn name(&self) -> Option<&'static str> {
        match *self {
            Self::NAV_PVT => Some("NAV-PVT"),
            Self::NAV_DOP => Some("NAV-DOP"),
            Self::ESF_STATUS => Some("ESF-STATUS"),
            Self::MON_VER => Some("MON-VER"),
            _ => None,
        }
    }

    /// Whether the decoder has a layout for this pair
    pub fn is_known(&self) -> bool {
        self.name().is_some()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:02X}-0x{:02X}", self.class, self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(MessageId::NAV_PVT.to_string(), "NAV-PVT");
        assert_eq!(MessageId::new(0x0A, 0x99).to_string(), "0x0A-0x99");
    }

    #[test]
    fn test_known() {
        assert!(MessageId::MON_VER.is_known());
        assert!(!MessageId::new(0x02, 0x15).is_known());
    }
}
