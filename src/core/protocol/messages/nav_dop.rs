//! NAV-DOP: dilution of precision

use serde::Serialize;

use super::{DecodeError, Fields};
use crate::core::protocol::constants::MessageId;

/// Fixed payload length
pub const NAV_DOP_LEN: usize = 18;

/// Decoded NAV-DOP. All values are raw, in units of 0.01.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct NavDop {
    /// GPS time of week (ms)
    pub itow_ms: u32,
    /// Geometric DOP
    pub gdop: u16,
    /// Position DOP
    pub pdop: u16,
    /// Time DOP
    pub tdop: u16,
    /// Vertical DOP
    pub vdop: u16,
    /// Horizontal DOP
    pub hdop: u16,
    /// Northing DOP
    pub ndop: u16,
    /// Easting DOP
    pub edop: u16,
}

impl NavDop {
    /// Decode a NAV-DOP payload
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let p = Fields::new(MessageId::NAV_DOP, payload, NAV_DOP_LEN)?;
        Ok(Self {
            itow_ms: p.u32(0)?,
            gdop: p.u16(4)?,
            pdop: p.u16(6)?,
            tdop: p.u16(8)?,
            vdop: p.u16(10)?,
            hdop: p.u16(12)?,
            ndop: p.u16(14)?,
            edop: p.u16(16)?,
        })
    }

    /// Convert a raw DOP value to a unitless figure
    pub fn scaled(raw: u16) -> f64 {
        f64::from(raw) / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode() {
        let mut payload = [0u8; NAV_DOP_LEN];
        payload[12..14].copy_from_slice(&87u16.to_le_bytes());
        payload[6..8].copy_from_slice(&156u16.to_le_bytes());
        let dop = NavDop::decode(&payload).unwrap();
        assert_eq!(dop.hdop, 87);
        assert_eq!(dop.pdop, 156);
        assert!((NavDop::scaled(dop.hdop) - 0.87).abs() < 1e-12);
    }

    #[test]
    fn test_truncated() {
        assert!(NavDop::decode(&[0u8; 12]).is_err());
    }
}
