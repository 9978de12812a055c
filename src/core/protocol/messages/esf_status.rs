//! ESF-STATUS: external sensor fusion status

use serde::Serialize;
use tracing::warn;

use super::{DecodeError, Fields};
use crate::core::protocol::constants::MessageId;

/// Fixed part of the payload, before the per-sensor blocks
pub const ESF_STATUS_HEADER_LEN: usize = 16;
/// One per-sensor status block
pub const SENSOR_BLOCK_LEN: usize = 4;
/// Largest sensor count that is decoded
pub const MAX_SENSORS: usize = 16;

/// Fusion mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FusionMode {
    /// Initialization, fusion not yet running
    Initializing,
    /// Sensors in use
    Fusion,
    /// Sensor use temporarily disabled
    Suspended,
    /// Sensor use disabled
    Disabled,
    /// Reserved value
    Other(u8),
}

impl From<u8> for FusionMode {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Initializing,
            1 => Self::Fusion,
            2 => Self::Suspended,
            3 => Self::Disabled,
            other => Self::Other(other),
        }
    }
}

/// Verbatim 4-byte sensor status block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorStatus {
    /// sensStatus1, sensStatus2, freq, faults
    pub raw: [u8; 4],
}

impl SensorStatus {
    /// Sensor data type
    pub fn sensor_type(&self) -> u8 {
        self.raw[0] & 0x3F
    }

    /// Sensor data used by the fusion
    pub fn used(&self) -> bool {
        self.raw[0] & 0x40 != 0
    }

    /// Sensor configuration available
    pub fn ready(&self) -> bool {
        self.raw[0] & 0x80 != 0
    }

    /// Calibration status, 0 (not calibrated) to 3 (calibrated)
    pub fn calibration_status(&self) -> u8 {
        self.raw[1] & 0x03
    }

    /// Time tagging status
    pub fn time_status(&self) -> u8 {
        (self.raw[1] >> 2) & 0x03
    }

    /// Observation frequency (Hz)
    pub fn frequency_hz(&self) -> u8 {
        self.raw[2]
    }

    /// Fault bits
    pub fn faults(&self) -> u8 {
        self.raw[3]
    }
}

/// Decoded ESF-STATUS
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct EsfStatus {
    /// GPS time of week (ms)
    pub itow_ms: u32,
    /// Message version
    pub version: u8,
    /// Fusion mode
    pub fusion_mode: FusionMode,
    /// Sensor count as stated in the payload
    pub declared_sensors: u8,
    /// Sensor blocks. `None` when the stated count exceeds [`MAX_SENSORS`].
    pub sensors: Option<Vec<SensorStatus>>,
}

impl EsfStatus {
    /// Decode an ESF-STATUS payload
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let p = Fields::new(MessageId::ESF_STATUS, payload, ESF_STATUS_HEADER_LEN)?;
        let declared = p.u8(15)?;

        let sensors = if usize::from(declared) > MAX_SENSORS {
            warn!(declared, "ESF-STATUS sensor count above limit, sensors left unset");
            None
        } else {
            let available = (p.len() - ESF_STATUS_HEADER_LEN) / SENSOR_BLOCK_LEN;
            let count = usize::from(declared).min(available);
            let mut sensors = Vec::with_capacity(count);
            for i in 0..count {
                let offset = ESF_STATUS_HEADER_LEN + i * SENSOR_BLOCK_LEN;
                let block = p.slice(offset, SENSOR_BLOCK_LEN)?;
                sensors.push(SensorStatus {
                    raw: [block[0], block[1], block[2], block[3]],
                });
            }
            Some(sensors)
        };

        Ok(Self {
            itow_ms: p.u32(0)?,
            version: p.u8(4)?,
            fusion_mode: FusionMode::from(p.u8(12)?),
            declared_sensors: declared,
            sensors,
        })
    }
}
