//! MON-VER: receiver and software version

use serde::Serialize;

use super::{c_string, DecodeError, Fields};
use crate::core::protocol::constants::MessageId;

const SW_VERSION_LEN: usize = 30;
const HW_VERSION_LEN: usize = 10;
/// Software + hardware version strings
pub const MON_VER_HEADER_LEN: usize = SW_VERSION_LEN + HW_VERSION_LEN;
/// One extension string
pub const EXTENSION_LEN: usize = 30;
/// Extension key carrying the firmware version
pub const FIRMWARE_PREFIX: &str = "FWVER=";

/// Decoded MON-VER
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct MonVer {
    /// Software version string
    pub software_version: String,
    /// Hardware version string
    pub hardware_version: String,
    /// Value of the first `FWVER=` extension
    pub firmware_version: Option<String>,
    /// All extension strings, in order
    pub extensions: Vec<String>,
}

impl MonVer {
    /// Decode a MON-VER payload
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let p = Fields::new(MessageId::MON_VER, payload, MON_VER_HEADER_LEN)?;

        let software_version = c_string(p.slice(0, SW_VERSION_LEN)?);
        let hardware_version = c_string(p.slice(SW_VERSION_LEN, HW_VERSION_LEN)?);

        let count = (p.len() - MON_VER_HEADER_LEN) / EXTENSION_LEN;
        let mut extensions = Vec::with_capacity(count);
        for i in 0..count {
            let raw = p.slice(MON_VER_HEADER_LEN + i * EXTENSION_LEN, EXTENSION_LEN)?;
            extensions.push(c_string(raw));
        }

        let firmware_version = extensions
            .iter()
            .find_map(|ext| ext.strip_prefix(FIRMWARE_PREFIX))
            .map(str::to_owned);

        Ok(Self {
            software_version,
            hardware_version,
            firmware_version,
            extensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(text: &str, len: usize) -> Vec<u8> {
        let mut out = text.as_bytes().to_vec();
        out.resize(len, 0);
        out
    }

    fn payload(extensions: &[&str]) -> Vec<u8> {
        let mut p = field("ROM CORE 3.01 (107888)", SW_VERSION_LEN);
        p.extend(field("00080000", HW_VERSION_LEN));
        for ext in extensions {
            p.extend(field(ext, EXTENSION_LEN));
        }
        p
    }

    #[test]
    fn test_firmware_prefix() {
        let ver = MonVer::decode(&payload(&["PROTVER=18.00", "FWVER=1.00 (abcd12)"])).unwrap();
        assert_eq!(ver.software_version, "ROM CORE 3.01 (107888)");
        assert_eq!(ver.hardware_version, "00080000");
        assert_eq!(ver.firmware_version.as_deref(), Some("1.00 (abcd12)"));
        assert_eq!(ver.extensions.len(), 2);
    }

    #[test]
    fn test_first_match_wins() {
        let ver = MonVer::decode(&payload(&["FWVER=ADR 4.21", "FWVER=SPG 3.01"])).unwrap();
        assert_eq!(ver.firmware_version.as_deref(), Some("ADR 4.21"));
    }

    #[test]
    fn test_no_firmware_extension() {
        let ver = MonVer::decode(&payload(&["PROTVER=18.00", "GPS;GLO;GAL;BDS"])).unwrap();
        assert_eq!(ver.firmware_version, None);
    }

    #[test]
    fn test_partial_extension_ignored() {
        let mut p = payload(&["PROTVER=18.00"]);
        p.extend_from_slice(b"FWVER=cut");
        let ver = MonVer::decode(&p).unwrap();
        assert_eq!(ver.extensions, vec!["PROTVER=18.00".to_string()]);
        assert_eq!(ver.firmware_version, None);
    }

    #[test]
    fn test_header_only() {
        let ver = MonVer::decode(&payload(&[])).unwrap();
        assert!(ver.extensions.is_empty());
    }
}
