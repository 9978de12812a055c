//! Receiver protocol
//!
//! - Frame scanner: binary frames and text sentences out of a raw byte stream
//! - Checksum (CK_A/CK_B)
//! - Message decoder for NAV-PVT, NAV-DOP, ESF-STATUS and MON-VER
//! - Request encoder for outbound frames

pub mod checksum;
pub mod constants;
pub mod encoder;
pub mod frame;
pub mod messages;
pub mod scanner;

pub use constants::MessageId;
pub use encoder::{encode, encode_into, poll_request, EncodeError, PollSelector};
pub use frame::{InvalidFrame, RawFrame, Scanned, Sentence};
pub use messages::{
    decode, DecodeError, EsfStatus, FixType, FusionMode, Message, MonVer, NavDop, NavPvt,
    SensorStatus, UtcTime,
};
pub use scanner::{FrameScanner, ScanStats, ScannerConfig, Token};
