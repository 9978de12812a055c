//! Core module containing the receiver reader
//!
//! This module provides:
//! - Frame scanner, checksum, message decoder and request encoder for the
//!   u-blox binary protocol interleaved with NMEA text sentences
//! - Byte sources: serial port, capture replay, scripted memory
//! - Reader facade with status codes and fix-report aggregation

pub mod protocol;
pub mod reader;
pub mod transport;
