//! Serial port byte source

use super::{ByteSource, Chunk, TransportError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortInfo, StopBits};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::{debug, info};

const READ_CHUNK: usize = 4096;

/// Serial port configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port name (e.g., /dev/ttyACM0, COM3)
    #[serde(rename = "path")]
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Blocking read timeout in milliseconds
    pub timeout_ms: u64,
}

impl SerialConfig {
    /// Create a new serial configuration with default settings
    pub fn new(port: &str, baud_rate: u32) -> Self {
        Self {
            port: port.to_string(),
            baud_rate,
            timeout_ms: 1000,
        }
    }

    /// Set the blocking read timeout
    #[must_use]
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the port
    #[must_use]
    pub fn port(mut self, port: &str) -> Self {
        self.port = port.to_string();
        self
    }

    /// Set the baud rate
    #[must_use]
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new("/dev/ttyACM0", 115200)
    }
}

/// Receiver connected over a serial port, 8N1 without flow control
pub struct SerialSource {
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
    buffer: Vec<u8>,
}

impl SerialSource {
    /// Open the configured port
    pub fn open(config: SerialConfig) -> Result<Self, TransportError> {
        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(config.timeout_ms))
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => {
                    TransportError::PortNotFound(config.port.clone())
                }
                serialport::ErrorKind::Io(std::io::ErrorKind::NotFound) => {
                    TransportError::PortNotFound(config.port.clone())
                }
                serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
                    TransportError::PermissionDenied(config.port.clone())
                }
                _ => TransportError::ConnectionFailed(e.to_string()),
            })?;

        info!(port = %config.port, baud = config.baud_rate, "serial port opened");

        Ok(Self {
            config,
            port: Some(port),
            buffer: vec![0u8; READ_CHUNK],
        })
    }

    /// Active configuration
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl ByteSource for SerialSource {
    fn read(&mut self, blocking: bool) -> Result<Chunk, TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotConnected)?;

        let want = if blocking {
            self.buffer.len()
        } else {
            let waiting = port
                .bytes_to_read()
                .map_err(|e| TransportError::IoError(e.into()))? as usize;
            if waiting == 0 {
                return Ok(Chunk::Empty);
            }
            waiting.min(self.buffer.len())
        };

        match port.read(&mut self.buffer[..want]) {
            Ok(0) => Ok(Chunk::EndOfStream),
            Ok(n) => Ok(Chunk::Data(Bytes::copy_from_slice(&self.buffer[..n]))),
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => {
                // No data before the timeout
                Ok(Chunk::Empty)
            }
            Err(e) => Err(TransportError::IoError(e)),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::Disconnected)?;
        port.write_all(data).map_err(TransportError::IoError)?;
        port.flush().map_err(TransportError::IoError)?;
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!(port = %self.config.port, "serial port released");
        }
    }

    fn describe(&self) -> String {
        format!("{} @ {} baud (8N1)", self.config.port, self.config.baud_rate)
    }
}

/// List available serial ports
pub fn list_ports() -> Result<Vec<SerialPortInfo>, TransportError> {
    serialport::available_ports().map_err(|e| TransportError::IoError(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = SerialConfig::default().port("/dev/ttyUSB1").baud_rate(38400).timeout_ms(250);
        assert_eq!(config.port, "/dev/ttyUSB1");
        assert_eq!(config.baud_rate, 38400);
        assert_eq!(config.timeout_ms, 250);
    }

    #[test]
    fn test_open_missing_port() {
        let result = SerialSource::open(SerialConfig::new("/dev/does-not-exist-gnss", 115200));
        assert!(result.is_err());
    }
}
