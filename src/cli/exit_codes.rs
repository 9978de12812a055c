//! CLI Exit Codes
//!
//! Process exit codes of the `gnss-reader` binary.

use crate::config::ConfigError;
use crate::core::reader::ReaderError;
use crate::core::transport::TransportError;
use std::process::ExitCode;

/// Exit code constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodes;

impl ExitCodes {
    /// Success
    pub const SUCCESS: u8 = 0;

    /// General error
    pub const ERROR: u8 = 1;

    /// Invalid arguments
    pub const INVALID_ARGS: u8 = 2;

    /// Device could not be opened
    pub const CONNECTION_FAILED: u8 = 3;

    /// No reply within the time limit
    pub const TIMEOUT: u8 = 4;

    /// File not found
    pub const FILE_NOT_FOUND: u8 = 6;

    /// Permission denied
    pub const PERMISSION_DENIED: u8 = 7;

    /// Configuration error
    pub const CONFIG_ERROR: u8 = 8;

    /// Request frame could not be built
    pub const PROTOCOL_ERROR: u8 = 9;

    /// Read or write failed on an open device
    pub const IO_FAILED: u8 = 10;

    /// User cancelled
    pub const CANCELLED: u8 = 11;

    /// Stream ended before the expected message
    pub const STREAM_CLOSED: u8 = 12;

    /// Port not found
    pub const PORT_NOT_FOUND: u8 = 14;

    /// Internal error
    pub const INTERNAL_ERROR: u8 = 127;
}

const DESCRIPTIONS: &[(u8, &str)] = &[
    (ExitCodes::SUCCESS, "Success"),
    (ExitCodes::ERROR, "General error"),
    (ExitCodes::INVALID_ARGS, "Invalid arguments"),
    (ExitCodes::CONNECTION_FAILED, "Device open failed"),
    (ExitCodes::TIMEOUT, "No reply in time"),
    (ExitCodes::FILE_NOT_FOUND, "File not found"),
    (ExitCodes::PERMISSION_DENIED, "Permission denied"),
    (ExitCodes::CONFIG_ERROR, "Configuration error"),
    (ExitCodes::PROTOCOL_ERROR, "Protocol error"),
    (ExitCodes::IO_FAILED, "Device read/write failed"),
    (ExitCodes::CANCELLED, "Operation cancelled"),
    (ExitCodes::STREAM_CLOSED, "Stream closed"),
    (ExitCodes::PORT_NOT_FOUND, "Port not found"),
    (ExitCodes::INTERNAL_ERROR, "Internal error"),
];

/// CLI operation result
#[derive(Debug)]
pub enum CliResult {
    /// Success with optional message
    Success(Option<String>),

    /// Error with code and message
    Error(u8, String),
}

impl CliResult {
    /// Success without message
    pub fn success() -> Self {
        Self::Success(None)
    }

    /// Error with an explicit code
    pub fn error(code: u8, msg: impl Into<String>) -> Self {
        Self::Error(code, msg.into())
    }

    /// Get exit code
    pub fn code(&self) -> u8 {
        match self {
            Self::Success(_) => ExitCodes::SUCCESS,
            Self::Error(code, _) => *code,
        }
    }

    /// Get message
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success(Some(msg)) | Self::Error(_, msg) => Some(msg),
            Self::Success(None) => None,
        }
    }

    /// Convert to ExitCode
    pub fn to_exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    /// Is success?
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Classify a top-level error by the first library error in its chain
    pub fn from_error(err: &anyhow::Error) -> Self {
        let code = err
            .chain()
            .find_map(|cause| {
                if let Some(e) = cause.downcast_ref::<ReaderError>() {
                    Some(reader_error_code(e))
                } else if let Some(e) = cause.downcast_ref::<TransportError>() {
                    Some(transport_error_code(e))
                } else if cause.is::<ConfigError>() {
                    Some(ExitCodes::CONFIG_ERROR)
                } else {
                    cause.downcast_ref::<std::io::Error>().map(io_error_code)
                }
            })
            .unwrap_or(ExitCodes::ERROR);
        Self::Error(code, format!("{:#}", err))
    }
}

fn reader_error_code(err: &ReaderError) -> u8 {
    match err {
        ReaderError::Open { source, .. } => match transport_error_code(source) {
            ExitCodes::ERROR => ExitCodes::CONNECTION_FAILED,
            code => code,
        },
        ReaderError::Read(_) | ReaderError::Write(_) => ExitCodes::IO_FAILED,
        ReaderError::Closed => ExitCodes::STREAM_CLOSED,
        ReaderError::Encode(_) => ExitCodes::PROTOCOL_ERROR,
        ReaderError::AlreadyOpen | ReaderError::NotOpen => ExitCodes::INTERNAL_ERROR,
    }
}

fn transport_error_code(err: &TransportError) -> u8 {
    match err {
        TransportError::PortNotFound(_) => ExitCodes::PORT_NOT_FOUND,
        TransportError::PermissionDenied(_) => ExitCodes::PERMISSION_DENIED,
        TransportError::ConnectionFailed(_) => ExitCodes::CONNECTION_FAILED,
        TransportError::IoError(e) => io_error_code(e),
        _ => ExitCodes::ERROR,
    }
}

fn io_error_code(err: &std::io::Error) -> u8 {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::NotFound => ExitCodes::FILE_NOT_FOUND,
        ErrorKind::PermissionDenied => ExitCodes::PERMISSION_DENIED,
        ErrorKind::TimedOut => ExitCodes::TIMEOUT,
        _ => ExitCodes::ERROR,
    }
}

impl From<std::io::Error> for CliResult {
    fn from(err: std::io::Error) -> Self {
        Self::Error(io_error_code(&err), err.to_string())
    }
}

impl From<ReaderError> for CliResult {
    fn from(err: ReaderError) -> Self {
        Self::Error(reader_error_code(&err), err.to_string())
    }
}

/// Exit code description
pub fn exit_code_description(code: u8) -> &'static str {
    DESCRIPTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map_or("Unknown error", |(_, text)| text)
}

/// Print exit code table
pub fn print_exit_codes() {
    println!("Exit Codes:");
    for (code, text) in DESCRIPTIONS {
        println!("  {:>3}  {}", code, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_cli_result() {
        let success = CliResult::success();
        assert!(success.is_success());
        assert_eq!(success.code(), 0);

        let error = CliResult::error(3, "Device open failed");
        assert!(!error.is_success());
        assert_eq!(error.code(), 3);
        assert_eq!(error.message(), Some("Device open failed"));
    }

    #[test]
    fn test_from_io_error() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let result = CliResult::from(err);
        assert_eq!(result.code(), ExitCodes::FILE_NOT_FOUND);
    }

    #[test]
    fn test_open_failure_codes() {
        let err = ReaderError::Open {
            device: "/dev/ttyACM9".to_string(),
            source: TransportError::PortNotFound("/dev/ttyACM9".to_string()),
        };
        assert_eq!(CliResult::from(err).code(), ExitCodes::PORT_NOT_FOUND);

        let err = ReaderError::Open {
            device: "/dev/ttyACM0".to_string(),
            source: TransportError::NotConnected,
        };
        assert_eq!(CliResult::from(err).code(), ExitCodes::CONNECTION_FAILED);
    }

    #[test]
    fn test_from_anyhow_chain() {
        let err = Err::<(), _>(ReaderError::Closed)
            .context("waiting for MON-VER")
            .unwrap_err();
        let result = CliResult::from_error(&err);
        assert_eq!(result.code(), ExitCodes::STREAM_CLOSED);
        assert!(result.message().unwrap().contains("waiting for MON-VER"));

        let plain = anyhow::anyhow!("something else");
        assert_eq!(CliResult::from_error(&plain).code(), ExitCodes::ERROR);
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(exit_code_description(ExitCodes::STREAM_CLOSED), "Stream closed");
        assert_eq!(exit_code_description(200), "Unknown error");
    }
}
