//! Centralized error types for the bridge
//!
//! Fatal errors are represented by the `BridgeError` enum. Per-frame decode
//! problems are not errors at this level, see `codec::DecodeError`.
//! Use `Result<T>` as shorthand for `std::result::Result<T, BridgeError>`.

use std::fmt;
use std::path::PathBuf;

/// All bridge errors
#[derive(Debug)]
pub enum BridgeError {
    // === Byte source ===
    /// Failed to open serial port
    SerialOpen {
        port: String,
        source: std::io::Error,
    },
    /// Serial link failed while reading (disconnect, driver error)
    ByteSource { source: std::io::Error },
    /// Failed to list serial ports
    PortEnumeration { source: std::io::Error },

    // === Detection ===
    /// No device found matching configuration
    NoDeviceFound,
    /// Multiple devices found matching configuration
    MultipleDevicesFound { count: usize },

    // === Sink ===
    /// Failed to open the record file
    SinkOpen {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Writing a record failed
    SinkWrite { source: std::io::Error },
    /// Sink writer thread has stopped
    SinkClosed,

    // === Config ===
    /// Failed to read config file
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Invalid config value
    ConfigValidation { field: &'static str, reason: String },

    // === IO ===
    /// File system operation failed
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SerialOpen { source, .. }
            | Self::ByteSource { source }
            | Self::PortEnumeration { source }
            | Self::SinkOpen { source, .. }
            | Self::SinkWrite { source }
            | Self::ConfigRead { source, .. }
            | Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SerialOpen { port, .. } => write!(f, "Cannot open serial port: {}", port),
            Self::ByteSource { source } => write!(f, "Serial link failed: {}", source),
            Self::PortEnumeration { .. } => write!(f, "Cannot list serial ports"),
            Self::NoDeviceFound => write!(f, "No device found"),
            Self::MultipleDevicesFound { count } => {
                write!(f, "Multiple devices found ({})", count)
            }
            Self::SinkOpen { path, .. } => write!(f, "Cannot open record file: {}", path.display()),
            Self::SinkWrite { source } => write!(f, "Record write failed: {}", source),
            Self::SinkClosed => write!(f, "Record writer stopped"),
            Self::ConfigRead { path, .. } => write!(f, "Cannot read config: {}", path.display()),
            Self::ConfigValidation { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            Self::Io { path, .. } => write!(f, "IO error: {}", path.display()),
        }
    }
}

/// Alias for Result with BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_source_chain() {
        let err = BridgeError::ByteSource {
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("unplugged"));
        assert!(BridgeError::SinkClosed.source().is_none());
    }

    #[test]
    fn test_config_validation_message() {
        let err = BridgeError::ConfigValidation {
            field: "serial.baud_rate",
            reason: "must be > 0".into(),
        };
        assert_eq!(err.to_string(), "Invalid serial.baud_rate: must be > 0");
    }
}
