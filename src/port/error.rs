//! Port-specific error types.
//!
//! Errors raised by the UART layer, kept apart from the bridge-level
//! [`BridgeError`](crate::error::BridgeError) which wraps them.

use thiserror::Error;

/// Errors that can occur while opening or driving a serial device.
#[derive(Debug, Error)]
pub enum PortError {
    /// The device node does not exist.
    #[error("Serial device not found: {0}")]
    NotFound(String),

    /// An I/O error occurred during a send, receive or flush.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device rejected the requested line settings.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A receive did not complete within the port timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a device path.
    pub fn not_found(device: impl Into<String>) -> Self {
        Self::NotFound(device.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Timeout error from a duration.
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout(duration)
    }

    /// True when the error only means "nothing arrived yet".
    ///
    /// Receive loops treat these as an empty poll rather than a failure.
    pub fn is_idle(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortError::not_found("/dev/ttyACM0");
        assert_eq!(err.to_string(), "Serial device not found: /dev/ttyACM0");

        let err = PortError::config("Invalid baud rate");
        assert_eq!(err.to_string(), "Configuration error: Invalid baud rate");
    }

    #[test]
    fn test_idle_classification() {
        assert!(PortError::timeout(std::time::Duration::from_millis(10)).is_idle());
        assert!(PortError::Io(std::io::Error::new(
            std::io::ErrorKind::WouldBlock,
            "empty"
        ))
        .is_idle());
        assert!(!PortError::not_found("/dev/null0").is_idle());
        assert!(!PortError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "gone"
        ))
        .is_idle());
    }
}
