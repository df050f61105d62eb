use crate::port::PortError;
use thiserror::Error;

/// Errors surfaced by the bridge and its link supervisor.
///
/// Initialization failures are returned to the caller and logged; none of
/// them terminate the process.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A required argument (usually the device path) was missing or blank.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Opening or configuring the device failed.
    #[error("Device {device} unavailable: {source}")]
    DeviceUnavailable {
        device: String,
        #[source]
        source: PortError,
    },

    /// Storage for the port handle could not be obtained.
    #[error("Allocation failure: {0}")]
    AllocationFailure(String),

    /// A byte was read from an empty queue.
    #[error("Queue is empty")]
    EmptyQueue,

    /// The physical link has not been started.
    #[error("VDP link is not ready")]
    LinkNotReady,

    /// Shutdown was requested while the operation was in progress.
    #[error("Operation cancelled by shutdown request")]
    Cancelled,
}

impl BridgeError {
    pub fn device_unavailable(device: impl Into<String>, source: PortError) -> Self {
        Self::DeviceUnavailable {
            device: device.into(),
            source,
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DeviceUnavailable { .. } | Self::AllocationFailure(_))
    }

    /// The OS error code underneath, if there is one.
    pub fn os_error(&self) -> Option<i32> {
        match self {
            Self::DeviceUnavailable {
                source: PortError::Io(e),
                ..
            } => e.raw_os_error(),
            _ => None,
        }
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_device() {
        let err = BridgeError::device_unavailable("/dev/ttyACM0", PortError::not_found("/dev/ttyACM0"));
        let msg = err.to_string();
        assert!(msg.contains("/dev/ttyACM0"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_retryable() {
        assert!(BridgeError::device_unavailable("x", PortError::config("bad")).is_retryable());
        assert!(!BridgeError::InvalidArgument("empty".into()).is_retryable());
        assert!(!BridgeError::EmptyQueue.is_retryable());
    }

    #[test]
    fn test_os_error_passthrough() {
        let io = std::io::Error::from_raw_os_error(2);
        let err = BridgeError::device_unavailable("/dev/x", PortError::Io(io));
        assert_eq!(err.os_error(), Some(2));
        assert_eq!(BridgeError::LinkNotReady.os_error(), None);
    }
}
