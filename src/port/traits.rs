//! Core traits for the UART seam.
//!
//! [`SerialPortAdapter`] is the raw send/receive/flush primitive the bridge
//! drives; [`PortOpener`] is how a device path becomes one. Both have a
//! `serialport`-backed implementation and a mock.

use super::error::PortError;
use std::time::Duration;

/// Native descriptor of an open device (the file descriptor on Unix).
pub type RawDescriptor = i64;

/// Line settings used when opening the VDP link.
///
/// The VDP speaks 8N1 without flow control; only the baud rate and the
/// receive timeout vary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Receive timeout. Kept short so receive loops can notice cancellation.
    pub timeout: Duration,
}

impl PortConfiguration {
    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: 57_600,
            timeout: Duration::from_millis(10),
        }
    }
}

/// Raw UART operations on an open device.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the device.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read whatever is available into `buffer`, waiting at most the port
    /// timeout.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Device path this port was opened from.
    fn name(&self) -> &str;

    /// Discard bytes received but not yet read.
    fn flush_rx(&mut self) -> Result<(), PortError>;

    /// Discard bytes queued for transmission but not yet sent.
    fn flush_tx(&mut self) -> Result<(), PortError>;

    /// Native descriptor, when the backend has one.
    fn descriptor(&self) -> Option<RawDescriptor> {
        None
    }

    /// A second, independently owned handle onto the same device.
    ///
    /// The receive loop reads through its own clone so a blocking read
    /// never holds up a send.
    fn try_clone_port(&self) -> Result<Box<dyn SerialPortAdapter>, PortError>;
}

/// Turns a device path into an open [`SerialPortAdapter`].
///
/// The supervisor owns one of these so tests can substitute a mock for
/// real hardware.
pub trait PortOpener: Send + Sync {
    fn open(
        &self,
        device: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError>;
}
