//! Opening and preparing the serial device.

use crate::error::{BridgeError, BridgeResult};
use crate::port::{PortConfiguration, PortOpener, RawDescriptor, SerialPortAdapter};
use crate::shutdown::ShutdownToken;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// An open, flushed serial device.
#[derive(Debug)]
pub struct PortHandle {
    port: Box<dyn SerialPortAdapter>,
    descriptor: RawDescriptor,
    baud_rate: u32,
}

impl PortHandle {
    pub fn descriptor(&self) -> RawDescriptor {
        self.descriptor
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn device(&self) -> &str {
        self.port.name()
    }

    /// Raw single-shot write; no pacing.
    pub fn send_raw(&mut self, data: &[u8]) -> BridgeResult<usize> {
        self.port
            .write_bytes(data)
            .map_err(|e| BridgeError::device_unavailable(self.port.name(), e))
    }

    /// Separate handle onto the device for a dedicated receive loop.
    pub fn try_clone_reader(&self) -> BridgeResult<Box<dyn SerialPortAdapter>> {
        self.port
            .try_clone_port()
            .map_err(|e| BridgeError::device_unavailable(self.port.name(), e))
    }
}

/// Bounded retry around [`open_port`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

/// Attempts allowed when no configuration says otherwise.
pub const MAX_RETRY_COUNT: u32 = 2;

impl RetryPolicy {
    /// One attempt, no backoff.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRY_COUNT,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Open `device` at `config.baud_rate` and discard stale bytes in both
/// directions. Single attempt.
pub fn open_port(
    opener: &dyn PortOpener,
    device: &str,
    config: &PortConfiguration,
) -> BridgeResult<PortHandle> {
    debug!(device, baud = config.baud_rate, "opening port");

    if device.trim().is_empty() {
        error!("no device passed");
        return Err(BridgeError::InvalidArgument(
            "device path must not be empty".into(),
        ));
    }

    let mut port = opener.open(device, config).map_err(|e| {
        error!("unable to initialize serial port for device {device}: {e}");
        BridgeError::device_unavailable(device, e)
    })?;

    // Backends without a native descriptor get a stand-in so the handle is
    // still usable.
    let descriptor = port.descriptor().unwrap_or(0);
    info!(device, descriptor, "serial port file handle: {descriptor}");

    debug!("flushing buffers");
    if let Err(e) = port.flush_rx() {
        warn!(device, "failed to flush receive buffer: {e}");
    }
    if let Err(e) = port.flush_tx() {
        warn!(device, "failed to flush transmit buffer: {e}");
    }

    Ok(PortHandle {
        port,
        descriptor,
        baud_rate: config.baud_rate,
    })
}

/// [`open_port`] with up to `policy.max_attempts` tries.
///
/// `InvalidArgument` is returned at once. Cancelling `token` abandons the
/// remaining attempts with [`BridgeError::Cancelled`].
pub fn open_port_with_retry(
    opener: &dyn PortOpener,
    device: &str,
    config: &PortConfiguration,
    policy: &RetryPolicy,
    token: &ShutdownToken,
) -> BridgeResult<PortHandle> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match open_port(opener, device, config) {
            Ok(handle) => return Ok(handle),
            Err(e) if !e.is_retryable() || attempt >= attempts => return Err(e),
            Err(e) => {
                warn!(device, attempt, attempts, "open failed, retrying: {e}");
            }
        }
        if !token.sleep(policy.backoff) {
            return Err(BridgeError::Cancelled);
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockPortOpener;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_empty_device_is_invalid() {
        let opener = MockPortOpener::new();
        let err = open_port(&opener, "", &PortConfiguration::default()).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgument(_)));
        assert_eq!(opener.attempts(), 0);
    }

    #[test]
    fn test_open_flushes_both_directions() {
        let opener = MockPortOpener::new();
        opener.port().enqueue_read(b"stale");

        let handle = open_port(&opener, "/dev/ttyACM0", &PortConfiguration::new(57_600)).unwrap();
        assert_eq!(handle.descriptor(), 7);
        assert_eq!(handle.baud_rate(), 57_600);
        assert_eq!(opener.port().flush_counts(), (1, 1));
        assert_eq!(opener.port().available_bytes(), 0);
    }

    #[test]
    fn test_open_failure_is_device_unavailable() {
        let opener = MockPortOpener::unavailable();
        let err = open_port(&opener, "/dev/ttyACM0", &PortConfiguration::default()).unwrap_err();
        match err {
            BridgeError::DeviceUnavailable { device, .. } => assert_eq!(device, "/dev/ttyACM0"),
            other => panic!("expected DeviceUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_retry_recovers() {
        let opener = MockPortOpener::new();
        opener.fail_next(1);
        let handle = open_port_with_retry(
            &opener,
            "/dev/ttyACM0",
            &PortConfiguration::default(),
            &fast_policy(2),
            &ShutdownToken::new(),
        );
        assert!(handle.is_ok());
        assert_eq!(opener.attempts(), 2);
    }

    #[test]
    fn test_retry_is_bounded() {
        let opener = MockPortOpener::unavailable();
        let err = open_port_with_retry(
            &opener,
            "/dev/ttyACM0",
            &PortConfiguration::default(),
            &fast_policy(3),
            &ShutdownToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::DeviceUnavailable { .. }));
        assert_eq!(opener.attempts(), 3);
    }

    #[test]
    fn test_once_policy_makes_one_attempt_without_backoff() {
        let opener = MockPortOpener::unavailable();
        let started = std::time::Instant::now();
        let result = open_port_with_retry(
            &opener,
            "/dev/ttyACM0",
            &PortConfiguration::default(),
            &RetryPolicy::once(),
            &ShutdownToken::new(),
        );
        assert!(result.is_err());
        assert_eq!(opener.attempts(), 1);
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_cloned_reader_shares_device() {
        let opener = MockPortOpener::new();
        let handle = open_port(&opener, "/dev/ttyACM0", &PortConfiguration::default()).unwrap();
        let mut reader = handle.try_clone_reader().unwrap();
        opener.port().enqueue_read(&[0x55]);

        let mut buffer = [0u8; 2];
        assert_eq!(reader.read_bytes(&mut buffer).unwrap(), 1);
        assert_eq!(buffer[0], 0x55);
    }

    #[test]
    fn test_retry_skips_invalid_argument() {
        let opener = MockPortOpener::new();
        let err = open_port_with_retry(
            &opener,
            " ",
            &PortConfiguration::default(),
            &fast_policy(5),
            &ShutdownToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgument(_)));
        assert_eq!(opener.attempts(), 0);
    }

    #[test]
    fn test_retry_honours_cancellation() {
        let opener = MockPortOpener::unavailable();
        let token = ShutdownToken::new();
        token.cancel(15);
        let err = open_port_with_retry(
            &opener,
            "/dev/ttyACM0",
            &PortConfiguration::default(),
            &fast_policy(5),
            &token,
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::Cancelled));
        assert_eq!(opener.attempts(), 1);
    }

    #[test]
    fn test_send_raw_reaches_port() {
        let opener = MockPortOpener::new();
        let mut handle = open_port(&opener, "/dev/ttyACM0", &PortConfiguration::default()).unwrap();
        assert_eq!(handle.send_raw(&[0x16, 0x01]).unwrap(), 2);
        assert_eq!(opener.port().written(), vec![0x16, 0x01]);
    }
}
