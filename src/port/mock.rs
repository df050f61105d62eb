//! Mock UART for tests and dry runs.
//!
//! [`MockSerialPort`] shares its state between clones, so a test can keep a
//! handle while the bridge owns another and inspect what reached the "wire".
//! [`MockPortOpener`] hands such ports out and can be told to fail.

use super::error::PortError;
use super::traits::{PortConfiguration, PortOpener, RawDescriptor, SerialPortAdapter};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct MockPortState {
    /// Bytes the "device" will hand back on read.
    rx: VecDeque<u8>,
    /// Every byte written, in order.
    tx: Vec<u8>,
    rx_flushes: usize,
    tx_flushes: usize,
    fail_writes: bool,
    timeout: Duration,
}

/// In-memory serial port.
///
/// # Example
/// ```
/// use vdp_bridge::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"\x17\x00\x80");
///
/// let mut buffer = [0u8; 8];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"\x17\x00\x80");
///
/// port.write_bytes(b"\x16\x03").unwrap();
/// assert_eq!(port.written(), b"\x16\x03");
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    descriptor: RawDescriptor,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_descriptor(name, 3)
    }

    pub fn with_descriptor(name: impl Into<String>, descriptor: RawDescriptor) -> Self {
        Self {
            name: name.into(),
            descriptor,
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_millis(10),
                ..Default::default()
            })),
        }
    }

    /// Queue bytes as if the device had sent them.
    pub fn enqueue_read(&self, data: &[u8]) {
        self.state.lock().rx.extend(data);
    }

    /// Everything written so far.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().tx.clone()
    }

    /// Make subsequent writes fail with a broken-pipe error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Number of (rx, tx) flushes performed.
    pub fn flush_counts(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.rx_flushes, state.tx_flushes)
    }

    pub fn available_bytes(&self) -> usize {
        self.state.lock().rx.len()
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }
        state.tx.extend_from_slice(data);
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let (n, timeout) = {
            let mut state = self.state.lock();
            let mut n = 0;
            for slot in buffer.iter_mut() {
                match state.rx.pop_front() {
                    Some(b) => {
                        *slot = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            (n, state.timeout)
        };
        if n == 0 {
            // Mirror a real port: wait out the read timeout, then give up.
            std::thread::sleep(timeout);
            return Err(PortError::timeout(timeout));
        }
        Ok(n)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn flush_rx(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.rx.clear();
        state.rx_flushes += 1;
        Ok(())
    }

    fn flush_tx(&mut self) -> Result<(), PortError> {
        self.state.lock().tx_flushes += 1;
        Ok(())
    }

    fn descriptor(&self) -> Option<RawDescriptor> {
        Some(self.descriptor)
    }

    fn try_clone_port(&self) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        Ok(Box::new(self.clone()))
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("descriptor", &self.descriptor)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

#[derive(Debug, Default)]
struct MockOpenerState {
    attempts: usize,
    failures_remaining: usize,
    always_fail: bool,
    last_port: Option<MockSerialPort>,
    last_config: Option<PortConfiguration>,
}

/// [`PortOpener`] that produces [`MockSerialPort`]s.
///
/// Every successful open returns a clone of the same port, so bytes queued
/// with [`MockPortOpener::port`] before startup are visible afterwards.
#[derive(Debug, Clone)]
pub struct MockPortOpener {
    port: MockSerialPort,
    state: Arc<Mutex<MockOpenerState>>,
}

impl MockPortOpener {
    pub fn new() -> Self {
        Self {
            port: MockSerialPort::with_descriptor("MOCK-VDP", 7),
            state: Arc::new(Mutex::new(MockOpenerState::default())),
        }
    }

    /// An opener whose every attempt fails with `NotFound`.
    pub fn unavailable() -> Self {
        let opener = Self::new();
        opener.state.lock().always_fail = true;
        opener
    }

    /// Fail the next `count` attempts, then succeed.
    pub fn fail_next(&self, count: usize) {
        self.state.lock().failures_remaining = count;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().always_fail = unavailable;
    }

    /// Number of open attempts seen, successful or not.
    pub fn attempts(&self) -> usize {
        self.state.lock().attempts
    }

    /// Handle onto the port every successful open hands out.
    pub fn port(&self) -> MockSerialPort {
        self.port.clone()
    }

    /// Line settings of the most recent successful open.
    pub fn last_config(&self) -> Option<PortConfiguration> {
        self.state.lock().last_config.clone()
    }

    pub fn opened(&self) -> bool {
        self.state.lock().last_port.is_some()
    }
}

impl Default for MockPortOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl PortOpener for MockPortOpener {
    fn open(
        &self,
        device: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let mut state = self.state.lock();
        state.attempts += 1;
        if state.always_fail {
            return Err(PortError::not_found(device));
        }
        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(PortError::not_found(device));
        }
        self.port.state.lock().timeout = config.timeout;
        state.last_port = Some(self.port.clone());
        state.last_config = Some(config.clone());
        Ok(Box::new(self.port.clone()))
    }
}
