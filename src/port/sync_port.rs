//! `serialport`-backed UART implementation.

use super::error::PortError;
use super::traits::{PortConfiguration, PortOpener, RawDescriptor, SerialPortAdapter};
use std::io::{Read, Write};

/// An open serial device wrapping `serialport::SerialPort`.
pub struct SyncSerialPort {
    port: Box<dyn serialport::SerialPort>,
    name: String,
    descriptor: Option<RawDescriptor>,
}

impl SyncSerialPort {
    /// Open `device` as 8N1 with no flow control.
    ///
    /// # Example
    /// ```no_run
    /// use vdp_bridge::port::{PortConfiguration, SyncSerialPort};
    ///
    /// let port = SyncSerialPort::open("/dev/ttyACM0", &PortConfiguration::new(57_600))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(device: &str, config: &PortConfiguration) -> Result<Self, PortError> {
        let builder = serialport::new(device, config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .flow_control(serialport::FlowControl::None)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(config.timeout);

        let map_open_err = |e: serialport::Error| match e.kind() {
            serialport::ErrorKind::NoDevice => PortError::not_found(device),
            serialport::ErrorKind::InvalidInput => PortError::config(e.to_string()),
            _ => PortError::Serial(e),
        };

        #[cfg(unix)]
        let (port, descriptor): (Box<dyn serialport::SerialPort>, Option<RawDescriptor>) = {
            use std::os::unix::io::AsRawFd;
            let native = builder.open_native().map_err(map_open_err)?;
            let fd = native.as_raw_fd() as RawDescriptor;
            (Box::new(native), Some(fd))
        };

        #[cfg(not(unix))]
        let (port, descriptor) = (builder.open().map_err(map_open_err)?, None);

        Ok(Self {
            port,
            name: device.to_string(),
            descriptor,
        })
    }

    /// Baud rate the driver reports for the open device.
    pub fn baud_rate(&self) -> Option<u32> {
        self.port.baud_rate().ok()
    }
}

impl SerialPortAdapter for SyncSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.port.write(data).map_err(PortError::Io)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.port.read(buffer).map_err(PortError::Io)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn flush_rx(&mut self) -> Result<(), PortError> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(PortError::Serial)
    }

    fn flush_tx(&mut self) -> Result<(), PortError> {
        self.port
            .clear(serialport::ClearBuffer::Output)
            .map_err(PortError::Serial)
    }

    fn descriptor(&self) -> Option<RawDescriptor> {
        self.descriptor
    }

    fn try_clone_port(&self) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let port = self.port.try_clone().map_err(PortError::Serial)?;
        Ok(Box::new(Self {
            port,
            name: self.name.clone(),
            descriptor: self.descriptor,
        }))
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("descriptor", &self.descriptor)
            .field("baud_rate", &self.baud_rate())
            .finish()
    }
}

/// Opens real devices through `serialport`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPortOpener;

impl PortOpener for SystemPortOpener {
    fn open(
        &self,
        device: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        Ok(Box::new(SyncSerialPort::open(device, config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_not_found_error() {
        let result = SyncSerialPort::open("/dev/nonexistent_vdp_12345", &PortConfiguration::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_system_opener_reports_failure() {
        let opener = SystemPortOpener;
        let result = opener.open("/dev/nonexistent_vdp_12345", &PortConfiguration::default());
        assert!(result.is_err());
    }
}
