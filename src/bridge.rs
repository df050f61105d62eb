//! Emulator-facing entry points.
//!
//! [`VdpBridge`] joins the [`ByteRelay`] queues with the [`LinkSupervisor`].
//! The emulated CPU pushes bytes with [`VdpBridge::forward_to_device`] and
//! polls with [`VdpBridge::deliver_from_device`]; a device pump thread moves
//! whatever the VDP sends into the relay.

use crate::config::Config;
use crate::error::{BridgeError, BridgeResult};
use crate::hexdump::{dump_payload, Severity};
use crate::link::LinkSupervisor;
use crate::port::{PortError, PortOpener};
use crate::relay::ByteRelay;
use crate::shutdown::ShutdownToken;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Receive buffer size for one pump read.
const PUMP_CHUNK: usize = 64;

/// Cheap-to-clone handle shared by the CPU thread and the device pump.
#[derive(Debug, Clone)]
pub struct VdpBridge {
    relay: Arc<ByteRelay>,
    supervisor: Arc<LinkSupervisor>,
    pacing: Duration,
    dump_payloads: bool,
}

impl VdpBridge {
    pub fn new(relay: Arc<ByteRelay>, supervisor: Arc<LinkSupervisor>) -> Self {
        let pacing = supervisor.link_config().pacing();
        Self {
            relay,
            supervisor,
            pacing,
            dump_payloads: false,
        }
    }

    /// Build a bridge from configuration with a fresh relay.
    pub fn from_config(config: &Config, opener: Box<dyn PortOpener>, token: ShutdownToken) -> Self {
        let supervisor = LinkSupervisor::new(
            opener,
            config.link.clone(),
            config.startup.clone(),
            token,
        );
        Self::new(Arc::new(ByteRelay::new()), Arc::new(supervisor))
            .with_payload_dumps(config.logging.dump_payloads)
    }

    /// Hex-dump each forwarded byte and each pumped chunk at verbose level.
    pub fn with_payload_dumps(mut self, enabled: bool) -> Self {
        self.dump_payloads = enabled;
        self
    }

    pub fn relay(&self) -> &Arc<ByteRelay> {
        &self.relay
    }

    pub fn supervisor(&self) -> &Arc<LinkSupervisor> {
        &self.supervisor
    }

    /// Hand one byte from the emulated CPU to the VDP.
    ///
    /// Starts the link on first use with a single open attempt; a failure
    /// leaves it down for the next byte to try again. When the link is up
    /// the byte goes out on the wire followed by the pacing delay. Either
    /// way the byte is also appended to the inbound queue: the emulator
    /// reads back what it wrote.
    pub fn forward_to_device(&self, byte: u8) {
        if !self.supervisor.is_ready() {
            match self.supervisor.try_start() {
                Ok(descriptor) => info!(descriptor, "VDP port initialized"),
                Err(BridgeError::Cancelled) => debug!("shutting down, VDP link stays down"),
                Err(e) => error!("unable to initialize VDP port: {e}"),
            }
        }

        if self.supervisor.is_ready() {
            trace!(
                "sending 0x{byte:02x} ({byte}) ({}) to VDP",
                char::from(byte).escape_default()
            );
            if self.dump_payloads {
                dump_payload("forward_to_device", &[byte], Severity::Verbose);
            }
            self.send_paced(byte);
        } else {
            warn!(byte, "VDP link not ready, byte not forwarded");
        }

        self.relay.write_inbound(byte);
    }

    /// Forward every byte of a VDU command sequence.
    pub fn send_command(&self, command: &[u8]) {
        dump_payload("send_command", command, Severity::Verbose);
        for &byte in command {
            self.forward_to_device(byte);
        }
    }

    /// Next byte waiting for the emulated CPU, if any.
    ///
    /// Pops from the outbound queue, where the device side deposits its
    /// output.
    pub fn deliver_from_device(&self) -> Option<u8> {
        self.relay.try_read_outbound()
    }

    /// Move bytes received from the VDP into the outbound queue until
    /// `token` is cancelled.
    ///
    /// Reads go through a cloned handle owned by the pump, so sends on the
    /// CPU side never wait behind a blocked read. Fails with `LinkNotReady`
    /// if the link was never started, or with `DeviceUnavailable` when the
    /// device cannot be cloned or a receive fails hard.
    pub fn pump_device_rx(&self, token: &ShutdownToken) -> BridgeResult<u64> {
        if !self.supervisor.is_ready() {
            return Err(BridgeError::LinkNotReady);
        }

        let mut reader = self.supervisor.open_reader()?;
        let idle = self.supervisor.link_config().read_timeout().max(Duration::from_millis(1));
        let mut buf = [0u8; PUMP_CHUNK];
        let mut total = 0u64;
        while !token.is_cancelled() {
            match reader.read_bytes(&mut buf) {
                // Nothing and no timeout: back off for one read period.
                Ok(0) => {
                    token.sleep(idle);
                }
                Ok(n) => {
                    if self.dump_payloads {
                        dump_payload("pump_device_rx", &buf[..n], Severity::Verbose);
                    }
                    self.relay.write_outbound_slice(&buf[..n]);
                    total += n as u64;
                }
                Err(e) if e.is_idle() => {}
                Err(e) => return Err(self.receive_failed(e)),
            }
        }

        info!(total, "device pump stopped");
        Ok(total)
    }

    fn send_paced(&self, byte: u8) {
        let sent = self.supervisor.with_port(|handle| handle.send_raw(&[byte]));
        match sent {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("failed to send 0x{byte:02x} to VDP: {e}"),
            Err(e) => warn!("failed to send 0x{byte:02x} to VDP: {e}"),
        }
        if !self.pacing.is_zero() {
            std::thread::sleep(self.pacing);
        }
    }

    fn receive_failed(&self, e: PortError) -> BridgeError {
        let device = self.supervisor.link_config().device_path.clone();
        error!("receive from {device} failed: {e}");
        BridgeError::device_unavailable(device, e)
    }
}
