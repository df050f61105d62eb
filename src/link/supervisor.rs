//! One-time lazy startup of the physical link.
//!
//! `NotStarted -> Ready` on the first successful [`LinkSupervisor::ensure_started`].
//! A failed start leaves the link `NotStarted` so the next caller tries
//! again from scratch. Nothing moves the link out of `Ready`.

use super::initializer::{open_port_with_retry, PortHandle, RetryPolicy};
use crate::config::{LinkConfig, StartupConfig};
use crate::error::{BridgeError, BridgeResult};
use crate::hexdump::{dump_payload, Severity};
use crate::port::{PortConfiguration, PortOpener, RawDescriptor, SerialPortAdapter};
use crate::protocol::VDU_INIT;
use crate::shutdown::ShutdownToken;
use crate::{signals, VERSION};
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tracing::{debug, error, info};

const ANSI_BLUE: &str = "\x1b[34m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_RESET: &str = "\x1b[0m";

/// Readiness of the physical link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    NotStarted,
    Ready { descriptor: RawDescriptor },
}

#[derive(Debug, Default)]
struct StartupProgress {
    bootstrapped: bool,
    open_calls: usize,
}

/// Owns the port and the link state.
pub struct LinkSupervisor {
    opener: Box<dyn PortOpener>,
    link: LinkConfig,
    startup: StartupConfig,
    token: ShutdownToken,
    /// Held across the whole check-and-initialize sequence.
    init: Mutex<StartupProgress>,
    ready: AtomicBool,
    descriptor: AtomicI64,
    port: Mutex<Option<PortHandle>>,
}

impl LinkSupervisor {
    pub fn new(
        opener: Box<dyn PortOpener>,
        link: LinkConfig,
        startup: StartupConfig,
        token: ShutdownToken,
    ) -> Self {
        Self {
            opener,
            link,
            startup,
            token,
            init: Mutex::new(StartupProgress::default()),
            ready: AtomicBool::new(false),
            descriptor: AtomicI64::new(-1),
            port: Mutex::new(None),
        }
    }

    pub fn link_config(&self) -> &LinkConfig {
        &self.link
    }

    pub fn token(&self) -> &ShutdownToken {
        &self.token
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn state(&self) -> LinkState {
        if self.is_ready() {
            LinkState::Ready {
                descriptor: self.descriptor.load(Ordering::Acquire),
            }
        } else {
            LinkState::NotStarted
        }
    }

    /// How many times the open/configure path has run.
    pub fn open_calls(&self) -> usize {
        self.init.lock().open_calls
    }

    /// Bring the link up if it is not already, returning the device
    /// descriptor.
    ///
    /// Opening follows the configured retry policy. Once the shutdown token
    /// is cancelled a link that is still down stays down.
    pub fn ensure_started(&self) -> BridgeResult<RawDescriptor> {
        let policy = RetryPolicy {
            max_attempts: self.link.retry.max_attempts,
            backoff: self.link.retry.backoff(),
        };
        self.start_with(&policy)
    }

    /// Like [`ensure_started`](Self::ensure_started) but with a single open
    /// attempt and no backoff. The forwarding path starts the link this way.
    pub fn try_start(&self) -> BridgeResult<RawDescriptor> {
        self.start_with(&RetryPolicy::once())
    }

    /// Run `f` against the open port. Fails with `LinkNotReady` before
    /// startup.
    pub fn with_port<R>(&self, f: impl FnOnce(&mut PortHandle) -> R) -> BridgeResult<R> {
        let mut guard = self.port.lock();
        guard.as_mut().map(f).ok_or(BridgeError::LinkNotReady)
    }

    /// Independent reader onto the open device, for a receive loop that
    /// must not hold the send lock.
    pub fn open_reader(&self) -> BridgeResult<Box<dyn SerialPortAdapter>> {
        self.with_port(|handle| handle.try_clone_reader())?
    }

    fn start_with(&self, policy: &RetryPolicy) -> BridgeResult<RawDescriptor> {
        if let LinkState::Ready { descriptor } = self.state() {
            return Ok(descriptor);
        }
        if self.token.is_cancelled() {
            return Err(BridgeError::Cancelled);
        }

        let mut progress = self.init.lock();
        // Another caller may have finished while we waited for the lock.
        if let LinkState::Ready { descriptor } = self.state() {
            return Ok(descriptor);
        }

        if !progress.bootstrapped {
            self.bootstrap();
            progress.bootstrapped = true;
        }

        let device = self.link.device_path.as_str();
        info!(
            "using {device} as VDP AGON device @ baud rate {} ...",
            self.link.baud_rate
        );

        progress.open_calls += 1;
        let config = PortConfiguration::new(self.link.baud_rate).with_timeout(self.link.read_timeout());
        let result = open_port_with_retry(self.opener.as_ref(), device, &config, policy, &self.token);
        match result {
            Ok(mut handle) => {
                let descriptor = handle.descriptor();
                if self.link.send_init_handshake {
                    if let Err(e) = self.send_handshake(&mut handle) {
                        error!("VDP handshake on {device} failed: {e}");
                        return Err(e);
                    }
                }
                *self.port.lock() = Some(handle);
                self.descriptor.store(descriptor, Ordering::Release);
                self.ready.store(true, Ordering::Release);
                info!(descriptor, "VDP ready");
                Ok(descriptor)
            }
            Err(e) => {
                match e.os_error() {
                    Some(code) => error!(
                        "unable to communicate with the VDP AGON device {device} (os error {code}): {e}"
                    ),
                    None => error!("unable to communicate with the VDP AGON device {device}: {e}"),
                }
                Err(e)
            }
        }
    }

    fn send_handshake(&self, handle: &mut PortHandle) -> BridgeResult<()> {
        dump_payload("send_handshake", &VDU_INIT, Severity::Verbose);
        for byte in VDU_INIT {
            handle.send_raw(&[byte])?;
            std::thread::sleep(self.link.pacing());
        }
        Ok(())
    }

    /// Version stamp, banner and signal mapping. Runs once per supervisor.
    fn bootstrap(&self) {
        if let Some(dir) = &self.startup.version_stamp_dir {
            match write_version_stamp(dir, &self.startup.app_name, VERSION) {
                Ok(path) => debug!(path = %path.display(), "version stamp written"),
                Err(e) => error!(
                    "failed to write version stamp under {}: {e}",
                    dir.display()
                ),
            }
        }

        if self.startup.banner {
            print!("{}", banner(VERSION));
        }

        if self.startup.install_signal_handlers {
            if let Err(e) = signals::install(self.token.clone()) {
                error!("failed to start signal listener: {e}");
            }
        }
    }
}

impl std::fmt::Debug for LinkSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSupervisor")
            .field("device", &self.link.device_path)
            .field("baud_rate", &self.link.baud_rate)
            .field("state", &self.state())
            .finish()
    }
}

/// Write `version` to `<dir>/<app_name>/version`, creating directories.
pub fn write_version_stamp(dir: &Path, app_name: &str, version: &str) -> io::Result<PathBuf> {
    let stamp_dir = dir.join(app_name);
    std::fs::create_dir_all(&stamp_dir)?;
    let path = stamp_dir.join("version");
    std::fs::write(&path, format!("{version}\n"))?;
    Ok(path)
}

/// Startup banner text.
pub fn banner(version: &str) -> String {
    format!(
        "\n\n{ANSI_BLUE}VDP LIBRARY FOR AGON VDP DEVICES{ANSI_RESET}\n{ANSI_YELLOW}FWVER: {version}{ANSI_RESET}\n\n\n"
    )
}
