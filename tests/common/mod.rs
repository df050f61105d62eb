//! Shared helpers for bridge integration tests.
//!
//! - Quiet link/startup configuration (no banner, stamp, signals or pacing)
//! - Bridge construction over a mock or system opener
//! - Polling helpers with deadlines

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};
use vdp_bridge::config::{Config, LinkConfig, RetryConfig, StartupConfig};
use vdp_bridge::{ByteRelay, LinkSupervisor, MockPortOpener, PortOpener, ShutdownToken, VdpBridge};

/// Configuration that touches nothing outside the test process.
pub fn quiet_config() -> Config {
    Config {
        link: LinkConfig {
            pacing_us: 0,
            retry: RetryConfig {
                max_attempts: 1,
                backoff_ms: 0,
            },
            ..LinkConfig::default()
        },
        startup: StartupConfig {
            banner: false,
            version_stamp_dir: None,
            install_signal_handlers: false,
            ..StartupConfig::default()
        },
        ..Config::default()
    }
}

/// Bridge over `opener` using [`quiet_config`].
pub fn bridge_with_opener(opener: Box<dyn PortOpener>) -> VdpBridge {
    VdpBridge::from_config(&quiet_config(), opener, ShutdownToken::new())
}

/// Bridge over a fresh mock; returns the opener so tests can inspect it.
pub fn mock_bridge() -> (VdpBridge, MockPortOpener) {
    let opener = MockPortOpener::new();
    let bridge = bridge_with_opener(Box::new(opener.clone()));
    (bridge, opener)
}

/// Bridge whose supervisor uses `config` instead of the quiet defaults.
pub fn mock_bridge_with(config: &Config) -> (VdpBridge, MockPortOpener) {
    let opener = MockPortOpener::new();
    let supervisor = LinkSupervisor::new(
        Box::new(opener.clone()),
        config.link.clone(),
        config.startup.clone(),
        ShutdownToken::new(),
    );
    let bridge = VdpBridge::new(Arc::new(ByteRelay::new()), Arc::new(supervisor));
    (bridge, opener)
}

/// Drain `n` bytes via `deliver_from_device`, giving up after `timeout`.
pub fn collect_delivered(bridge: &VdpBridge, n: usize, timeout: Duration) -> Vec<u8> {
    let deadline = Instant::now() + timeout;
    let mut got = Vec::with_capacity(n);
    while got.len() < n && Instant::now() < deadline {
        match bridge.deliver_from_device() {
            Some(b) => got.push(b),
            None => std::thread::yield_now(),
        }
    }
    got
}

/// Drain everything currently in the inbound queue.
pub fn drain_inbound(bridge: &VdpBridge) -> Vec<u8> {
    let mut out = Vec::new();
    while let Ok(b) = bridge.relay().read_inbound() {
        out.push(b);
    }
    out
}
