//! Tests against a VDP attached to `VDP_TEST_DEVICE`.

use std::env;
use std::time::Duration;
use vdp_bridge::config::Config;
use vdp_bridge::link::open_port;
use vdp_bridge::protocol::{set_mode, VDU_INIT};
use vdp_bridge::{LinkState, PortConfiguration, ShutdownToken, SystemPortOpener, VdpBridge};

fn test_config() -> Option<Config> {
    let device = env::var("VDP_TEST_DEVICE").ok()?;
    let mut config = Config::default();
    config.link.device_path = device;
    if let Some(baud) = env::var("VDP_TEST_BAUD").ok().and_then(|b| b.parse().ok()) {
        config.link.baud_rate = baud;
    }
    config.startup.banner = false;
    config.startup.version_stamp_dir = None;
    config.startup.install_signal_handlers = false;
    Some(config)
}

#[test]
#[ignore]
fn test_open_real_device() {
    let Some(config) = test_config() else {
        eprintln!("VDP_TEST_DEVICE not set, skipping");
        return;
    };
    let handle = open_port(
        &SystemPortOpener,
        &config.link.device_path,
        &PortConfiguration::new(config.link.baud_rate),
    )
    .expect("open VDP");
    assert!(handle.descriptor() >= 0);
    assert_eq!(handle.baud_rate(), config.link.baud_rate);
}

#[test]
#[ignore]
fn test_handshake_and_mode_on_real_device() {
    let Some(config) = test_config() else {
        eprintln!("VDP_TEST_DEVICE not set, skipping");
        return;
    };
    let bridge = VdpBridge::from_config(&config, Box::new(SystemPortOpener), ShutdownToken::new());

    bridge.send_command(&VDU_INIT);
    bridge.send_command(&set_mode(1));
    assert!(matches!(
        bridge.supervisor().state(),
        LinkState::Ready { .. }
    ));

    let token = ShutdownToken::new();
    let pump = {
        let bridge = bridge.clone();
        let token = token.clone();
        std::thread::spawn(move || bridge.pump_device_rx(&token))
    };
    std::thread::sleep(Duration::from_millis(500));
    token.cancel(0);
    let received = pump.join().unwrap().expect("pump");
    eprintln!("VDP sent {received} byte(s) after init");
}
