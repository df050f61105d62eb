//! VDP Bridge Library
//!
//! Connects an emulated CPU's byte stream to a physical VDP over a serial
//! line, exposing the link to the emulator as a virtual serial port.
//!
//! # Modules
//!
//! - `bridge`: emulator-facing entry points and the device receive pump
//! - `relay`: the two byte queues behind the virtual serial port
//! - `link`: opening the device and supervising its one-time startup
//! - `port`: UART abstraction over `serialport`, plus mocks
//! - `protocol`: VDU command byte sequences
//! - `hexdump`: wire-traffic dumps for diagnostics
//! - `timer`: elapsed-time helper
//! - `shutdown` / `signals`: cooperative cancellation and OS signal mapping
//! - `config`: TOML configuration with environment overrides
//! - `logging`: `tracing` subscriber setup
//! - `error`: bridge error type

pub mod bridge;
pub mod config;
pub mod error;
pub mod hexdump;
pub mod link;
pub mod logging;
pub mod port;
pub mod protocol;
pub mod relay;
pub mod shutdown;
pub mod signals;
pub mod timer;

/// Build version reported in the banner and the version stamp.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export commonly used types for convenience
pub use bridge::VdpBridge;
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
pub use error::{BridgeError, BridgeResult};
pub use hexdump::{dump_payload, format_payload, Severity};
pub use link::{LinkState, LinkSupervisor, PortHandle, RetryPolicy};
pub use port::{
    MockPortOpener, MockSerialPort, PortConfiguration, PortError, PortOpener, RawDescriptor,
    SerialPortAdapter, SyncSerialPort, SystemPortOpener,
};
pub use relay::{ByteQueue, ByteRelay};
pub use shutdown::ShutdownToken;
pub use timer::Timer;
