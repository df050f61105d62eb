//! Configuration for the VDP bridge.
//!
//! TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `VDP_BRIDGE_CONFIG` environment variable (explicit path)
//! 2. `./vdp-bridge.toml` (current directory)
//! 3. `~/.config/vdp-bridge/vdp-bridge.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\vdp-bridge\vdp-bridge.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `VDP_BRIDGE_<SECTION>_<KEY>`, for example:
//! - `VDP_BRIDGE_LINK_DEVICE_PATH=/dev/ttyUSB0`
//! - `VDP_BRIDGE_LINK_BAUD_RATE=115200`
//! - `VDP_BRIDGE_LOGGING_LEVEL=debug`
//!
//! # Example
//!
//! ```rust,no_run
//! use vdp_bridge::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let config = loader.config();
//! println!("VDP on {} @ {}", config.link.device_path, config.link.baud_rate);
//! # Ok::<(), vdp_bridge::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{get_default_config_path, resolve_config_path, ConfigLoader};
pub use schema::{
    Config, LinkConfig, LogFormat, LoggingConfig, RetryConfig, StartupConfig,
    DEFAULT_BAUD_RATE, DEFAULT_DEVICE_PATH, DEFAULT_PACING_US,
};
