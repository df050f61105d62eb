//! Configuration schema definitions.
//!
//! Every section has serde defaults, so an empty file (or none at all) yields
//! the stock AGON setup: `/dev/ttyACM0` at 57600 baud.

use super::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DEVICE_PATH: &str = "/dev/ttyACM0";
pub const DEFAULT_BAUD_RATE: u32 = 57_600;
/// One character at 57600 baud takes about 174us; stay under it.
pub const DEFAULT_PACING_US: u64 = 150;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub link: LinkConfig,
    pub startup: StartupConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values that cannot produce a working link.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.link.device_path.trim().is_empty() {
            return Err(ConfigError::validation("link.device_path", "must not be empty"));
        }
        if self.link.baud_rate == 0 {
            return Err(ConfigError::validation("link.baud_rate", "must be positive"));
        }
        if self.link.retry.max_attempts == 0 {
            return Err(ConfigError::validation(
                "link.retry.max_attempts",
                "at least one attempt is required",
            ));
        }
        if self.startup.app_name.trim().is_empty() {
            return Err(ConfigError::validation("startup.app_name", "must not be empty"));
        }
        Ok(())
    }
}

/// Physical link section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Serial device the VDP is attached to
    pub device_path: String,
    /// Line speed
    pub baud_rate: u32,
    /// Sleep after each raw byte send, in microseconds
    pub pacing_us: u64,
    /// Receive timeout for the device pump, in milliseconds
    pub read_timeout_ms: u64,
    /// Send the VDU init handshake right after opening
    pub send_init_handshake: bool,
    pub retry: RetryConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            device_path: DEFAULT_DEVICE_PATH.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            pacing_us: DEFAULT_PACING_US,
            read_timeout_ms: 10,
            send_init_handshake: false,
            retry: RetryConfig::default(),
        }
    }
}

impl LinkConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_micros(self.pacing_us)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Port open retry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff_ms: 250,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// One-time startup side effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Print the banner on stdout
    pub banner: bool,
    /// Directory name used for the version stamp
    pub app_name: String,
    /// Where `<app_name>/version` is written; `None` disables the stamp
    pub version_stamp_dir: Option<PathBuf>,
    /// Map SIGINT/SIGTERM/SIGUSR1/SIGUSR2 onto the shutdown token. Off by
    /// default: an embedding process keeps its own signal dispositions. The
    /// `vdp-bridge` binary turns it on.
    pub install_signal_handlers: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            banner: true,
            app_name: "AGON-VDP-WRAPPER".to_string(),
            version_stamp_dir: Some(std::env::temp_dir()),
            install_signal_handlers: false,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
    /// Hex-dump every byte crossing the link at verbose level
    pub dump_payloads: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            dump_payloads: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
    Compact,
}
