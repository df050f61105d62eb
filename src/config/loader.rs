//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::{Config, LogFormat};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "VDP_BRIDGE";

/// Config file name
const CONFIG_FILE_NAME: &str = "vdp-bridge.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "VDP_BRIDGE_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using the standard resolution order, then apply
    /// environment overrides and validate.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Defaults plus environment overrides; bad overrides are ignored.
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        if apply_env_overrides(&mut config).is_err() || config.validate().is_err() {
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    /// Write the current configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|p| p.exists())
}

/// Default config file location for this platform.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join("vdp-bridge").join(CONFIG_FILE_NAME))
}

fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn env_var(key: &str) -> Option<(String, String)> {
    let var = format!("{ENV_PREFIX}_{key}");
    std::env::var(&var).ok().map(|val| (var, val))
}

fn parse_env<T: FromStr>(var: &str, val: &str, what: &str) -> ConfigResult<T> {
    val.trim()
        .parse()
        .map_err(|_| ConfigError::env_parse(var, format!("Invalid {what}")))
}

fn parse_bool(val: &str) -> bool {
    matches!(val.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Apply `VDP_BRIDGE_<SECTION>_<KEY>` overrides.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Link overrides
    if let Some((_, val)) = env_var("LINK_DEVICE_PATH") {
        config.link.device_path = val;
    }
    if let Some((var, val)) = env_var("LINK_BAUD_RATE") {
        config.link.baud_rate = parse_env(&var, &val, "baud rate")?;
    }
    if let Some((var, val)) = env_var("LINK_PACING_US") {
        config.link.pacing_us = parse_env(&var, &val, "pacing delay")?;
    }
    if let Some((var, val)) = env_var("LINK_READ_TIMEOUT_MS") {
        config.link.read_timeout_ms = parse_env(&var, &val, "timeout")?;
    }
    if let Some((_, val)) = env_var("LINK_SEND_INIT_HANDSHAKE") {
        config.link.send_init_handshake = parse_bool(&val);
    }
    if let Some((var, val)) = env_var("LINK_RETRY_MAX_ATTEMPTS") {
        config.link.retry.max_attempts = parse_env(&var, &val, "attempt count")?;
    }
    if let Some((var, val)) = env_var("LINK_RETRY_BACKOFF_MS") {
        config.link.retry.backoff_ms = parse_env(&var, &val, "backoff")?;
    }

    // Startup overrides
    if let Some((_, val)) = env_var("STARTUP_BANNER") {
        config.startup.banner = parse_bool(&val);
    }
    if let Some((_, val)) = env_var("STARTUP_VERSION_STAMP_DIR") {
        config.startup.version_stamp_dir = if val.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(val))
        };
    }
    if let Some((_, val)) = env_var("STARTUP_INSTALL_SIGNAL_HANDLERS") {
        config.startup.install_signal_handlers = parse_bool(&val);
    }

    // Logging overrides
    if let Some((_, val)) = env_var("LOGGING_LEVEL") {
        config.logging.level = val;
    }
    if let Some((var, val)) = env_var("LOGGING_FORMAT") {
        config.logging.format = match val.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => return Err(ConfigError::env_parse(var, "Expected json, pretty or compact")),
        };
    }
    if let Some((_, val)) = env_var("LOGGING_DUMP_PAYLOADS") {
        config.logging.dump_payloads = parse_bool(&val);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().link.baud_rate, 57_600);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("VDP_BRIDGE_LINK_BAUD_RATE", "115200");
        env::set_var("VDP_BRIDGE_LINK_DEVICE_PATH", "/dev/ttyUSB3");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().link.baud_rate, 115_200);
        assert_eq!(loader.config().link.device_path, "/dev/ttyUSB3");

        env::remove_var("VDP_BRIDGE_LINK_BAUD_RATE");
        env::remove_var("VDP_BRIDGE_LINK_DEVICE_PATH");
    }

    #[test]
    #[serial]
    fn test_invalid_env_override_is_rejected() {
        let mut config = Config::default();
        env::set_var("VDP_BRIDGE_LINK_BAUD_RATE", "fast");

        let result = apply_env_overrides(&mut config);
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));

        env::remove_var("VDP_BRIDGE_LINK_BAUD_RATE");
    }

    #[test]
    #[serial]
    fn test_load_from_file_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut loader = ConfigLoader::with_defaults();
        loader.config_mut().link.device_path = "/dev/ttyS4".into();
        loader.config_mut().logging.format = LogFormat::Json;
        loader.save_to(&path).unwrap();

        let reloaded = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(reloaded.config().link.device_path, "/dev/ttyS4");
        assert_eq!(reloaded.config().logging.format, LogFormat::Json);
        assert_eq!(reloaded.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    #[serial]
    fn test_load_from_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[link]\nbaud_rate = 0\n").unwrap();

        let result = ConfigLoader::load_from(&path);
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("1"));
        assert!(parse_bool("TRUE"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("nope"));
    }
}
