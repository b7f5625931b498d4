//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `roombridge.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use roombridge_adapter_mqtt::{DeviceConfig, HubConfig};
use roombridge_app::services::SessionOptions;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hub broker connection and topic prefixes.
    pub hub: HubConfig,
    /// Snapshot storage.
    pub storage: StorageConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Bridge behaviour.
    pub bridge: BridgeConfig,
    /// One entry per robot.
    pub devices: Vec<DeviceConfig>,
}

/// Snapshot storage configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one topology snapshot per device.
    pub data_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Seconds between `stop` and `dock` when a cleaning robot is sent home.
    pub dock_delay_secs: u64,
    /// Mirror every robot payload under `<base_topic>/raw/`.
    pub forward_raw: bool,
}

impl Config {
    /// Load configuration from `roombridge.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("roombridge.toml")?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("MQTT_ADDRESS") {
            self.hub.broker_host = val;
        }
        if let Some(port) = var("MQTT_PORT").and_then(|val| val.parse().ok()) {
            self.hub.broker_port = port;
        }
        if let Some(val) = var("MQTT_USER") {
            self.hub.username = Some(val);
        }
        if let Some(val) = var("MQTT_PASSWORD") {
            self.hub.password = Some(val);
        }
        if let Some(val) = var("DATA_FOLDER") {
            self.storage.data_dir = PathBuf::from(val);
        }
        if let Some(val) = var("ROOMBRIDGE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }

        let devices: Vec<DeviceConfig> = (0..)
            .map_while(|index| {
                let device_var = |name: &str| var(&format!("{index}_ROOMBA_{name}"));
                let mut device = DeviceConfig {
                    address: device_var("ADDRESS")?,
                    username: device_var("USER")?,
                    password: device_var("PASSWORD")?,
                    ..DeviceConfig::default()
                };
                if let Some(port) = device_var("PORT").and_then(|val| val.parse().ok()) {
                    device.port = port;
                }
                if let Some(tls) = device_var("TLS").and_then(|val| val.parse().ok()) {
                    device.tls = tls;
                }
                if let Some(insecure) = device_var("INSECURE").and_then(|val| val.parse().ok()) {
                    device.insecure = insecure;
                }
                if let Some(path) = device_var("CA_FILE") {
                    device.ca_file = Some(PathBuf::from(path));
                }
                Some(device)
            })
            .collect();
        if !devices.is_empty() {
            self.devices = devices;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.hub.broker_port == 0 {
            return Err(ConfigError::Validation(
                "hub broker port must be non-zero".to_string(),
            ));
        }
        for (index, device) in self.devices.iter().enumerate() {
            if device.address.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "device {index} has no address"
                )));
            }
            if device.username.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "device {index} has no user"
                )));
            }
            if let Err(err) = device.tls_mode() {
                return Err(ConfigError::Validation(format!("device {index}: {err}")));
            }
        }
        Ok(())
    }

    /// Options shared by every device session.
    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            forward_raw: self.bridge.forward_raw,
            dock_delay: Duration::from_secs(self.bridge.dock_delay_secs),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/data"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "roombridged=info,roombridge=info".to_string(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            dock_delay_secs: 15,
            forward_raw: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
