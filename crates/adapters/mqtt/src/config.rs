//! MQTT connection configuration.

use std::path::PathBuf;

use serde::Deserialize;

use roombridge_domain::discovery::TopicScheme;

use crate::error::MqttError;

/// Connection to the hub broker.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Prefix of the bridge's own state and command topics.
    pub base_topic: String,
    /// Prefix the hub watches for discovery configs.
    pub discovery_prefix: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
}

impl Default for HubConfig {
    fn default() -> Self {
        let scheme = TopicScheme::default();
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "roombridge".to_string(),
            username: None,
            password: None,
            base_topic: scheme.base_topic,
            discovery_prefix: scheme.discovery_prefix,
            keep_alive_secs: 30,
        }
    }
}

impl HubConfig {
    /// Topic layout derived from the configured prefixes.
    #[must_use]
    pub fn topic_scheme(&self) -> TopicScheme {
        TopicScheme {
            discovery_prefix: self.discovery_prefix.clone(),
            base_topic: self.base_topic.clone(),
        }
    }
}

/// Connection to one robot's local broker.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Robot hostname or IP address.
    pub address: String,
    pub port: u16,
    /// The robot's BLID; also its device id and client id.
    pub username: String,
    pub password: String,
    /// Wrap the connection in TLS. The robot's broker only accepts TLS.
    pub tls: bool,
    /// PEM file with the certificate authority of the robot's broker.
    pub ca_file: Option<PathBuf>,
    /// Accept the robot's self-signed certificate when no `ca_file` is set.
    pub insecure: bool,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            port: 8883,
            username: String::new(),
            password: String::new(),
            tls: true,
            ca_file: None,
            insecure: true,
            keep_alive_secs: 30,
        }
    }
}

/// How the link to a robot is secured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Plain TCP.
    Disabled,
    /// Verify the broker against a certificate authority file.
    CustomCa(PathBuf),
    /// Encrypt without verifying the broker's certificate.
    DangerAcceptInvalid,
}

impl DeviceConfig {
    /// Resolve the TLS settings. A configured `ca_file` wins over `insecure`.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::MissingCaFile`] when TLS is on, `insecure` is off
    /// and no `ca_file` is set.
    pub fn tls_mode(&self) -> Result<TlsMode, MqttError> {
        if !self.tls {
            return Ok(TlsMode::Disabled);
        }
        match (&self.ca_file, self.insecure) {
            (Some(path), _) => Ok(TlsMode::CustomCa(path.clone())),
            (None, true) => Ok(TlsMode::DangerAcceptInvalid),
            (None, false) => Err(MqttError::MissingCaFile),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = HubConfig::default();
        assert_eq!(config.broker_host, "localhost");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.client_id, "roombridge");
        assert_eq!(config.base_topic, "roomba2mqtt");
        assert_eq!(config.discovery_prefix, "homeassistant");
        assert_eq!(config.keep_alive_secs, 30);
        assert!(config.username.is_none());
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            broker_host = "mqtt.example.com"
            broker_port = 8883
            client_id = "bridge"
            username = "ha"
            password = "secret"
            base_topic = "vacuums"
            discovery_prefix = "ha"
            keep_alive_secs = 60
        "#;
        let config: HubConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "mqtt.example.com");
        assert_eq!(config.broker_port, 8883);
        assert_eq!(config.username.as_deref(), Some("ha"));
        let scheme = config.topic_scheme();
        assert_eq!(scheme.base_topic, "vacuums");
        assert_eq!(scheme.discovery_prefix, "ha");
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let toml = r#"broker_host = "192.168.1.100""#;
        let config: HubConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "192.168.1.100");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.client_id, "roombridge");
    }

    #[test]
    fn should_default_device_to_tls_port() {
        let toml = r#"
            address = "192.168.1.20"
            username = "3145C70123456789"
            password = ":1:1600000000:abcdef"
        "#;
        let config: DeviceConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.port, 8883);
        assert_eq!(config.username, "3145C70123456789");
        assert!(config.ca_file.is_none());
        assert_eq!(config.tls_mode().unwrap(), TlsMode::DangerAcceptInvalid);
    }

    #[test]
    fn should_prefer_ca_file_over_insecure() {
        let config = DeviceConfig {
            ca_file: Some(PathBuf::from("/etc/roombridge/ca.pem")),
            ..DeviceConfig::default()
        };
        assert_eq!(
            config.tls_mode().unwrap(),
            TlsMode::CustomCa(PathBuf::from("/etc/roombridge/ca.pem"))
        );
    }

    #[test]
    fn should_allow_plain_tcp_when_tls_disabled() {
        let toml = r#"
            address = "127.0.0.1"
            port = 1883
            tls = false
        "#;
        let config: DeviceConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.tls_mode().unwrap(), TlsMode::Disabled);
    }

    #[test]
    fn should_require_ca_file_when_verifying() {
        let config = DeviceConfig {
            insecure: false,
            ..DeviceConfig::default()
        };
        assert!(matches!(config.tls_mode(), Err(MqttError::MissingCaFile)));
    }
}
