//! MQTT adapter error types.

use std::path::PathBuf;

use roombridge_domain::error::BridgeError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client could not queue a request.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// The broker connection failed or was lost.
    #[error("MQTT connection error")]
    Connection(#[source] rumqttc::ConnectionError),

    /// The certificate authority file could not be read.
    #[error("failed to read CA file {path}")]
    CaFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TLS client configuration could not be built.
    #[error("invalid TLS configuration")]
    Tls(#[source] rustls::Error),

    /// Certificate checks are on but no certificate authority is configured.
    #[error("certificate verification requires a CA file")]
    MissingCaFile,
}

impl MqttError {
    /// Convert into a [`BridgeError::Transport`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> BridgeError {
        BridgeError::Transport(Box::new(self))
    }
}

impl From<MqttError> for BridgeError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
