//! Robot broker connector.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, TlsConfiguration, Transport};
use tokio::sync::mpsc;

use roombridge_app::ports::{Connection, DeviceConnector, DeviceLink, InboundMessage, QoS};
use roombridge_domain::error::BridgeError;

use crate::config::{DeviceConfig, TlsMode};
use crate::error::MqttError;
use crate::tls;
use crate::{CHANNEL_CAPACITY, await_connack, to_rumqttc};

/// Opens connections to one robot's local broker.
///
/// Every connection is independent: when it drops, its inbound channel
/// closes and the caller connects again.
#[derive(Debug, Clone)]
pub struct RoombaConnector {
    config: DeviceConfig,
}

impl RoombaConnector {
    #[must_use]
    pub fn new(config: DeviceConfig) -> Self {
        Self { config }
    }

    async fn options(&self) -> Result<MqttOptions, MqttError> {
        let config = &self.config;
        let mut options = MqttOptions::new(
            config.username.as_str(),
            config.address.as_str(),
            config.port,
        );
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.into()));
        options.set_credentials(config.username.as_str(), config.password.as_str());
        match config.tls_mode()? {
            TlsMode::Disabled => {}
            TlsMode::CustomCa(path) => {
                let ca = tokio::fs::read(&path)
                    .await
                    .map_err(|source| MqttError::CaFile { path, source })?;
                options.set_transport(Transport::tls(ca, None, None));
            }
            TlsMode::DangerAcceptInvalid => {
                let tls = tls::accept_invalid_certificates()?;
                options.set_transport(Transport::tls_with_config(TlsConfiguration::Rustls(
                    Arc::new(tls),
                )));
            }
        }
        Ok(options)
    }

    async fn open(&self) -> Result<Connection<RoombaLink>, MqttError> {
        let (client, mut eventloop) = AsyncClient::new(self.options().await?, CHANNEL_CAPACITY);
        await_connack(&mut eventloop).await?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(forward(eventloop, tx, self.config.address.clone()));
        Ok(Connection {
            link: RoombaLink { client },
            inbound: rx,
        })
    }
}

impl DeviceConnector for RoombaConnector {
    type Link = RoombaLink;

    fn connect(&self) -> impl Future<Output = Result<Connection<Self::Link>, BridgeError>> + Send {
        async move { Ok(self.open().await?) }
    }
}

/// Pump the robot's messages into `tx` until the connection or the receiver
/// goes away.
async fn forward(mut eventloop: EventLoop, tx: mpsc::Sender<InboundMessage>, address: String) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = InboundMessage::new(publish.topic, publish.payload.to_vec());
                if tx.send(message).await.is_err() {
                    tracing::debug!(%address, "device receiver closed");
                    return;
                }
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(%err, %address, "device connection dropped");
                return;
            }
        }
    }
}

/// Outbound half of a robot connection.
#[derive(Clone)]
pub struct RoombaLink {
    client: AsyncClient,
}

impl DeviceLink for RoombaLink {
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QoS,
        retain: bool,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        async move {
            self.client
                .publish(topic, to_rumqttc(qos), retain, payload)
                .await
                .map_err(MqttError::Client)?;
            Ok(())
        }
    }

    fn subscribe(
        &self,
        filter: &str,
        qos: QoS,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        async move {
            self.client
                .subscribe(filter, to_rumqttc(qos))
                .await
                .map_err(MqttError::Client)?;
            Ok(())
        }
    }
}
