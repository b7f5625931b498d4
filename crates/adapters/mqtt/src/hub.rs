//! Hub broker client.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;

use roombridge_app::ports::{HubPublisher, InboundMessage, QoS};
use roombridge_domain::error::BridgeError;

use crate::config::HubConfig;
use crate::error::MqttError;
use crate::{CHANNEL_CAPACITY, await_connack, to_rumqttc};

/// Pause before polling again after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

type Routes = Arc<RwLock<HashMap<String, mpsc::Sender<InboundMessage>>>>;

/// Shared handle on the hub broker connection.
///
/// Cloning is cheap; every clone publishes through the same connection.
#[derive(Clone)]
pub struct HubClient {
    client: AsyncClient,
    routes: Routes,
}

impl HubClient {
    /// Connect to the hub broker and spawn the task driving the connection.
    ///
    /// The task reconnects on its own and renews every subscription after a
    /// reconnect. It runs until the returned handle is aborted.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::Connection`] when the first connection attempt
    /// fails.
    pub async fn connect(config: &HubConfig) -> Result<(Self, JoinHandle<()>), MqttError> {
        let mut options = MqttOptions::new(
            config.client_id.as_str(),
            config.broker_host.as_str(),
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.into()));
        if let Some(username) = &config.username {
            options.set_credentials(
                username.as_str(),
                config.password.clone().unwrap_or_default(),
            );
        }

        let (client, mut eventloop) = AsyncClient::new(options, CHANNEL_CAPACITY);
        await_connack(&mut eventloop).await?;
        tracing::info!(host = %config.broker_host, port = config.broker_port, "hub broker connected");

        let routes = Routes::default();
        let pump = tokio::spawn(drive(client.clone(), eventloop, routes.clone()));
        Ok((Self { client, routes }, pump))
    }
}

async fn drive(client: AsyncClient, mut eventloop: EventLoop, routes: Routes) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = InboundMessage::new(publish.topic, publish.payload.to_vec());
                deliver(&routes, message).await;
            }
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!("hub broker reconnected, renewing subscriptions");
                for topic in routes.read().await.keys() {
                    if let Err(err) = client.try_subscribe(topic.as_str(), rumqttc::QoS::AtMostOnce) {
                        tracing::warn!(%err, topic = %topic, "failed to renew subscription");
                    }
                }
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(%err, "hub broker connection error");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

/// Hand `message` to the sink routed for its topic without waiting: the
/// event loop must keep polling while a device is busy.
async fn deliver(routes: &Routes, message: InboundMessage) {
    let Some(sink) = routes.read().await.get(&message.topic).cloned() else {
        tracing::debug!(topic = %message.topic, "no route for hub message");
        return;
    };
    match sink.try_send(message) {
        Ok(()) => {}
        Err(TrySendError::Full(message)) => {
            tracing::warn!(topic = %message.topic, "command queue full, hub message dropped");
        }
        Err(TrySendError::Closed(message)) => {
            tracing::debug!(topic = %message.topic, "hub command receiver closed");
        }
    }
}

impl HubPublisher for HubClient {
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
        topic: &str,
        sink: mpsc::Sender<InboundMessage>,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        async move {
            self.routes.write().await.insert(topic.to_string(), sink);
            self.client
                .subscribe(topic, rumqttc::QoS::AtMostOnce)
                .await
                .map_err(MqttError::Client)?;
            tracing::debug!(topic, "subscribed to hub topic");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPIC: &str = "roomba2mqtt/vacuum/homeassistant/BLID1/command";

    async fn routes_with(topic: &str, capacity: usize) -> (Routes, mpsc::Receiver<InboundMessage>) {
        let routes = Routes::default();
        let (tx, rx) = mpsc::channel(capacity);
        routes.write().await.insert(topic.to_string(), tx);
        (routes, rx)
    }

    #[tokio::test]
    async fn should_deliver_to_routed_sink() {
        let (routes, mut rx) = routes_with(TOPIC, 4).await;

        deliver(&routes, InboundMessage::new(TOPIC, "start")).await;

        let message = rx.recv().await.unwrap();
        assert_eq!(message.payload, b"start".to_vec());
    }

    #[tokio::test]
    async fn should_drop_message_when_queue_full_without_waiting() {
        let (routes, mut rx) = routes_with(TOPIC, 1).await;
        deliver(&routes, InboundMessage::new(TOPIC, "start")).await;

        let delivered = tokio::time::timeout(
            Duration::from_secs(1),
            deliver(&routes, InboundMessage::new(TOPIC, "pause")),
        )
        .await;

        assert!(delivered.is_ok());
        assert_eq!(rx.recv().await.unwrap().payload, b"start".to_vec());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_ignore_unrouted_and_closed_topics() {
        let (routes, rx) = routes_with(TOPIC, 1).await;
        drop(rx);

        deliver(&routes, InboundMessage::new(TOPIC, "start")).await;
        deliver(&routes, InboundMessage::new("elsewhere", "start")).await;
    }
}
