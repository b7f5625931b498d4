//! Hub port — the broker the home-automation hub listens on.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use roombridge_domain::error::BridgeError;

/// Delivery guarantee requested for a publish or a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QoS {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

/// A message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Publishes to and subscribes on the hub broker.
///
/// Implementations must accept concurrent callers.
pub trait HubPublisher: Send + Sync {
    /// Publish `payload` to `topic`.
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QoS,
        retain: bool,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Route every message received on `topic` to `sink`.
    ///
    /// The subscription must survive reconnections of the underlying client.
    fn subscribe(
        &self,
        topic: &str,
        sink: mpsc::Sender<InboundMessage>,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

impl<T: HubPublisher> HubPublisher for Arc<T> {
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QoS,
        retain: bool,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).publish(topic, payload, qos, retain)
    }

    fn subscribe(
        &self,
        topic: &str,
        sink: mpsc::Sender<InboundMessage>,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).subscribe(topic, sink)
    }
}
