//! Device port — the robot's local broker.

use std::future::Future;

use tokio::sync::mpsc;

use roombridge_domain::error::BridgeError;

use super::hub::{InboundMessage, QoS};

/// A live connection to a robot.
///
/// The connection is over once `inbound` yields `None`.
#[derive(Debug)]
pub struct Connection<L> {
    pub link: L,
    pub inbound: mpsc::Receiver<InboundMessage>,
}

/// Outbound half of a device connection. Cheap to clone.
pub trait DeviceLink: Clone + Send + Sync + 'static {
    /// Publish `payload` to a device topic.
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QoS,
        retain: bool,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Subscribe to a device topic filter; messages arrive on the
    /// connection's inbound channel.
    fn subscribe(&self, filter: &str, qos: QoS)
    -> impl Future<Output = Result<(), BridgeError>> + Send;
}

/// Opens connections to one robot.
pub trait DeviceConnector: Send + Sync {
    type Link: DeviceLink;

    /// Try once to connect.
    fn connect(&self) -> impl Future<Output = Result<Connection<Self::Link>, BridgeError>> + Send;
}
