//! # roombridge-adapter-mqtt
//!
//! MQTT adapter — the two brokers the bridge talks to, via `rumqttc`.
//!
//! ## Responsibilities
//! - [`HubClient`]: publish entity payloads to the hub broker and route
//!   command topics to per-device channels, resubscribing after reconnects
//! - [`RoombaConnector`]: open one TLS connection to a robot's local broker and
//!   expose it as a [`DeviceLink`](roombridge_app::ports::DeviceLink) plus an
//!   inbound message channel
//!
//! ## Dependency rule
//! Same as other adapters: depends on `roombridge-app` and `roombridge-domain`.

pub mod config;
pub mod error;

mod device;
mod hub;
mod tls;

pub use config::{DeviceConfig, HubConfig, TlsMode};
pub use device::{RoombaConnector, RoombaLink};
pub use error::MqttError;
pub use hub::HubClient;

use rumqttc::{Event, EventLoop, Packet};

use roombridge_app::ports::QoS;

/// Capacity of the request and inbound channels of every client.
const CHANNEL_CAPACITY: usize = 64;

fn to_rumqttc(qos: QoS) -> rumqttc::QoS {
    match qos {
        QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
        QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
        QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
    }
}

/// Drive a fresh event loop until the broker accepts the connection.
async fn await_connack(eventloop: &mut EventLoop) -> Result<(), MqttError> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => return Ok(()),
            Ok(_) => {}
            Err(err) => return Err(MqttError::Connection(err)),
        }
    }
}
