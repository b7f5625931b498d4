//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the service layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod device;
pub mod hub;
pub mod topology_store;

pub use device::{Connection, DeviceConnector, DeviceLink};
pub use hub::{HubPublisher, InboundMessage, QoS};
pub use topology_store::TopologyStore;
