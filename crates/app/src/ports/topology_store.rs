//! Topology store port — persistence of each device's topology registry.

use std::future::Future;

use roombridge_domain::error::BridgeError;
use roombridge_domain::id::DeviceId;
use roombridge_domain::topology::TopologyRegistry;

/// Loads and saves one topology snapshot per device.
pub trait TopologyStore: Send + Sync {
    /// Load the snapshot of `device_id`.
    ///
    /// Returns `Ok(None)` when no usable snapshot exists.
    fn load(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Option<TopologyRegistry>, BridgeError>> + Send;

    /// Replace the snapshot of `device_id`.
    fn save(
        &self,
        device_id: &DeviceId,
        topology: &TopologyRegistry,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}
