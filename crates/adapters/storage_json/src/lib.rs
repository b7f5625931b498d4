//! # roombridge-adapter-storage-json
//!
//! Topology persistence as one JSON file per device.
//!
//! ## Responsibilities
//! - Implement the `TopologyStore` port defined in `roombridge-app::ports`
//! - Version the snapshot format and discard snapshots of another version
//! - Replace snapshots atomically (write to a sibling file, then rename)
//!
//! ## Dependency rule
//! Depends on `roombridge-app` (for port traits) and `roombridge-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod topology_store;

pub use error::StorageError;
pub use topology_store::{JsonTopologyStore, SNAPSHOT_VERSION};
