//! # roombridge-app
//!
//! Application layer — services and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `HubPublisher` — publish to and subscribe on the hub broker
//!   - `DeviceConnector` / `DeviceLink` — reach a robot's local broker
//!   - `TopologyStore` — load & save topology snapshots
//! - Provide the **services** that drive the domain model:
//!   - `Synchronizer` — publish dirty entity payloads
//!   - `ConnectionSupervisor` — connect with a backoff ladder
//!   - `DeviceSession` — ingest device deltas and dispatch hub commands
//!
//! ## Dependency rule
//! Depends on `roombridge-domain` only (plus `tokio` for channels, locks and
//! timers). Never imports adapter crates. Adapters depend on *this* crate,
//! not the reverse.

pub mod ports;
pub mod services;

#[cfg(test)]
mod fakes;
