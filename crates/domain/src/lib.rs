//! # roombridge-domain
//!
//! Pure domain model for the roombridge vacuum-to-hub bridge.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Describe the **device delta** schema reported by the robot
//! - Own the **topology registry** (maps and regions discovered from echoes)
//! - Define the hub-visible **entities** (vacuum, region switches, pass
//!   selector) with their dirty-flag bookkeeping and discovery payloads
//! - Apply deltas to a [`DeviceModel`](model::DeviceModel)
//! - Translate hub commands into device commands
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod command;
pub mod delta;
pub mod device;
pub mod discovery;
pub mod entity;
pub mod ingest;
pub mod model;
pub mod topology;
