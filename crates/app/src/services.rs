//! Application services.
//!
//! Each service accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod session;
pub mod supervisor;
pub mod synchronizer;

pub use session::{DeviceSession, SessionOptions};
pub use supervisor::{BackoffLadder, ConnectionState, ConnectionSupervisor};
pub use synchronizer::{SyncReport, Synchronizer};
