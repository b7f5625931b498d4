//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`BridgeError`]
//! at port boundaries.

use crate::id::MapId;

/// Base error type shared by every crate of the workspace.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A value violated a domain invariant.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced item does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The device or hub transport failed.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Snapshot persistence failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A device identifier was empty.
    #[error("device id must not be empty")]
    EmptyDeviceId,

    /// A selector received a value outside of its option set.
    #[error("option {option:?} is not one of {allowed:?}")]
    UnknownOption {
        option: String,
        allowed: Vec<String>,
    },

    /// A toggle received a payload that is neither its on nor its off value.
    #[error("unexpected switch payload {0:?}")]
    UnexpectedSwitchPayload(String),

    /// A hub command string is not part of the supported vocabulary.
    #[error("unknown hub command {0:?}")]
    UnknownCommand(String),

    /// Regions were reported for a map the registry has never seen.
    #[error("regions reported for unknown map {0}")]
    UnknownMap(MapId),
}

/// A lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_not_found_error() {
        let err = NotFoundError {
            entity: "Map",
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Map abc not found");
    }

    #[test]
    fn should_convert_validation_error_into_bridge_error() {
        let err: BridgeError = ValidationError::EmptyDeviceId.into();
        assert!(matches!(
            err,
            BridgeError::Validation(ValidationError::EmptyDeviceId)
        ));
    }

    #[test]
    fn should_display_unknown_option_with_allowed_values() {
        let err = ValidationError::UnknownOption {
            option: "Three".to_string(),
            allowed: vec!["One".to_string(), "Two".to_string()],
        };
        assert_eq!(
            err.to_string(),
            r#"option "Three" is not one of ["One", "Two"]"#
        );
    }

    #[test]
    fn should_display_unknown_map() {
        let err = ValidationError::UnknownMap(MapId::new("pmap-1"));
        assert_eq!(err.to_string(), "regions reported for unknown map pmap-1");
    }
}
