//! Vacuum state — the operational status shown by the hub.

use serde::{Deserialize, Serialize};

/// Status values understood by the hub's state-schema vacuum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VacuumStatus {
    Cleaning,
    Docked,
    Paused,
    #[default]
    Idle,
    Returning,
    Error,
}

impl VacuumStatus {
    /// Map a mission phase reported by the robot.
    ///
    /// Returns `None` for phases the bridge does not know.
    #[must_use]
    pub fn from_phase(phase: &str) -> Option<Self> {
        match phase {
            "run" => Some(Self::Cleaning),
            "pause" => Some(Self::Paused),
            "stop" => Some(Self::Idle),
            "hmUsrDock" => Some(Self::Returning),
            "charge" | "evac" | "hmPostMsn" => Some(Self::Docked),
            "stuck" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for VacuumStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cleaning => f.write_str("cleaning"),
            Self::Docked => f.write_str("docked"),
            Self::Paused => f.write_str("paused"),
            Self::Idle => f.write_str("idle"),
            Self::Returning => f.write_str("returning"),
            Self::Error => f.write_str("error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_every_known_phase() {
        let cases = [
            ("run", VacuumStatus::Cleaning),
            ("pause", VacuumStatus::Paused),
            ("stop", VacuumStatus::Idle),
            ("hmUsrDock", VacuumStatus::Returning),
            ("charge", VacuumStatus::Docked),
            ("evac", VacuumStatus::Docked),
            ("hmPostMsn", VacuumStatus::Docked),
            ("stuck", VacuumStatus::Error),
        ];
        for (phase, expected) in cases {
            assert_eq!(VacuumStatus::from_phase(phase), Some(expected), "{phase}");
        }
    }

    #[test]
    fn should_return_none_for_unknown_phase() {
        assert_eq!(VacuumStatus::from_phase("hmMidMsn"), None);
    }

    #[test]
    fn should_default_to_idle() {
        assert_eq!(VacuumStatus::default(), VacuumStatus::Idle);
    }

    #[test]
    fn should_display_lowercase_variant_name() {
        assert_eq!(VacuumStatus::Returning.to_string(), "returning");
    }

    #[test]
    fn should_serialize_lowercase() {
        let json = serde_json::to_string(&VacuumStatus::Cleaning).unwrap();
        assert_eq!(json, "\"cleaning\"");
    }
}
