//! Device delta — the partial state reports pushed by the robot.
//!
//! Every field is optional. An absent field means "no new information",
//! never "cleared".

use std::collections::BTreeMap;

use serde::Deserialize;

/// Envelope of a shadow update: `{"state": {"reported": {...}}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeltaMessage {
    #[serde(default)]
    pub state: DeltaState,
}

impl DeltaMessage {
    /// Parse a raw payload.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the payload is not a valid delta.
    pub fn parse(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// The reported section.
    #[must_use]
    pub fn reported(&self) -> &Reported {
        &self.state.reported
    }
}

/// `state` section of a shadow update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeltaState {
    #[serde(default)]
    pub reported: Reported,
}

/// Fields the bridge understands. Everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reported {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub software_ver: Option<String>,
    #[serde(rename = "batPct")]
    pub battery_percent: Option<u8>,
    pub clean_mission_status: Option<CleanMissionStatus>,
    pub bin: Option<Bin>,
    pub lid_open: Option<bool>,
    pub tank_present: Option<bool>,
    #[serde(rename = "tankLvl")]
    pub tank_level: Option<i64>,
    pub detected_pad: Option<String>,
    /// Persistent maps as a list of `{map id: map name}` objects.
    pub pmaps: Option<Vec<BTreeMap<String, String>>>,
    pub last_command: Option<LastCommand>,
}

/// Mission status; only the phase matters to the bridge.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CleanMissionStatus {
    pub phase: Option<String>,
}

/// Dust bin status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Bin {
    pub present: Option<bool>,
    pub full: Option<bool>,
}

/// Echo of the last command the robot executed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastCommand {
    pub command: Option<String>,
    pub pmap_id: Option<String>,
    #[serde(default)]
    pub regions: Vec<LastCommandRegion>,
}

/// A region listed in a [`LastCommand`] echo.
#[derive(Debug, Clone, Deserialize)]
pub struct LastCommandRegion {
    pub region_id: String,
    #[serde(rename = "type")]
    pub region_type: String,
}
