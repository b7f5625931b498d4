//! Command translation — hub vacuum commands to device commands.
//!
//! | requested | condition | device command |
//! |-----------|-----------|----------------|
//! | `start` | paused | `resume` |
//! | `start` | otherwise | `start` |
//! | `stop` | | `stop` |
//! | `pause` | | `pause` |
//! | `return_to_base` | cleaning | `stop`, then `dock` after a delay |
//! | `return_to_base` | otherwise | `dock` |
//! | `locate` | | unsupported |
//! | `clean_spot` | | `start` with every selected region |

use std::str::FromStr;

use serde::Serialize;

use crate::entity::{PassMode, VacuumStatus};
use crate::error::ValidationError;
use crate::id::{MapId, RegionId};
use crate::time::{Timestamp, unix_seconds};
use crate::topology::RegionKind;

/// Device topic commands are published to.
pub const COMMAND_TOPIC: &str = "cmd";

/// Initiator the robot expects from local clients.
pub const INITIATOR: &str = "localApp";

/// Commands the hub sends to the vacuum's command topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubCommand {
    Start,
    Stop,
    Pause,
    ReturnToBase,
    Locate,
    CleanSpot,
}

impl FromStr for HubCommand {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "pause" => Ok(Self::Pause),
            "return_to_base" => Ok(Self::ReturnToBase),
            "locate" => Ok(Self::Locate),
            "clean_spot" => Ok(Self::CleanSpot),
            other => Err(ValidationError::UnknownCommand(other.to_string())),
        }
    }
}

/// Per-region cleaning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionParams {
    pub no_auto_passes: bool,
    pub two_pass: bool,
}

/// One region of a targeted clean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionTarget {
    pub region_id: RegionId,
    #[serde(rename = "type")]
    pub kind: RegionKind,
    pub params: RegionParams,
}

/// Command published to the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundCommand {
    pub command: &'static str,
    pub time: i64,
    pub initiator: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<RegionTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmap_id: Option<MapId>,
}

impl OutboundCommand {
    /// A command without region targets.
    #[must_use]
    pub fn simple(command: &'static str, now: Timestamp) -> Self {
        Self {
            command,
            time: unix_seconds(now),
            initiator: INITIATOR,
            regions: Vec::new(),
            pmap_id: None,
        }
    }
}

/// A region whose switch is on, resolved through the topology registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedRegion {
    pub map_id: MapId,
    pub region_id: RegionId,
    pub kind: RegionKind,
}

/// What the device should receive for one hub command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// Publish one command now.
    Immediate(OutboundCommand),
    /// Publish `stop` now and `dock` once the robot had time to stop.
    StopThenDock {
        stop: OutboundCommand,
        dock: OutboundCommand,
    },
    /// The device has no equivalent; nothing is sent.
    Unsupported,
}

/// Translate a hub command given the vacuum's current status.
#[must_use]
pub fn translate(
    request: HubCommand,
    status: VacuumStatus,
    selected: &[SelectedRegion],
    pass_mode: PassMode,
    now: Timestamp,
) -> Translation {
    let simple = |command| Translation::Immediate(OutboundCommand::simple(command, now));
    match request {
        HubCommand::Start if status == VacuumStatus::Paused => simple("resume"),
        HubCommand::Start => simple("start"),
        HubCommand::Stop => simple("stop"),
        HubCommand::Pause => simple("pause"),
        HubCommand::ReturnToBase if status == VacuumStatus::Cleaning => Translation::StopThenDock {
            stop: OutboundCommand::simple("stop", now),
            dock: OutboundCommand::simple("dock", now),
        },
        HubCommand::ReturnToBase => simple("dock"),
        HubCommand::Locate => Translation::Unsupported,
        HubCommand::CleanSpot => {
            let params = RegionParams {
                no_auto_passes: true,
                two_pass: pass_mode == PassMode::Two,
            };
            let mut command = OutboundCommand::simple("start", now);
            command.pmap_id = selected.first().map(|r| r.map_id.clone());
            command.regions = selected
                .iter()
                .map(|r| RegionTarget {
                    region_id: r.region_id.clone(),
                    kind: r.kind,
                    params,
                })
                .collect();
            Translation::Immediate(command)
        }
    }
}
