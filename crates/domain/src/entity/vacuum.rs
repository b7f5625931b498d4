//! The vacuum entity — status, battery and device-level attributes.

use std::collections::BTreeSet;

use serde::Serialize;

use super::{EntityCore, EntityKind, HubEntity, VacuumStatus};
use crate::device::DeviceInfo;
use crate::discovery::{TopicScheme, VacuumConfig, encode};

/// Features announced in the vacuum's discovery config.
pub const SUPPORTED_FEATURES: &[&str] = &[
    "start",
    "stop",
    "pause",
    "return_home",
    "battery",
    "status",
    "clean_spot",
    "send_command",
];

/// Attribute key holding the active error message.
pub const ERROR_ATTRIBUTE: &str = "error";

/// A condition that puts the vacuum in error.
///
/// Variants are ordered by precedence: when several are active, the
/// greatest one is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSource {
    BinAbsent,
    TankEmpty,
    LidOpen,
    TankAbsent,
    PadInvalid,
    Stuck,
}

impl ErrorSource {
    /// Message published in the `error` attribute.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::BinAbsent => "Bin is absent",
            Self::TankEmpty => "Tank is empty",
            Self::LidOpen => "Lid is open",
            Self::TankAbsent => "Tank is absent",
            Self::PadInvalid => "Pad invalid",
            Self::Stuck => "Stuck",
        }
    }
}

#[derive(Debug, Serialize)]
struct StatePayload {
    state: VacuumStatus,
    battery_level: u8,
}

/// The robot itself, as seen by the hub.
#[derive(Debug, Clone)]
pub struct Vacuum {
    core: EntityCore,
    phase_status: VacuumStatus,
    battery_level: u8,
    errors: BTreeSet<ErrorSource>,
    rendered: (VacuumStatus, u8),
}

impl Vacuum {
    /// Create the vacuum entity of `device`.
    #[must_use]
    pub fn new(scheme: &TopicScheme, device: &DeviceInfo) -> Self {
        let topics = scheme.entity_topics(EntityKind::Vacuum.as_str(), device.id.as_str());
        let mut core = EntityCore::new(format!("roomba_{}", device.id), device.name.clone(), topics);
        core.set_attribute("id", device.id.as_str());
        core.set_attribute("address", device.address.as_str());
        let status = VacuumStatus::default();
        Self {
            core,
            phase_status: status,
            battery_level: 0,
            errors: BTreeSet::new(),
            rendered: (status, 0),
        }
    }

    /// Status shown on the hub. Any active error wins over the phase.
    #[must_use]
    pub fn status(&self) -> VacuumStatus {
        if self.errors.is_empty() {
            self.phase_status
        } else {
            VacuumStatus::Error
        }
    }

    #[must_use]
    pub fn battery_level(&self) -> u8 {
        self.battery_level
    }

    /// The highest-precedence active error.
    #[must_use]
    pub fn active_error(&self) -> Option<ErrorSource> {
        self.errors.iter().next_back().copied()
    }

    /// Apply the status derived from a mission phase.
    pub(crate) fn set_phase_status(&mut self, status: VacuumStatus) {
        self.phase_status = status;
        self.set_error(ErrorSource::Stuck, status == VacuumStatus::Error);
    }

    pub(crate) fn set_battery_level(&mut self, level: u8) {
        self.battery_level = level;
        self.settle();
    }

    /// Raise or clear one error source.
    pub(crate) fn set_error(&mut self, source: ErrorSource, active: bool) {
        if active {
            self.errors.insert(source);
        } else {
            self.errors.remove(&source);
        }
        self.settle();
    }

    /// The vacuum carries the device's display name.
    pub(crate) fn rename(&mut self, name: &str) {
        name.clone_into(&mut self.core.name);
    }

    /// Bring the error attribute and the state flag in line with the
    /// current fields.
    fn settle(&mut self) {
        match self.active_error() {
            Some(source) => {
                self.core.set_attribute(ERROR_ATTRIBUTE, source.message());
            }
            None => {
                self.core.remove_attribute(ERROR_ATTRIBUTE);
            }
        }
        let current = (self.status(), self.battery_level);
        if current != self.rendered {
            self.rendered = current;
            self.core.mark_state_dirty();
        }
    }
}

impl HubEntity for Vacuum {
    fn kind(&self) -> EntityKind {
        EntityKind::Vacuum
    }

    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn config_payload(&self, device: &DeviceInfo) -> Vec<u8> {
        let topics = &self.core.topics;
        encode(&VacuumConfig {
            name: &device.name,
            schema: "state",
            supported_features: SUPPORTED_FEATURES,
            availability_topic: &topics.availability,
            command_topic: &topics.command,
            state_topic: &topics.state,
            json_attributes_topic: &topics.attributes,
            error_topic: &topics.state,
            error_template: "{{ value_json.error }}",
            unique_id: &self.core.unique_id,
            device: device.descriptor(),
        })
    }

    fn state_payload(&self) -> Vec<u8> {
        encode(&StatePayload {
            state: self.status(),
            battery_level: self.battery_level,
        })
    }
}
