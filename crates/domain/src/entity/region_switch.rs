//! Region switch — one toggle per room or zone, selecting it for the next
//! spot clean.

use super::{EntityCore, EntityKind, HubEntity};
use crate::device::DeviceInfo;
use crate::discovery::{SwitchConfig, TopicScheme, encode};
use crate::error::ValidationError;
use crate::id::{DeviceId, MapId, RegionId};
use crate::topology::{Map, Region, RegionKind};

pub const SWITCH_ON: &str = "ON";
pub const SWITCH_OFF: &str = "OFF";

/// Toggle entity bound to a `(map, region)` pair of the topology registry.
#[derive(Debug, Clone)]
pub struct RegionSwitch {
    core: EntityCore,
    map_id: MapId,
    region_id: RegionId,
    on: bool,
}

impl RegionSwitch {
    /// Create the switch representing `region` of `map`. Starts off.
    #[must_use]
    pub fn new(scheme: &TopicScheme, device_id: &DeviceId, map: &Map, region: &Region) -> Self {
        let sub_id = format!("{}{}", region.kind.tag(), region.id);
        let topics = scheme.entity_topics(
            EntityKind::Switch.as_str(),
            &format!("{device_id}_{sub_id}"),
        );
        let mut core = EntityCore::new(
            format!("roomba_switch_{device_id}_{sub_id}"),
            format!("zone_{sub_id}"),
            topics,
        );
        core.icon = Some(
            match region.kind {
                RegionKind::Zone => "mdi:texture",
                RegionKind::Room => "mdi:texture-box",
            }
            .to_string(),
        );
        Self {
            core,
            map_id: map.id.clone(),
            region_id: region.id.clone(),
            on: false,
        }
    }

    #[must_use]
    pub fn map_id(&self) -> &MapId {
        &self.map_id
    }

    #[must_use]
    pub fn region_id(&self) -> &RegionId {
        &self.region_id
    }

    /// Whether this switch represents the given pair.
    #[must_use]
    pub fn represents(&self, map_id: &MapId, region_id: &RegionId) -> bool {
        &self.map_id == map_id && &self.region_id == region_id
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Turn the switch on or off; marks the state dirty.
    ///
    /// A hub command always gets its state echoed, even when unchanged, so
    /// the hub's optimistic toggle settles.
    pub fn set_on(&mut self, on: bool) {
        self.on = on;
        self.core.mark_state_dirty();
    }

    /// Apply a command payload from the hub.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnexpectedSwitchPayload`] when the payload
    /// is neither `ON` nor `OFF`.
    pub fn apply_command(&mut self, payload: &str) -> Result<(), ValidationError> {
        match payload {
            SWITCH_ON => self.set_on(true),
            SWITCH_OFF => self.set_on(false),
            other => return Err(ValidationError::UnexpectedSwitchPayload(other.to_string())),
        }
        Ok(())
    }
}

impl HubEntity for RegionSwitch {
    fn kind(&self) -> EntityKind {
        EntityKind::Switch
    }

    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn config_payload(&self, device: &DeviceInfo) -> Vec<u8> {
        let topics = &self.core.topics;
        encode(&SwitchConfig {
            name: &self.core.name,
            command_topic: &topics.command,
            availability_topic: &topics.availability,
            json_attributes_topic: &topics.attributes,
            state_topic: &topics.state,
            unique_id: &self.core.unique_id,
            device: device.descriptor(),
            payload_off: SWITCH_OFF,
            payload_on: SWITCH_ON,
            icon: self.core.icon.as_deref().unwrap_or_default(),
        })
    }

    fn state_payload(&self) -> Vec<u8> {
        if self.on { SWITCH_ON } else { SWITCH_OFF }.as_bytes().to_vec()
    }
}
