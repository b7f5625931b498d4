//! Device model — everything the bridge knows about one robot.
//!
//! A [`DeviceModel`] owns the device identity, its topology registry and
//! the entities derived from both. Deltas are applied through
//! [`DeviceModel::apply`](crate::ingest) and hub commands are routed through
//! [`DeviceModel::route_command`].

use crate::command::{HubCommand, SelectedRegion, Translation, translate};
use crate::device::DeviceInfo;
use crate::discovery::TopicScheme;
use crate::entity::{EntityMut, HubEntity, PassSelector, RegionSwitch, Vacuum};
use crate::error::{BridgeError, NotFoundError};
use crate::time::Timestamp;
use crate::topology::TopologyRegistry;

/// Attribute holding the number of known maps.
pub const MAP_COUNT_ATTRIBUTE: &str = "length_maps";

/// Effect of a hub message on one of the device's command topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandRoute {
    /// The vacuum received a command that must be translated for the robot.
    Vacuum(HubCommand),
    /// A switch or the selector took the payload; only a sync is needed.
    EntityUpdated,
}

/// Model of one robot and its hub entities.
#[derive(Debug, Clone)]
pub struct DeviceModel {
    pub(crate) device: DeviceInfo,
    pub(crate) scheme: TopicScheme,
    pub(crate) topology: TopologyRegistry,
    pub(crate) vacuum: Vacuum,
    pub(crate) switches: Vec<RegionSwitch>,
    pub(crate) selector: PassSelector,
}

impl DeviceModel {
    /// Create the model of a robot that has not reported anything yet.
    #[must_use]
    pub fn new(device: DeviceInfo, scheme: TopicScheme) -> Self {
        let vacuum = Vacuum::new(&scheme, &device);
        let selector = PassSelector::new(&scheme, &device.id);
        let mut model = Self {
            device,
            scheme,
            topology: TopologyRegistry::new(),
            vacuum,
            switches: Vec::new(),
            selector,
        };
        model.refresh_map_count();
        model
    }

    #[must_use]
    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    #[must_use]
    pub fn scheme(&self) -> &TopicScheme {
        &self.scheme
    }

    #[must_use]
    pub fn topology(&self) -> &TopologyRegistry {
        &self.topology
    }

    #[must_use]
    pub fn vacuum(&self) -> &Vacuum {
        &self.vacuum
    }

    #[must_use]
    pub fn switches(&self) -> &[RegionSwitch] {
        &self.switches
    }

    #[must_use]
    pub fn selector(&self) -> &PassSelector {
        &self.selector
    }

    /// Replace the topology with a persisted snapshot and derive its
    /// switches.
    ///
    /// Returns the command topics of the switches that were created.
    pub fn restore_topology(&mut self, topology: TopologyRegistry) -> Vec<String> {
        self.topology = topology;
        self.refresh_map_count();
        self.register_missing_switches()
    }

    /// Create a switch for every region that has none yet.
    ///
    /// Returns the command topics of the new switches.
    pub fn register_missing_switches(&mut self) -> Vec<String> {
        let switches = &self.switches;
        let created: Vec<RegionSwitch> = self
            .topology
            .unregistered_regions(|map_id, region_id| {
                switches.iter().any(|s| s.represents(map_id, region_id))
            })
            .map(|(map, region)| RegionSwitch::new(&self.scheme, &self.device.id, map, region))
            .collect();

        let topics = created
            .iter()
            .map(|s| s.core().topics.command.clone())
            .collect();
        self.switches.extend(created);
        topics
    }

    /// Every entity, vacuum first, together with the device they belong to.
    pub fn entities_mut(&mut self) -> (&DeviceInfo, Vec<EntityMut<'_>>) {
        let mut entities = Vec::with_capacity(self.switches.len() + 2);
        entities.push(EntityMut::Vacuum(&mut self.vacuum));
        entities.extend(self.switches.iter_mut().map(EntityMut::Switch));
        entities.push(EntityMut::Selector(&mut self.selector));
        (&self.device, entities)
    }

    /// Command topics of every entity, vacuum first.
    #[must_use]
    pub fn command_topics(&self) -> Vec<String> {
        std::iter::once(&self.vacuum.core().topics.command)
            .chain(self.switches.iter().map(|s| &s.core().topics.command))
            .chain(std::iter::once(&self.selector.core().topics.command))
            .cloned()
            .collect()
    }

    /// Deliver a hub message received on `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotFound`] when no entity owns `topic` and
    /// [`BridgeError::Validation`] when the payload is not acceptable for the
    /// entity. The entity is left unchanged in both cases.
    pub fn route_command(&mut self, topic: &str, payload: &str) -> Result<CommandRoute, BridgeError> {
        if self.vacuum.core().topics.command == topic {
            return Ok(CommandRoute::Vacuum(payload.parse()?));
        }
        if self.selector.core().topics.command == topic {
            self.selector.select(payload)?;
            return Ok(CommandRoute::EntityUpdated);
        }
        let switch = self
            .switches
            .iter_mut()
            .find(|s| s.core().topics.command == topic)
            .ok_or_else(|| NotFoundError {
                entity: "command topic",
                id: topic.to_string(),
            })?;
        switch.apply_command(payload)?;
        Ok(CommandRoute::EntityUpdated)
    }

    /// Regions whose switch is on, in switch creation order.
    ///
    /// Switches whose pair no longer resolves are skipped.
    #[must_use]
    pub fn selected_regions(&self) -> Vec<SelectedRegion> {
        self.switches
            .iter()
            .filter(|s| s.is_on())
            .filter_map(|s| self.topology.resolve(s.map_id(), s.region_id()))
            .map(|(map, region)| SelectedRegion {
                map_id: map.id.clone(),
                region_id: region.id.clone(),
                kind: region.kind,
            })
            .collect()
    }

    /// Translate a vacuum command against the current state.
    #[must_use]
    pub fn translate(&self, request: HubCommand, now: Timestamp) -> Translation {
        translate(
            request,
            self.vacuum.status(),
            &self.selected_regions(),
            self.selector.pass_mode(),
            now,
        )
    }

    pub(crate) fn refresh_map_count(&mut self) {
        let count = self.topology.map_count();
        self.vacuum.core_mut().set_attribute(MAP_COUNT_ATTRIBUTE, count);
    }
}
