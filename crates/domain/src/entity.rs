//! Entities — the hub-visible representation of a robot.
//!
//! Every entity is an [`EntityCore`] (identity, topics, attributes, dirty
//! flags) composed with kind-specific data:
//!
//! | Kind | Type | Extra data |
//! |------|------|------------|
//! | vacuum | [`Vacuum`] | status, battery, error sources |
//! | switch | [`RegionSwitch`] | `(map id, region id)` and on/off |
//! | select | [`PassSelector`] | option set and selection |
//!
//! [`EntityMut`] is the closed set the synchronizer walks.

mod attribute_value;
mod pass_selector;
mod region_switch;
mod state;
mod vacuum;

pub use attribute_value::AttributeValue;
pub use pass_selector::{PASS_OPTIONS, PassMode, PassSelector};
pub use region_switch::{RegionSwitch, SWITCH_OFF, SWITCH_ON};
pub use state::VacuumStatus;
pub use vacuum::{ErrorSource, Vacuum};

use std::collections::BTreeMap;

use crate::device::DeviceInfo;
use crate::discovery::{EntityTopics, encode};

/// Hub component an entity is announced as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Vacuum,
    Switch,
    Select,
}

impl EntityKind {
    /// Component name used in topics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vacuum => "vacuum",
            Self::Switch => "switch",
            Self::Select => "select",
        }
    }
}

/// Which payloads differ from what was last published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyFlags {
    pub config: bool,
    pub state: bool,
    pub attributes: bool,
}

impl DirtyFlags {
    /// Whether any payload is pending.
    #[must_use]
    pub fn any(self) -> bool {
        self.config || self.state || self.attributes
    }
}

/// Fields shared by every entity kind.
#[derive(Debug, Clone)]
pub struct EntityCore {
    pub unique_id: String,
    pub name: String,
    pub icon: Option<String>,
    pub topics: EntityTopics,
    attributes: BTreeMap<String, AttributeValue>,
    dirty: DirtyFlags,
}

impl EntityCore {
    /// A new entity must announce itself before it reports state, so both
    /// the config and state flags start set.
    pub(crate) fn new(unique_id: String, name: String, topics: EntityTopics) -> Self {
        Self {
            unique_id,
            name,
            icon: None,
            topics,
            attributes: BTreeMap::new(),
            dirty: DirtyFlags {
                config: true,
                state: true,
                attributes: false,
            },
        }
    }

    /// Current dirty flags.
    #[must_use]
    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn mark_config_dirty(&mut self) {
        self.dirty.config = true;
    }

    pub fn mark_state_dirty(&mut self) {
        self.dirty.state = true;
    }

    pub fn mark_attributes_dirty(&mut self) {
        self.dirty.attributes = true;
    }

    pub fn clear_config_dirty(&mut self) {
        self.dirty.config = false;
    }

    pub fn clear_state_dirty(&mut self) {
        self.dirty.state = false;
    }

    pub fn clear_attributes_dirty(&mut self) {
        self.dirty.attributes = false;
    }

    /// Look up an attribute.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// All attributes, sorted by key.
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    /// Set an attribute; marks the attributes dirty only on change.
    pub fn set_attribute(&mut self, key: &str, value: impl Into<AttributeValue>) -> bool {
        let value = value.into();
        if self.attributes.get(key) == Some(&value) {
            return false;
        }
        self.attributes.insert(key.to_string(), value);
        self.dirty.attributes = true;
        true
    }

    /// Remove an attribute; marks the attributes dirty only if it existed.
    pub fn remove_attribute(&mut self, key: &str) -> bool {
        if self.attributes.remove(key).is_some() {
            self.dirty.attributes = true;
            return true;
        }
        false
    }
}

/// Uniform view over every entity kind.
pub trait HubEntity {
    /// Hub component of this entity.
    fn kind(&self) -> EntityKind;

    fn core(&self) -> &EntityCore;

    fn core_mut(&mut self) -> &mut EntityCore;

    /// Retained discovery config.
    fn config_payload(&self, device: &DeviceInfo) -> Vec<u8>;

    /// State payload in the kind's format.
    fn state_payload(&self) -> Vec<u8>;

    /// Attribute map as one JSON object.
    fn attributes_payload(&self) -> Vec<u8> {
        encode(self.core().attributes())
    }
}

/// Mutable borrow of one entity of a device, vacuum first.
#[derive(Debug)]
pub enum EntityMut<'a> {
    Vacuum(&'a mut Vacuum),
    Switch(&'a mut RegionSwitch),
    Selector(&'a mut PassSelector),
}

impl HubEntity for EntityMut<'_> {
    fn kind(&self) -> EntityKind {
        match self {
            Self::Vacuum(e) => e.kind(),
            Self::Switch(e) => e.kind(),
            Self::Selector(e) => e.kind(),
        }
    }

    fn core(&self) -> &EntityCore {
        match self {
            Self::Vacuum(e) => e.core(),
            Self::Switch(e) => e.core(),
            Self::Selector(e) => e.core(),
        }
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        match self {
            Self::Vacuum(e) => e.core_mut(),
            Self::Switch(e) => e.core_mut(),
            Self::Selector(e) => e.core_mut(),
        }
    }

    fn config_payload(&self, device: &DeviceInfo) -> Vec<u8> {
        match self {
            Self::Vacuum(e) => e.config_payload(device),
            Self::Switch(e) => e.config_payload(device),
            Self::Selector(e) => e.config_payload(device),
        }
    }

    fn state_payload(&self) -> Vec<u8> {
        match self {
            Self::Vacuum(e) => e.state_payload(),
            Self::Switch(e) => e.state_payload(),
            Self::Selector(e) => e.state_payload(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::TopicScheme;

    fn core() -> EntityCore {
        EntityCore::new(
            "uid".to_string(),
            "name".to_string(),
            TopicScheme::default().entity_topics("switch", "D_x"),
        )
    }

    #[test]
    fn should_start_with_config_and_state_dirty() {
        let core = core();
        assert_eq!(
            core.dirty(),
            DirtyFlags {
                config: true,
                state: true,
                attributes: false
            }
        );
    }

    #[test]
    fn should_mark_attributes_dirty_on_change_only() {
        let mut core = core();
        assert!(core.set_attribute("bin_full", false));
        assert!(core.dirty().attributes);

        core.clear_attributes_dirty();
        assert!(!core.set_attribute("bin_full", false));
        assert!(!core.dirty().attributes);
    }

    #[test]
    fn should_mark_dirty_when_removing_existing_attribute() {
        let mut core = core();
        core.set_attribute("error", "Stuck");
        core.clear_attributes_dirty();

        assert!(!core.remove_attribute("missing"));
        assert!(!core.dirty().attributes);
        assert!(core.remove_attribute("error"));
        assert!(core.dirty().attributes);
    }

    #[test]
    fn should_leave_other_flags_untouched() {
        let mut core = core();
        core.clear_config_dirty();
        core.clear_state_dirty();
        core.set_attribute("pad", "reusableDry");
        assert!(!core.dirty().config);
        assert!(!core.dirty().state);
    }

    #[test]
    fn should_name_components() {
        assert_eq!(EntityKind::Vacuum.as_str(), "vacuum");
        assert_eq!(EntityKind::Switch.as_str(), "switch");
        assert_eq!(EntityKind::Select.as_str(), "select");
    }
}
