//! Clean-pass selector — chooses one or two passes for spot cleans.

use super::{EntityCore, EntityKind, HubEntity};
use crate::device::DeviceInfo;
use crate::discovery::{SelectConfig, TopicScheme, encode};
use crate::error::ValidationError;
use crate::id::DeviceId;

/// Options offered by the selector, the first being the default.
pub const PASS_OPTIONS: [&str; 2] = ["One", "Two"];

/// Number of passes requested for each region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassMode {
    #[default]
    One,
    Two,
}

impl PassMode {
    /// Interpret a selector value; only `two` (any case) means two passes.
    #[must_use]
    pub fn from_option(option: &str) -> Self {
        if option.eq_ignore_ascii_case("two") {
            Self::Two
        } else {
            Self::One
        }
    }
}

/// Select entity holding the clean-pass mode.
#[derive(Debug, Clone)]
pub struct PassSelector {
    core: EntityCore,
    options: Vec<String>,
    selected: String,
}

impl PassSelector {
    /// Create the selector of a device, defaulting to the first option.
    #[must_use]
    pub fn new(scheme: &TopicScheme, device_id: &DeviceId) -> Self {
        let topics = scheme.entity_topics(
            EntityKind::Select.as_str(),
            &format!("{device_id}_clean_pass"),
        );
        let mut core = EntityCore::new(
            format!("roomba_select_{device_id}_clean_pass"),
            "clean_pass".to_string(),
            topics,
        );
        core.icon = Some("mdi:spray-bottle".to_string());
        let options: Vec<String> = PASS_OPTIONS.iter().map(ToString::to_string).collect();
        Self {
            core,
            selected: options[0].clone(),
            options,
        }
    }

    #[must_use]
    pub fn selected(&self) -> &str {
        &self.selected
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn pass_mode(&self) -> PassMode {
        PassMode::from_option(&self.selected)
    }

    /// Select an option; marks the state dirty.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownOption`] when `option` is not one of
    /// the offered options. The selection is left unchanged.
    pub fn select(&mut self, option: &str) -> Result<(), ValidationError> {
        if !self.options.iter().any(|o| o == option) {
            return Err(ValidationError::UnknownOption {
                option: option.to_string(),
                allowed: self.options.clone(),
            });
        }
        option.clone_into(&mut self.selected);
        self.core.mark_state_dirty();
        Ok(())
    }
}

impl HubEntity for PassSelector {
    fn kind(&self) -> EntityKind {
        EntityKind::Select
    }

    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn config_payload(&self, device: &DeviceInfo) -> Vec<u8> {
        let topics = &self.core.topics;
        encode(&SelectConfig {
            name: &self.core.name,
            command_topic: &topics.command,
            availability_topic: &topics.availability,
            json_attributes_topic: &topics.attributes,
            state_topic: &topics.state,
            unique_id: &self.core.unique_id,
            device: device.descriptor(),
            icon: self.core.icon.as_deref().unwrap_or_default(),
            options: &self.options,
            entity_category: "config",
        })
    }

    fn state_payload(&self) -> Vec<u8> {
        self.selected.as_bytes().to_vec()
    }
}
