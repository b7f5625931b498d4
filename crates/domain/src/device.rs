//! Device — the robot the bridge represents on the hub.

use crate::discovery::DeviceDescriptor;
use crate::error::{BridgeError, ValidationError};
use crate::id::DeviceId;

/// Manufacturer reported in every discovery payload.
pub const MANUFACTURER: &str = "iRobot";

/// Link shown by the hub on the device page.
pub const CONFIGURATION_URL: &str = "https://github.com/roombridge/roombridge";

/// Identity of one robot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: DeviceId,
    /// Host of the robot's local broker.
    pub address: String,
    pub name: String,
    pub model: String,
    pub sw_version: String,
    pub manufacturer: String,
    pub configuration_url: String,
}

impl DeviceInfo {
    /// Create the identity of a robot that has not reported anything yet.
    ///
    /// The display name falls back to the device id until the robot
    /// reports its own name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyDeviceId`] when `id` is empty.
    pub fn new(id: DeviceId, address: impl Into<String>) -> Result<Self, BridgeError> {
        if id.is_empty() {
            return Err(ValidationError::EmptyDeviceId.into());
        }
        Ok(Self {
            name: id.to_string(),
            id,
            address: address.into(),
            model: String::new(),
            sw_version: String::new(),
            manufacturer: MANUFACTURER.to_string(),
            configuration_url: CONFIGURATION_URL.to_string(),
        })
    }

    /// Descriptor embedded in every discovery payload of this device.
    #[must_use]
    pub fn descriptor(&self) -> DeviceDescriptor<'_> {
        DeviceDescriptor {
            name: &self.name,
            identifiers: [self.id.as_str()],
            manufacturer: &self.manufacturer,
            model: &self.model,
            sw_version: &self.sw_version,
            configuration_url: &self.configuration_url,
        }
    }
}

/// Overwrite `field` with `value`, reporting whether it changed.
pub(crate) fn replace_if_changed(field: &mut String, value: &str) -> bool {
    if field == value {
        return false;
    }
    value.clone_into(field);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_empty_device_id() {
        let result = DeviceInfo::new(DeviceId::new(""), "10.0.0.2");
        assert!(matches!(
            result,
            Err(BridgeError::Validation(ValidationError::EmptyDeviceId))
        ));
    }

    #[test]
    fn should_default_name_to_device_id() {
        let device = DeviceInfo::new(DeviceId::new("BLID1"), "10.0.0.2").unwrap();
        assert_eq!(device.name, "BLID1");
        assert_eq!(device.manufacturer, MANUFACTURER);
    }

    #[test]
    fn should_render_descriptor() {
        let mut device = DeviceInfo::new(DeviceId::new("BLID1"), "10.0.0.2").unwrap();
        device.model = "i7".to_string();
        let json = serde_json::to_value(device.descriptor()).unwrap();
        assert_eq!(json["identifiers"], serde_json::json!(["BLID1"]));
        assert_eq!(json["model"], "i7");
        assert_eq!(json["manufacturer"], "iRobot");
    }

    #[test]
    fn should_report_change_only_when_value_differs() {
        let mut field = "a".to_string();
        assert!(!replace_if_changed(&mut field, "a"));
        assert!(replace_if_changed(&mut field, "b"));
        assert_eq!(field, "b");
    }
}
