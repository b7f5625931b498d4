//! Hub discovery protocol — topic layout and retained config payloads.

use serde::Serialize;

/// Namespace segment used inside entity topics.
pub const HUB_NAMESPACE: &str = "homeassistant";

/// Payload published to every availability topic.
pub const ONLINE: &str = "online";

/// Where entity topics live on the hub broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicScheme {
    /// Prefix the hub watches for discovery configs (e.g. `homeassistant`).
    pub discovery_prefix: String,
    /// Prefix of the bridge's own state/command topics (e.g. `roomba2mqtt`).
    pub base_topic: String,
}

impl Default for TopicScheme {
    fn default() -> Self {
        Self {
            discovery_prefix: "homeassistant".to_string(),
            base_topic: "roomba2mqtt".to_string(),
        }
    }
}

impl TopicScheme {
    /// Topic set of one entity.
    ///
    /// `node` is the device id, optionally suffixed with `_<sub-id>` for
    /// entities other than the vacuum.
    #[must_use]
    pub fn entity_topics(&self, kind: &str, node: &str) -> EntityTopics {
        let base = format!("{}/{kind}/{HUB_NAMESPACE}/{node}", self.base_topic);
        EntityTopics {
            config: format!("{}/{kind}/{node}/{kind}/config", self.discovery_prefix),
            availability: format!("{base}/available"),
            state: format!("{base}/state"),
            command: format!("{base}/command"),
            attributes: format!("{base}/attributes"),
        }
    }

    /// Topic that mirrors a raw device payload.
    #[must_use]
    pub fn raw_topic(&self, device_topic: &str) -> String {
        format!(
            "{}/raw/{}",
            self.base_topic,
            device_topic.trim_start_matches('/')
        )
    }
}

/// Topics of one hub entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTopics {
    pub config: String,
    pub availability: String,
    pub state: String,
    pub command: String,
    pub attributes: String,
}

/// `device` block shared by every entity of a robot.
#[derive(Debug, Serialize)]
pub struct DeviceDescriptor<'a> {
    pub name: &'a str,
    pub identifiers: [&'a str; 1],
    pub manufacturer: &'a str,
    pub model: &'a str,
    pub sw_version: &'a str,
    pub configuration_url: &'a str,
}

/// Discovery config of the vacuum entity (state schema).
#[derive(Debug, Serialize)]
pub struct VacuumConfig<'a> {
    pub name: &'a str,
    pub schema: &'static str,
    pub supported_features: &'static [&'static str],
    pub availability_topic: &'a str,
    pub command_topic: &'a str,
    pub state_topic: &'a str,
    pub json_attributes_topic: &'a str,
    pub error_topic: &'a str,
    pub error_template: &'static str,
    pub unique_id: &'a str,
    pub device: DeviceDescriptor<'a>,
}

/// Discovery config of a toggle entity.
#[derive(Debug, Serialize)]
pub struct SwitchConfig<'a> {
    pub name: &'a str,
    pub command_topic: &'a str,
    pub availability_topic: &'a str,
    pub json_attributes_topic: &'a str,
    pub state_topic: &'a str,
    pub unique_id: &'a str,
    pub device: DeviceDescriptor<'a>,
    pub payload_off: &'static str,
    pub payload_on: &'static str,
    pub icon: &'a str,
}

/// Discovery config of a select entity.
#[derive(Debug, Serialize)]
pub struct SelectConfig<'a> {
    pub name: &'a str,
    pub command_topic: &'a str,
    pub availability_topic: &'a str,
    pub json_attributes_topic: &'a str,
    pub state_topic: &'a str,
    pub unique_id: &'a str,
    pub device: DeviceDescriptor<'a>,
    pub icon: &'a str,
    pub options: &'a [String],
    pub entity_category: &'static str,
}

/// Serialize a payload the bridge itself built.
///
/// # Panics
///
/// Panics if serialization fails. Every payload passed here is made of
/// strings, numbers and string-keyed maps, so a failure is a programming
/// error rather than a runtime condition.
#[must_use]
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
    match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(err) => panic!("hub payload must always encode: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_vacuum_topics() {
        let topics = TopicScheme::default().entity_topics("vacuum", "BLID1");
        assert_eq!(topics.config, "homeassistant/vacuum/BLID1/vacuum/config");
        assert_eq!(
            topics.state,
            "roomba2mqtt/vacuum/homeassistant/BLID1/state"
        );
        assert_eq!(
            topics.availability,
            "roomba2mqtt/vacuum/homeassistant/BLID1/available"
        );
        assert_eq!(
            topics.command,
            "roomba2mqtt/vacuum/homeassistant/BLID1/command"
        );
        assert_eq!(
            topics.attributes,
            "roomba2mqtt/vacuum/homeassistant/BLID1/attributes"
        );
    }

    #[test]
    fn should_build_sub_entity_topics() {
        let scheme = TopicScheme {
            discovery_prefix: "ha".to_string(),
            base_topic: "bridge".to_string(),
        };
        let topics = scheme.entity_topics("switch", "BLID1_rid4");
        assert_eq!(topics.config, "ha/switch/BLID1_rid4/switch/config");
        assert_eq!(
            topics.command,
            "bridge/switch/homeassistant/BLID1_rid4/command"
        );
    }

    #[test]
    fn should_build_raw_topic() {
        let scheme = TopicScheme::default();
        assert_eq!(
            scheme.raw_topic("$aws/things/BLID1/shadow/update"),
            "roomba2mqtt/raw/$aws/things/BLID1/shadow/update"
        );
    }

    #[test]
    fn should_encode_plain_values() {
        assert_eq!(encode(&["a", "b"]), br#"["a","b"]"#.to_vec());
    }
}
