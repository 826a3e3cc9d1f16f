use crate::consts;
use crate::helpers::{Helper, HelperKind, HelperState, RemoteDevice};
use crate::trigger::{TriggerCatalog, TriggerKey};
use serde::Serialize;
use std::collections::BTreeMap;

/// Device identifier
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct DeviceId {
    pub name: String,
    /// `eglo_remote_<ieee>` to uniquely identify a remote.
    pub identifiers: Vec<String>,
    pub manufacturer: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_area: Option<String>,
}

impl DeviceId {
    pub fn new(device: &RemoteDevice, ieee: &str) -> Self {
        Self {
            name: device.name.clone(),
            identifiers: vec![device_identifier(ieee)],
            manufacturer: device.manufacturer.clone(),
            model: device.model.clone(),
            suggested_area: device.area.clone(),
        }
    }
}

/// Discovery origin - this software identifier.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Origin {
    name: String,
    sw_version: String,
    support_url: String,
}

impl Default for Origin {
    fn default() -> Self {
        Self {
            name: consts::GATE_NAME.to_string(),
            sw_version: consts::GATE_VERSION.to_string(),
            support_url: consts::GATE_URL.to_string(),
        }
    }
}

pub fn device_identifier(ieee: &str) -> String {
    format!("eglo_remote_{}", consts::clean_ieee(ieee))
}

/// Topic the gate publishes fired trigger payloads to.
pub fn action_topic(ieee: &str) -> String {
    format!("{}/{}/action", consts::HA_CONTROL_TOPIC, consts::clean_ieee(ieee))
}

/// Topic the gate publishes every handled command to, as JSON.
pub fn event_topic(ieee: &str) -> String {
    format!("{}/{}/event", consts::HA_CONTROL_TOPIC, consts::clean_ieee(ieee))
}

fn helper_topic(helper: &Helper, leaf: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        consts::HA_CONTROL_TOPIC,
        consts::clean_ieee(&helper.device),
        helper.kind.object(),
        leaf
    )
}

pub fn state_topic(helper: &Helper) -> String {
    helper_topic(helper, "state")
}

pub fn command_topic(helper: &Helper) -> Option<String> {
    match helper.kind {
        HelperKind::LastActivity => None,
        _ => Some(helper_topic(helper, "set")),
    }
}

pub fn options_topic(helper: &Helper) -> Option<String> {
    match helper.state {
        HelperState::Select { .. } => Some(helper_topic(helper, "options/set")),
        _ => None,
    }
}

/// One device automation trigger.
// config topic: homeassistant/device_automation/<node_id>/<object_id>/config
// node_id == device identifier, object_id == trigger payload.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DeviceTrigger {
    #[serde(skip)]
    pub config_topic: String,

    pub automation_type: &'static str,
    pub topic: String,
    #[serde(rename = "type")]
    pub trigger_type: String,
    pub subtype: String,
    pub payload: String,
    pub device: DeviceId,
    pub origin: Origin,
}

impl DeviceTrigger {
    pub fn new(device: &RemoteDevice, ieee: &str, key: &TriggerKey) -> Self {
        let device_id = DeviceId::new(device, ieee);
        let payload = key.payload();
        Self {
            config_topic: format!(
                "{}/device_automation/{}/{}/config",
                consts::HA_DISCOVERY_TOPIC,
                device_id.identifiers[0],
                payload
            ),
            automation_type: "trigger",
            topic: action_topic(ieee),
            trigger_type: key.press_type.as_str().to_string(),
            subtype: key.action.clone(),
            payload,
            device: device_id,
            origin: Origin::default(),
        }
    }

    pub fn serialize(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Every trigger of the catalog, in key order.
pub fn device_triggers(
    device: &RemoteDevice,
    ieee: &str,
    catalog: &TriggerCatalog,
) -> Vec<DeviceTrigger> {
    catalog
        .iter()
        .map(|(key, _)| DeviceTrigger::new(device, ieee, key))
        .collect()
}

/// Represents a component - a part of Device defined by Discovery
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    pub icon: String,
    pub unique_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_topic: Option<String>,
    pub state_topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl Component {
    pub fn from_helper(helper: &Helper) -> Self {
        let (platform, device_class, icon, options) = match &helper.state {
            HelperState::Select { options, .. } => {
                let icon = if helper.kind == HelperKind::CurrentLight {
                    "mdi:lightbulb"
                } else {
                    "mdi:home-map-marker"
                };
                ("select", None, icon, Some(options.clone()))
            }
            HelperState::Text { .. } => ("text", None, "mdi:home", None),
            // MQTT has no datetime platform.
            HelperState::Datetime { .. } => {
                ("sensor", Some("timestamp".to_string()), "mdi:clock", None)
            }
        };

        Self {
            name: helper.name.clone(),
            platform: platform.to_string(),
            device_class,
            icon: icon.to_string(),
            unique_id: helper.unique_id.clone(),
            command_topic: command_topic(helper),
            state_topic: state_topic(helper),
            options,
        }
    }
}

// config topic: homeassistant/device/<identifier>/config
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Discovery {
    pub device: DeviceId,
    pub origin: Origin,

    pub components: BTreeMap<String, Component>,
}

impl Discovery {
    pub fn config_topic(&self) -> String {
        format!(
            "{}/device/{}/config",
            consts::HA_DISCOVERY_TOPIC,
            self.device.identifiers.first().map(String::as_str).unwrap_or_default()
        )
    }

    pub fn serialize(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Helper entities of a remote as a single device discovery.
pub fn new_device<'a, I>(device: &RemoteDevice, ieee: &str, helpers: I) -> Discovery
where
    I: IntoIterator<Item = &'a Helper>,
{
    let components = helpers
        .into_iter()
        .map(|helper| (helper.kind.object().to_string(), Component::from_helper(helper)))
        .collect();

    Discovery {
        device: DeviceId::new(device, ieee),
        origin: Origin::default(),
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quirks::{AwoxVariant, QuirkRegistry};
    use crate::trigger::PressType;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};

    fn remote() -> RemoteDevice {
        RemoteDevice {
            ieee: Some("a4:c1:38:00:00:00:00:01".to_string()),
            name: "Living".to_string(),
            manufacturer: "AwoX".to_string(),
            model: "ERCU_3groups_Zm".to_string(),
            area: Some("Living Room".to_string()),
        }
    }

    fn helper(kind: HelperKind, state: HelperState) -> Helper {
        Helper {
            device: "a4:c1:38:00:00:00:00:01".to_string(),
            kind,
            unique_id: crate::helpers::unique_id("a4:c1:38:00:00:00:00:01", kind),
            name: "Eglo Remote Living".to_string(),
            state,
        }
    }

    #[test]
    fn test_trigger_payload() {
        let key = TriggerKey::new(PressType::LongPress, "red_long_2");
        let trigger = DeviceTrigger::new(&remote(), "a4:c1:38:00:00:00:00:01", &key);

        assert_eq!(
            trigger.config_topic,
            "homeassistant/device_automation/eglo_remote_a4c1380000000001/red_long_2_remote_button_long_press/config"
        );
        let value: Value = serde_json::from_str(&trigger.serialize()).unwrap();
        assert_eq!(value["automation_type"], "trigger");
        assert_eq!(value["topic"], "eglo/a4c1380000000001/action");
        assert_eq!(value["type"], "remote_button_long_press");
        assert_eq!(value["subtype"], "red_long_2");
        assert_eq!(value["payload"], "red_long_2_remote_button_long_press");
        assert_eq!(
            value["device"],
            json!({
                "name": "Living",
                "identifiers": ["eglo_remote_a4c1380000000001"],
                "manufacturer": "AwoX",
                "model": "ERCU_3groups_Zm",
                "suggested_area": "Living Room",
            })
        );
        assert_eq!(value["origin"]["name"], "eglo-gate");
        assert!(value.get("config_topic").is_none());
    }

    #[test]
    fn test_one_trigger_per_catalog_entry() {
        let registry = QuirkRegistry::new(AwoxVariant::ThreeBanks).unwrap();
        let quirk = registry.find_by_model("AwoX", "ERCU_3groups_Zm").unwrap();
        let triggers = device_triggers(&remote(), "a4:c1:38:00:00:00:00:01", &quirk.catalog);

        assert_eq!(triggers.len(), 66);
        let topics: std::collections::BTreeSet<&str> =
            triggers.iter().map(|t| t.config_topic.as_str()).collect();
        assert_eq!(topics.len(), 66);
    }

    #[test]
    fn test_helper_components() {
        let helpers = vec![
            helper(
                HelperKind::CurrentArea,
                HelperState::Select {
                    options: vec!["all".to_string()],
                    current: Some("all".to_string()),
                },
            ),
            helper(HelperKind::DefaultArea, HelperState::Text { value: String::new() }),
            helper(
                HelperKind::LastActivity,
                HelperState::Datetime {
                    has_date: true,
                    has_time: true,
                    value: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
                },
            ),
        ];
        let discovery = new_device(&remote(), "a4:c1:38:00:00:00:00:01", &helpers);
        assert_eq!(
            discovery.config_topic(),
            "homeassistant/device/eglo_remote_a4c1380000000001/config"
        );

        let value: Value = serde_json::from_str(&discovery.serialize()).unwrap();
        let area = &value["components"]["current_area"];
        assert_eq!(area["platform"], "select");
        assert_eq!(area["options"], json!(["all"]));
        assert_eq!(
            area["command_topic"],
            "eglo/a4c1380000000001/current_area/set"
        );
        assert_eq!(area["state_topic"], "eglo/a4c1380000000001/current_area/state");

        assert_eq!(value["components"]["default_area"]["platform"], "text");
        let activity = &value["components"]["last_activity"];
        assert_eq!(activity["platform"], "sensor");
        assert_eq!(activity["device_class"], "timestamp");
        assert!(activity.get("command_topic").is_none());

        assert_eq!(options_topic(&helpers[0]).unwrap(), "eglo/a4c1380000000001/current_area/options/set");
        assert!(options_topic(&helpers[1]).is_none());
    }
}
