use super::discovery;
use crate::handler::{CommandEvent, RemoteAction};
use crate::quirks::DeviceSignature;
use serde::Deserialize;

/// Things we sent to HA.
#[derive(Debug)]
pub enum Outgoing {
    /// Subscribe to a new topic given as argument. Not a real message.
    Subscribe(String),
    /// Send on initialization once.
    Initial,
    /// One device automation trigger, sent to
    /// homeassistant/device_automation/<node_id>/<object_id>/config
    DiscoveryTrigger(discovery::DeviceTrigger),
    /// Helper entities of a remote, sent to
    /// homeassistant/device/eglo_remote_<ieee>/config
    DiscoveryDevice(discovery::Discovery),
    /// Retained entity state.
    State { topic: String, payload: String },
    /// Remote button handled; fires the matched triggers.
    Action(RemoteAction),
}

/// Device joined the network, as reported by the Zigbee bridge.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DeviceAnnounce {
    pub ieee: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(flatten)]
    pub signature: DeviceSignature,
}

/// Things HA and the bridge send to us.
#[derive(Debug, PartialEq)]
pub enum Incoming {
    Announce(DeviceAnnounce),
    Command(CommandEvent),

    /// Helper entity changed from HA: selected option or text value.
    HelperSet {
        /// IEEE of the remote with colons removed.
        device: String,
        object: String,
        value: String,
    },
    /// New list of options for a select helper.
    HelperOptions {
        device: String,
        object: String,
        options: Vec<String>,
    },
}
