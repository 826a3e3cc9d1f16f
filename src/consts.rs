/// Software version
pub const GATE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GATE_NAME: &str = "eglo-gate";
pub const GATE_URL: &str = env!("CARGO_PKG_HOMEPAGE");

pub const HA_DISCOVERY_TOPIC: &str = "homeassistant";
pub const HA_CONTROL_TOPIC: &str = "eglo";
/// Default prefix of the Zigbee bridge events.
pub const BRIDGE_TOPIC: &str = "zigbee-bridge";

/// Domain name used for helper unique ids and the storage key.
pub const DOMAIN: &str = "eglo_remote_zha";

pub const EGLO_MANUFACTURER: &str = "AwoX";
pub const EGLO_MODEL: &str = "ERCU_3groups_Zm";

/// ZHA home automation profile.
pub const ZHA_PROFILE_ID: u16 = 0x0104;
/// Vendor profile of the AwoX endpoint 3.
pub const AWOX_PROFILE_ID: u16 = 0x128F;

pub mod device_type {
    pub const ON_OFF_LIGHT_SWITCH: u16 = 0x0103;
    pub const COLOR_CONTROLLER: u16 = 0x0800;
}

/// Zigbee groups the AwoX remote addresses per bank.
pub const GROUP_ID_1: u16 = 0x800A;
pub const GROUP_ID_2: u16 = 0x800B;
pub const GROUP_ID_3: u16 = 0x800C;

/// Strip colons from an IEEE address so it can be part of an entity id.
pub fn clean_ieee(ieee: &str) -> String {
    ieee.replace(':', "")
}
