// Subset of the Zigbee Cluster Library the remotes talk.
use crate::trigger::Params;
use tracing::warn;

pub mod cluster_id {
    pub const BASIC: u16 = 0x0000;
    pub const POWER_CONFIGURATION: u16 = 0x0001;
    pub const IDENTIFY: u16 = 0x0003;
    pub const GROUPS: u16 = 0x0004;
    pub const SCENES: u16 = 0x0005;
    pub const ON_OFF: u16 = 0x0006;
    pub const LEVEL_CONTROL: u16 = 0x0008;
    pub const OTA: u16 = 0x0019;
    pub const COLOR: u16 = 0x0300;
    pub const LIGHT_LINK: u16 = 0x1000;

    /// Eglo manufacturer specific remote cluster.
    pub const EGLO_REMOTE: u16 = 0xFC00;
    /// Clusters on the AwoX vendor endpoint. Carried through untouched.
    pub const AWOX_FF50: u16 = 0xFF50;
    pub const AWOX_FF51: u16 = 0xFF51;
}

/// Clusters we know by name. Everything else is kept as a raw id.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ClusterKind {
    Basic,
    PowerConfiguration,
    Identify,
    Groups,
    Scenes,
    OnOff,
    LevelControl,
    Ota,
    Color,
    LightLink,
    Other(u16),
}

impl ClusterKind {
    pub fn id(self) -> u16 {
        match self {
            ClusterKind::Basic => cluster_id::BASIC,
            ClusterKind::PowerConfiguration => cluster_id::POWER_CONFIGURATION,
            ClusterKind::Identify => cluster_id::IDENTIFY,
            ClusterKind::Groups => cluster_id::GROUPS,
            ClusterKind::Scenes => cluster_id::SCENES,
            ClusterKind::OnOff => cluster_id::ON_OFF,
            ClusterKind::LevelControl => cluster_id::LEVEL_CONTROL,
            ClusterKind::Ota => cluster_id::OTA,
            ClusterKind::Color => cluster_id::COLOR,
            ClusterKind::LightLink => cluster_id::LIGHT_LINK,
            ClusterKind::Other(id) => id,
        }
    }

    pub fn from_id(id: u16) -> Self {
        match id {
            cluster_id::BASIC => ClusterKind::Basic,
            cluster_id::POWER_CONFIGURATION => ClusterKind::PowerConfiguration,
            cluster_id::IDENTIFY => ClusterKind::Identify,
            cluster_id::GROUPS => ClusterKind::Groups,
            cluster_id::SCENES => ClusterKind::Scenes,
            cluster_id::ON_OFF => ClusterKind::OnOff,
            cluster_id::LEVEL_CONTROL => ClusterKind::LevelControl,
            cluster_id::OTA => ClusterKind::Ota,
            cluster_id::COLOR => ClusterKind::Color,
            cluster_id::LIGHT_LINK => ClusterKind::LightLink,
            other => ClusterKind::Other(other),
        }
    }

    /// Client to server commands of this cluster.
    pub fn server_commands(self) -> &'static [CommandDef] {
        match self {
            ClusterKind::OnOff => commands::ON_OFF,
            ClusterKind::LevelControl => commands::LEVEL_CONTROL,
            ClusterKind::Scenes => commands::SCENES,
            ClusterKind::Color => commands::COLOR,
            _ => &[],
        }
    }

    /// Manufacturer specific commands the AwoX remote adds to this cluster.
    pub fn awox_commands(self) -> &'static [CommandDef] {
        match self {
            ClusterKind::LevelControl => commands::AWOX_LEVEL_CONTROL_OVERRIDES,
            ClusterKind::Color => commands::AWOX_COLOR_OVERRIDES,
            _ => &[],
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FieldType {
    U8,
    U16,
    I16,
}

impl FieldType {
    fn size(self) -> usize {
        match self {
            FieldType::U8 => 1,
            FieldType::U16 | FieldType::I16 => 2,
        }
    }

    fn read(self, data: &[u8]) -> i64 {
        match self {
            FieldType::U8 => data[0] as i64,
            FieldType::U16 => u16::from_le_bytes([data[0], data[1]]) as i64,
            FieldType::I16 => i16::from_le_bytes([data[0], data[1]]) as i64,
        }
    }
}

/// Schema of a single cluster command.
#[derive(Debug)]
pub struct CommandDef {
    pub id: u8,
    pub name: &'static str,
    pub fields: &'static [(&'static str, FieldType)],
    pub manufacturer_specific: bool,
}

const fn cmd(
    id: u8,
    name: &'static str,
    fields: &'static [(&'static str, FieldType)],
) -> CommandDef {
    CommandDef {
        id,
        name,
        fields,
        manufacturer_specific: false,
    }
}

const fn manufacturer_cmd(
    id: u8,
    name: &'static str,
    fields: &'static [(&'static str, FieldType)],
) -> CommandDef {
    CommandDef {
        id,
        name,
        fields,
        manufacturer_specific: true,
    }
}

pub mod commands {
    use super::FieldType::{I16, U16, U8};
    use super::{cmd, manufacturer_cmd, CommandDef};

    pub const OFF: &str = "off";
    pub const ON: &str = "on";
    pub const MOVE: &str = "move";
    pub const STOP: &str = "stop";
    pub const STEP_ON_OFF: &str = "step_with_on_off";
    pub const MOVE_TO_LEVEL_ON_OFF: &str = "move_to_level_with_on_off";
    pub const RECALL: &str = "recall";
    pub const STORE: &str = "store";
    pub const MOVE_TO_HUE_SATURATION: &str = "move_to_hue_and_saturation";
    pub const MOVE_TO_COLOR_TEMP: &str = "move_to_color_temp";
    pub const ENHANCED_MOVE_HUE: &str = "enhanced_move_hue";
    pub const STEP_COLOR_TEMP: &str = "step_color_temp";
    pub const AWOX_COLOR: &str = "awox_color";
    pub const AWOX_REFRESH: &str = "awox_refresh";

    pub static ON_OFF: &[CommandDef] = &[
        cmd(0x00, OFF, &[]),
        cmd(0x01, ON, &[]),
        cmd(0x02, "toggle", &[]),
        cmd(0x40, "off_with_effect", &[("effect_id", U8), ("effect_variant", U8)]),
        cmd(0x41, "on_with_recall_global_scene", &[]),
        cmd(
            0x42,
            "on_with_timed_off",
            &[("on_off_control", U8), ("on_time", U16), ("off_wait_time", U16)],
        ),
    ];

    pub static LEVEL_CONTROL: &[CommandDef] = &[
        cmd(0x00, "move_to_level", &[("level", U8), ("transition_time", U16)]),
        cmd(0x01, MOVE, &[("move_mode", U8), ("rate", U8)]),
        cmd(
            0x02,
            "step",
            &[("step_mode", U8), ("step_size", U8), ("transition_time", U16)],
        ),
        cmd(0x03, STOP, &[]),
        cmd(0x04, MOVE_TO_LEVEL_ON_OFF, &[("level", U8), ("transition_time", U16)]),
        cmd(0x05, "move_with_on_off", &[("move_mode", U8), ("rate", U8)]),
        cmd(
            0x06,
            STEP_ON_OFF,
            &[("step_mode", U8), ("step_size", U8), ("transition_time", U16)],
        ),
        cmd(0x07, "stop_with_on_off", &[]),
    ];

    pub static SCENES: &[CommandDef] = &[
        cmd(0x01, "view", &[("group_id", U16), ("scene_id", U8)]),
        cmd(0x02, "remove", &[("group_id", U16), ("scene_id", U8)]),
        cmd(0x03, "remove_all", &[("group_id", U16)]),
        cmd(0x04, STORE, &[("group_id", U16), ("scene_id", U8)]),
        cmd(0x05, RECALL, &[("group_id", U16), ("scene_id", U8)]),
        cmd(0x06, "get_scene_membership", &[("group_id", U16)]),
    ];

    pub static COLOR: &[CommandDef] = &[
        cmd(
            0x00,
            "move_to_hue",
            &[("hue", U8), ("direction", U8), ("transition_time", U16)],
        ),
        cmd(0x01, "move_hue", &[("move_mode", U8), ("rate", U8)]),
        cmd(
            0x02,
            "step_hue",
            &[("step_mode", U8), ("step_size", U8), ("transition_time", U8)],
        ),
        cmd(
            0x03,
            "move_to_saturation",
            &[("saturation", U8), ("transition_time", U16)],
        ),
        cmd(0x04, "move_saturation", &[("move_mode", U8), ("rate", U8)]),
        cmd(
            0x05,
            "step_saturation",
            &[("step_mode", U8), ("step_size", U8), ("transition_time", U8)],
        ),
        cmd(
            0x06,
            MOVE_TO_HUE_SATURATION,
            &[("hue", U8), ("saturation", U8), ("transition_time", U16)],
        ),
        cmd(
            0x07,
            "move_to_color",
            &[("color_x", U16), ("color_y", U16), ("transition_time", U16)],
        ),
        cmd(0x08, "move_color", &[("rate_x", I16), ("rate_y", I16)]),
        cmd(
            0x09,
            "step_color",
            &[("step_x", I16), ("step_y", I16), ("duration", U16)],
        ),
        cmd(
            0x0A,
            MOVE_TO_COLOR_TEMP,
            &[("color_temp_mireds", U16), ("transition_time", U16)],
        ),
        cmd(
            0x40,
            "enhanced_move_to_hue",
            &[("enhanced_hue", U16), ("direction", U8), ("transition_time", U16)],
        ),
        cmd(0x41, ENHANCED_MOVE_HUE, &[("move_mode", U8), ("rate", U16)]),
        cmd(
            0x42,
            "enhanced_step_hue",
            &[("step_mode", U8), ("step_size", U16), ("transition_time", U16)],
        ),
        cmd(
            0x43,
            "enhanced_move_to_hue_and_saturation",
            &[("enhanced_hue", U16), ("saturation", U8), ("transition_time", U16)],
        ),
        cmd(
            0x44,
            "color_loop_set",
            &[
                ("update_flags", U8),
                ("action", U8),
                ("direction", U8),
                ("time", U16),
                ("start_hue", U16),
            ],
        ),
        cmd(0x47, "stop_move_step", &[]),
        cmd(
            0x4B,
            "move_color_temp",
            &[
                ("move_mode", U8),
                ("rate", U16),
                ("color_temp_min_mireds", U16),
                ("color_temp_max_mireds", U16),
            ],
        ),
        cmd(
            0x4C,
            STEP_COLOR_TEMP,
            &[
                ("step_mode", U8),
                ("step_size", U16),
                ("transition_time", U16),
                ("color_temp_min_mireds", U16),
                ("color_temp_max_mireds", U16),
            ],
        ),
    ];

    pub static AWOX_COLOR_OVERRIDES: &[CommandDef] =
        &[manufacturer_cmd(0x30, AWOX_COLOR, &[("param1", U8), ("color", U8)])];
    pub static AWOX_LEVEL_CONTROL_OVERRIDES: &[CommandDef] =
        &[manufacturer_cmd(0x10, AWOX_REFRESH, &[("param1", U8), ("press", U8)])];
}

/// Decoded cluster command.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ClusterCommand {
    pub name: &'static str,
    pub manufacturer_specific: bool,
    pub args: Params,
}

/// Find the schema of a command. Vendor commands take precedence when the
/// cluster was replaced by an AwoX quirk.
pub fn lookup(kind: ClusterKind, command_id: u8, awox_overrides: bool) -> Option<&'static CommandDef> {
    let vendor: &[CommandDef] = if awox_overrides {
        kind.awox_commands()
    } else {
        &[]
    };
    vendor
        .iter()
        .chain(kind.server_commands().iter())
        .find(|def| def.id == command_id)
}

/// Decode a ZCL command payload (frame header already stripped).
///
/// Fields are little endian, in schema order. Trailing bytes belong to
/// optional fields we don't care about and are ignored.
pub fn decode(
    kind: ClusterKind,
    command_id: u8,
    payload: &[u8],
    awox_overrides: bool,
) -> Option<ClusterCommand> {
    let def = if let Some(def) = lookup(kind, command_id, awox_overrides) {
        def
    } else {
        warn!(
            "Unknown command 0x{:02x} on cluster 0x{:04x}",
            command_id,
            kind.id()
        );
        return None;
    };

    let mut args = Params::new();
    let mut offset = 0;
    for (name, field) in def.fields {
        let end = offset + field.size();
        if end > payload.len() {
            warn!(
                "Command {} has invalid payload length {} {:02x?}",
                def.name,
                payload.len(),
                payload
            );
            return None;
        }
        args.insert(name.to_string(), field.read(&payload[offset..end]));
        offset = end;
    }

    Some(ClusterCommand {
        name: def.name,
        manufacturer_specific: def.manufacturer_specific,
        args,
    })
}
