//! Eglo ERCU_3groups_Zm sold with a Tuya TS004F radio.
//!
//! Six buttons in three columns, one column per group. All top buttons send
//! ON and all bottom buttons send OFF, so a single press fires the trigger of
//! every button in the same row.

use super::{ClusterSlot, CustomCluster, EndpointSignature, Quirk, ReplacementEndpoint};
use crate::consts::{device_type, ZHA_PROFILE_ID};
use crate::trigger::{PressType, TriggerCatalog, TriggerDef};
use crate::zcl::commands::{MOVE, OFF, ON, STOP};
use crate::zcl::{cluster_id as id, ClusterKind};

const MODELS_INFO: &[(&str, &str)] = &[("_TZ3000_4fjiwweb", "TS004F")];

const INPUT_CLUSTERS: &[u16] = &[
    id::BASIC,
    id::POWER_CONFIGURATION,
    id::IDENTIFY,
    id::GROUPS,
    id::ON_OFF,
    id::LIGHT_LINK,
];

const OUTPUT_CLUSTERS: &[u16] = &[
    id::IDENTIFY,
    id::GROUPS,
    id::SCENES,
    id::ON_OFF,
    id::LEVEL_CONTROL,
    id::OTA,
    id::LIGHT_LINK,
];

// <SimpleDescriptor endpoint=1 profile=260 device_type=2080
// input_clusters=[0, 1, 3, 4, 6, 4096]
// output_clusters=[3, 4, 5, 6, 8, 25, 4096]>
// Matched as a plain on/off light switch.
const SIGNATURE: &[EndpointSignature] = &[EndpointSignature {
    id: 1,
    profile_id: ZHA_PROFILE_ID,
    device_type: device_type::ON_OFF_LIGHT_SWITCH,
    input_clusters: INPUT_CLUSTERS,
    output_clusters: OUTPUT_CLUSTERS,
}];

const REPLACEMENT: &[ReplacementEndpoint] = &[ReplacementEndpoint {
    id: 1,
    profile_id: ZHA_PROFILE_ID,
    device_type: device_type::ON_OFF_LIGHT_SWITCH,
    input_clusters: &[
        ClusterSlot::Standard(id::BASIC),
        ClusterSlot::Standard(id::POWER_CONFIGURATION),
        ClusterSlot::Standard(id::IDENTIFY),
        ClusterSlot::Standard(id::GROUPS),
        ClusterSlot::Standard(id::ON_OFF),
        ClusterSlot::Standard(id::LIGHT_LINK),
    ],
    output_clusters: &[
        ClusterSlot::Standard(id::IDENTIFY),
        ClusterSlot::Standard(id::GROUPS),
        ClusterSlot::Standard(id::SCENES),
        ClusterSlot::Standard(id::ON_OFF),
        ClusterSlot::Standard(id::LEVEL_CONTROL),
        ClusterSlot::Standard(id::OTA),
        ClusterSlot::Standard(id::LIGHT_LINK),
        ClusterSlot::Custom(CustomCluster {
            kind: ClusterKind::Other(id::EGLO_REMOTE),
            bank_aware: false,
            awox_commands: false,
        }),
    ],
}];

pub static QUIRK: Quirk = Quirk {
    name: "EgloERCU3Groups",
    models_info: MODELS_INFO,
    signature: SIGNATURE,
    replacement: REPLACEMENT,
    triggers,
};

const BUTTONS: [(&str, &str); 3] = [
    // (top, bottom) per column.
    ("button_1", "button_2"),
    ("button_3", "button_4"),
    ("button_5", "button_6"),
];

fn triggers() -> anyhow::Result<TriggerCatalog> {
    let level = id::LEVEL_CONTROL;
    let mut entries = Vec::new();
    for (top, bottom) in BUTTONS {
        for (button, command, move_mode) in [(top, ON, 0), (bottom, OFF, 1)] {
            entries.push((
                PressType::ShortPress,
                button,
                TriggerDef::new(command, id::ON_OFF, &[]),
            ));
            entries.push((
                PressType::LongPress,
                button,
                TriggerDef::new(MOVE, level, &[("move_mode", move_mode)]),
            ));
            entries.push((
                PressType::LongRelease,
                button,
                TriggerDef::new(STOP, level, &[]),
            ));
        }
    }
    TriggerCatalog::try_from_entries(entries)
}
