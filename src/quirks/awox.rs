//! AwoX 99099 remote (Eglo Remote 2.0), single bank.
//!
//! 23 triggers covering every button with its hardware long press. Banks
//! are not told apart, area and light selection is left to automations.

use super::{ClusterSlot, CustomCluster, EndpointSignature, Quirk, ReplacementEndpoint};
use crate::consts::{device_type, AWOX_PROFILE_ID, EGLO_MANUFACTURER, EGLO_MODEL, ZHA_PROFILE_ID};
use crate::trigger::{PressType, TriggerCatalog, TriggerDef};
use crate::zcl::commands::*;
use crate::zcl::{cluster_id as id, ClusterKind};

pub(super) const MODELS_INFO: &[(&str, &str)] = &[(EGLO_MANUFACTURER, EGLO_MODEL)];

// <SimpleDescriptor endpoint=1 profile=260 device_type=2048
// input_clusters=[0, 3, 4, 4096]
// output_clusters=[0, 3, 4, 5, 6, 8, 768, 4096]>
// <SimpleDescriptor endpoint=3 profile=4751 device_type=2048
// input_clusters=[65360, 65361]
// output_clusters=[65360, 65361]>
pub(super) const SIGNATURE: &[EndpointSignature] = &[
    EndpointSignature {
        id: 1,
        profile_id: ZHA_PROFILE_ID,
        device_type: device_type::COLOR_CONTROLLER,
        input_clusters: &[id::BASIC, id::IDENTIFY, id::GROUPS, id::LIGHT_LINK],
        output_clusters: &[
            id::BASIC,
            id::IDENTIFY,
            id::GROUPS,
            id::SCENES,
            id::ON_OFF,
            id::LEVEL_CONTROL,
            id::COLOR,
            id::LIGHT_LINK,
        ],
    },
    EndpointSignature {
        id: 3,
        profile_id: AWOX_PROFILE_ID,
        device_type: device_type::COLOR_CONTROLLER,
        input_clusters: &[id::AWOX_FF50, id::AWOX_FF51],
        output_clusters: &[id::AWOX_FF50, id::AWOX_FF51],
    },
];

pub(super) const STANDARD_INPUTS: &[ClusterSlot] = &[
    ClusterSlot::Standard(id::BASIC),
    ClusterSlot::Standard(id::IDENTIFY),
    ClusterSlot::Standard(id::GROUPS),
    ClusterSlot::Standard(id::LIGHT_LINK),
];

pub(super) const VENDOR_ENDPOINT: ReplacementEndpoint = ReplacementEndpoint {
    id: 3,
    profile_id: AWOX_PROFILE_ID,
    device_type: device_type::COLOR_CONTROLLER,
    input_clusters: &[
        ClusterSlot::Standard(id::AWOX_FF50),
        ClusterSlot::Standard(id::AWOX_FF51),
    ],
    output_clusters: &[
        ClusterSlot::Standard(id::AWOX_FF50),
        ClusterSlot::Standard(id::AWOX_FF51),
    ],
};

// The remote sends ON on its own. With OnOff in place the host would raise
// events for those, so the cluster is left out.
const REPLACEMENT: &[ReplacementEndpoint] = &[
    ReplacementEndpoint {
        id: 1,
        profile_id: ZHA_PROFILE_ID,
        device_type: device_type::COLOR_CONTROLLER,
        input_clusters: STANDARD_INPUTS,
        output_clusters: &[
            ClusterSlot::Standard(id::BASIC),
            ClusterSlot::Standard(id::IDENTIFY),
            ClusterSlot::Standard(id::GROUPS),
            ClusterSlot::Standard(id::SCENES),
            ClusterSlot::Custom(CustomCluster {
                kind: ClusterKind::LevelControl,
                bank_aware: false,
                awox_commands: true,
            }),
            ClusterSlot::Custom(CustomCluster {
                kind: ClusterKind::Color,
                bank_aware: false,
                awox_commands: true,
            }),
            ClusterSlot::Standard(id::LIGHT_LINK),
        ],
    },
    VENDOR_ENDPOINT,
];

pub static QUIRK: Quirk = Quirk {
    name: "Awox99099Remote",
    models_info: MODELS_INFO,
    signature: SIGNATURE,
    replacement: REPLACEMENT,
    triggers,
};

fn triggers() -> anyhow::Result<TriggerCatalog> {
    use PressType::{LongPress, ShortPress};
    let color = id::COLOR;
    let level = id::LEVEL_CONTROL;
    let scenes = id::SCENES;

    TriggerCatalog::try_from_entries([
        // Left power button never produces ON.
        (ShortPress, "turn_off", TriggerDef::new(OFF, id::ON_OFF, &[])),
        // Colour top=green, left=red, right=blue, middle=cycle.
        (ShortPress, "color_green", TriggerDef::new(AWOX_COLOR, color, &[("color", 85)])),
        (
            LongPress,
            "color_green_long",
            TriggerDef::new(MOVE_TO_HUE_SATURATION, color, &[("hue", 85)]),
        ),
        (ShortPress, "color_red", TriggerDef::new(AWOX_COLOR, color, &[("color", 255)])),
        (
            LongPress,
            "color_red_long",
            TriggerDef::new(MOVE_TO_HUE_SATURATION, color, &[("hue", 255)]),
        ),
        (
            ShortPress,
            "color_cycle",
            TriggerDef::new(ENHANCED_MOVE_HUE, color, &[("move_mode", 1)]),
        ),
        (
            LongPress,
            "color_cycle_long",
            TriggerDef::new(ENHANCED_MOVE_HUE, color, &[("move_mode", 3)]),
        ),
        (ShortPress, "color_blue", TriggerDef::new(AWOX_COLOR, color, &[("color", 170)])),
        (
            LongPress,
            "color_blue_long",
            TriggerDef::new(MOVE_TO_HUE_SATURATION, color, &[("hue", 170)]),
        ),
        // Candle mode.
        (ShortPress, "refresh", TriggerDef::new(AWOX_REFRESH, level, &[("press", 1)])),
        (LongPress, "refresh_long", TriggerDef::new(AWOX_REFRESH, level, &[("press", 2)])),
        (ShortPress, "dim_up", TriggerDef::new(STEP_ON_OFF, level, &[("step_mode", 0)])),
        (
            LongPress,
            "dim_up_long",
            TriggerDef::new(MOVE_TO_LEVEL_ON_OFF, level, &[("level", 254)]),
        ),
        (ShortPress, "dim_down", TriggerDef::new(STEP_ON_OFF, level, &[("step_mode", 1)])),
        (
            LongPress,
            "dim_down_long",
            TriggerDef::new(MOVE_TO_LEVEL_ON_OFF, level, &[("level", 1)]),
        ),
        // Favourite buttons.
        (ShortPress, "scene_1", TriggerDef::new(RECALL, scenes, &[("scene_id", 1)])),
        (LongPress, "scene_1_long", TriggerDef::new(STORE, scenes, &[("scene_id", 1)])),
        (ShortPress, "scene_2", TriggerDef::new(RECALL, scenes, &[("scene_id", 2)])),
        (LongPress, "scene_2_long", TriggerDef::new(STORE, scenes, &[("scene_id", 2)])),
        // White tone.
        (
            ShortPress,
            "color_temp_up",
            TriggerDef::new(STEP_COLOR_TEMP, color, &[("step_mode", 1)]),
        ),
        (
            LongPress,
            "color_temp_up_long",
            TriggerDef::new(MOVE_TO_COLOR_TEMP, color, &[("color_temp_mireds", 454)]),
        ),
        (
            ShortPress,
            "color_temp_down",
            TriggerDef::new(STEP_COLOR_TEMP, color, &[("step_mode", 3)]),
        ),
        (
            LongPress,
            "color_temp_down_long",
            TriggerDef::new(MOVE_TO_COLOR_TEMP, color, &[("color_temp_mireds", 153)]),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog() {
        let catalog = triggers().unwrap();
        assert_eq!(catalog.len(), 23);
        assert!(catalog.iter().all(|(_, def)| def.endpoint_id == 1 && def.bank.is_none()));

        let def = catalog.get(PressType::LongPress, "scene_2_long").unwrap();
        assert_eq!(def.command, "store");
        assert_eq!(def.cluster_id, 5);
        assert_eq!(def.params.get("scene_id"), Some(&2));

        let def = catalog.get(PressType::ShortPress, "color_red").unwrap();
        assert_eq!(def.command, "awox_color");
        assert_eq!(def.cluster_id, 768);
    }

    #[test]
    fn test_on_off_not_replaced() {
        assert!(QUIRK.output_cluster(1, id::ON_OFF).is_none());
        assert_eq!(
            QUIRK.output_cluster(1, id::COLOR),
            Some(ClusterSlot::Custom(CustomCluster {
                kind: ClusterKind::Color,
                bank_aware: false,
                awox_commands: true,
            }))
        );
        assert_eq!(
            QUIRK.output_cluster(1, id::SCENES),
            Some(ClusterSlot::Standard(id::SCENES))
        );
    }
}
