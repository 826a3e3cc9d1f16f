//! AwoX 99099 remote with bank support.
//!
//! Buttons 1, 2 and 3 on the top row select a bank. Every control button
//! press is then sent to the group of that bank (0x800A, 0x800B, 0x800C).
//! The 22 base actions are exposed once per bank, suffixed `_1`, `_2`, `_3`.

use super::awox::{MODELS_INFO, SIGNATURE, STANDARD_INPUTS, VENDOR_ENDPOINT};
use super::{ClusterSlot, CustomCluster, Quirk, ReplacementEndpoint};
use crate::consts::{device_type, ZHA_PROFILE_ID};
use crate::trigger::{build_trigger_table, PressType, TriggerCatalog, TriggerDef};
use crate::zcl::commands::*;
use crate::zcl::{cluster_id as id, ClusterKind};

const fn banked(kind: ClusterKind, awox_commands: bool) -> ClusterSlot {
    ClusterSlot::Custom(CustomCluster {
        kind,
        bank_aware: true,
        awox_commands,
    })
}

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
            banked(ClusterKind::Scenes, false),
            banked(ClusterKind::OnOff, false),
            banked(ClusterKind::LevelControl, true),
            banked(ClusterKind::Color, true),
            ClusterSlot::Standard(id::LIGHT_LINK),
        ],
    },
    VENDOR_ENDPOINT,
];

pub static QUIRK: Quirk = Quirk {
    name: "Awox99099Remote3Banks",
    models_info: MODELS_INFO,
    signature: SIGNATURE,
    replacement: REPLACEMENT,
    triggers,
};

/// Actions before the bank suffix is added.
pub fn base_triggers() -> anyhow::Result<TriggerCatalog> {
    use PressType::{LongPress, ShortPress};
    let color = id::COLOR;
    let level = id::LEVEL_CONTROL;
    let scenes = id::SCENES;

    TriggerCatalog::try_from_entries([
        (ShortPress, "turn_on", TriggerDef::new(ON, id::ON_OFF, &[])),
        (ShortPress, "turn_off", TriggerDef::new(OFF, id::ON_OFF, &[])),
        (ShortPress, "red", TriggerDef::new(AWOX_COLOR, color, &[("color", 255)])),
        (
            LongPress,
            "red",
            TriggerDef::new(MOVE_TO_HUE_SATURATION, color, &[("hue", 255)]),
        ),
        (ShortPress, "green", TriggerDef::new(AWOX_COLOR, color, &[("color", 85)])),
        (
            LongPress,
            "green",
            TriggerDef::new(MOVE_TO_HUE_SATURATION, color, &[("hue", 85)]),
        ),
        (ShortPress, "blue", TriggerDef::new(AWOX_COLOR, color, &[("color", 170)])),
        (
            LongPress,
            "blue",
            TriggerDef::new(MOVE_TO_HUE_SATURATION, color, &[("hue", 170)]),
        ),
        (ShortPress, "cycle", TriggerDef::new(ENHANCED_MOVE_HUE, color, &[("move_mode", 1)])),
        (LongPress, "cycle", TriggerDef::new(ENHANCED_MOVE_HUE, color, &[("move_mode", 3)])),
        (ShortPress, "heart_1", TriggerDef::new(RECALL, scenes, &[("scene_id", 1)])),
        (ShortPress, "heart_2", TriggerDef::new(RECALL, scenes, &[("scene_id", 2)])),
        (ShortPress, "dim_up", TriggerDef::new(STEP_ON_OFF, level, &[("step_mode", 0)])),
        (
            LongPress,
            "dim_up",
            TriggerDef::new(MOVE_TO_LEVEL_ON_OFF, level, &[("level", 254)]),
        ),
        (ShortPress, "dim_down", TriggerDef::new(STEP_ON_OFF, level, &[("step_mode", 1)])),
        (
            LongPress,
            "dim_down",
            TriggerDef::new(MOVE_TO_LEVEL_ON_OFF, level, &[("level", 1)]),
        ),
        (ShortPress, "warm", TriggerDef::new(STEP_COLOR_TEMP, color, &[("step_mode", 1)])),
        (
            LongPress,
            "warm",
            TriggerDef::new(MOVE_TO_COLOR_TEMP, color, &[("color_temp_mireds", 454)]),
        ),
        (ShortPress, "cold", TriggerDef::new(STEP_COLOR_TEMP, color, &[("step_mode", 3)])),
        (
            LongPress,
            "cold",
            TriggerDef::new(MOVE_TO_COLOR_TEMP, color, &[("color_temp_mireds", 153)]),
        ),
        (ShortPress, "refresh", TriggerDef::new(AWOX_REFRESH, level, &[("press", 1)])),
        (LongPress, "refresh", TriggerDef::new(AWOX_REFRESH, level, &[("press", 2)])),
    ])
}

fn triggers() -> anyhow::Result<TriggerCatalog> {
    Ok(build_trigger_table(&base_triggers()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::Bank;

    #[test]
    fn test_base_catalog_size() {
        assert_eq!(base_triggers().unwrap().len(), 22);
        assert_eq!(triggers().unwrap().len(), 66);
    }

    #[test]
    fn test_every_action_exists_per_bank() {
        let base = base_triggers().unwrap();
        let catalog = triggers().unwrap();
        for (key, source) in base.iter() {
            for bank in Bank::ALL {
                let def = catalog.get(key.press_type, &bank.suffix(&key.action)).unwrap();
                assert_eq!(def.command, source.command);
                assert_eq!(def.cluster_id, source.cluster_id);
                assert_eq!(def.params, source.params);
                assert_eq!(def.endpoint_id, 1);
                assert_eq!(def.bank, Some(bank));
            }
        }
    }

    #[test]
    fn test_red_entry() {
        let catalog = triggers().unwrap();
        for (action, bank) in [("red_1", 1), ("red_2", 2), ("red_3", 3)] {
            let def = catalog.get(PressType::ShortPress, action).unwrap();
            assert_eq!(def.command, "awox_color");
            assert_eq!(def.cluster_id, 768);
            assert_eq!(def.params.len(), 1);
            assert_eq!(def.params.get("color"), Some(&255));
            assert_eq!(def.bank.map(Bank::number), Some(bank));
        }
    }

    #[test]
    fn test_replaced_clusters_are_bank_aware() {
        for cluster in [id::SCENES, id::ON_OFF, id::LEVEL_CONTROL, id::COLOR] {
            match QUIRK.output_cluster(1, cluster) {
                Some(ClusterSlot::Custom(custom)) => assert!(custom.bank_aware),
                other => panic!("Cluster {} not replaced: {:?}", cluster, other),
            }
        }
        assert_eq!(
            QUIRK.output_cluster(1, id::GROUPS),
            Some(ClusterSlot::Standard(id::GROUPS))
        );
        assert!(QUIRK.output_cluster(2, id::COLOR).is_none());
    }
}
