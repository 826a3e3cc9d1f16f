use crate::bank::{resolve_bank, Bank};
use crate::quirks::{ClusterSlot, LoadedQuirk};
use crate::trigger::{Params, TriggerEvent, TriggerKey};
use crate::zcl::{self, ClusterKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cluster command sent by a remote, as delivered by the Zigbee bridge.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CommandEvent {
    pub ieee: String,
    pub endpoint: u8,
    pub cluster: u16,
    pub command_id: u8,
    /// ZCL payload with the frame header stripped.
    #[serde(default)]
    pub payload: Vec<u8>,
    /// Destination group, when the command was multicast.
    #[serde(default)]
    pub group: Option<u16>,
}

/// Outcome of a handled command. Published even when no trigger matched.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RemoteAction {
    pub device_ieee: String,
    pub endpoint_id: u8,
    pub cluster_id: u16,
    pub command: &'static str,
    pub manufacturer_specific: bool,
    pub args: Params,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<Bank>,
    pub triggers: Vec<TriggerKey>,
}

/// Handle a command on any cluster the quirk exposes.
///
/// Replaced clusters decode the vendor commands when asked to and, if bank
/// aware, tag the command with the bank of its destination group.
/// Commands from clusters missing in the replacement are dropped.
pub fn handle_cluster_request(quirk: &LoadedQuirk, event: &CommandEvent) -> Option<RemoteAction> {
    let slot = if let Some(slot) = quirk.quirk.output_cluster(event.endpoint, event.cluster) {
        slot
    } else {
        debug!(
            "{}: cluster 0x{:04x} on endpoint {} not handled, ignoring command 0x{:02x}",
            event.ieee, event.cluster, event.endpoint, event.command_id
        );
        return None;
    };

    let (kind, awox_commands, bank) = match slot {
        ClusterSlot::Standard(id) => (ClusterKind::from_id(id), false, None),
        ClusterSlot::Custom(custom) => {
            let bank = custom.bank_aware.then(|| resolve_bank(event.group));
            (custom.kind, custom.awox_commands, bank)
        }
    };

    let command = zcl::decode(kind, event.command_id, &event.payload, awox_commands)?;

    let trigger_event = TriggerEvent {
        command: command.name,
        cluster_id: event.cluster,
        endpoint_id: event.endpoint,
        args: &command.args,
        bank,
    };
    let triggers: Vec<TriggerKey> = quirk
        .catalog
        .matching(&trigger_event)
        .into_iter()
        .map(|(key, _)| key.clone())
        .collect();

    debug!(
        "{}: {} {:?} bank={:?} -> {} triggers",
        event.ieee,
        command.name,
        command.args,
        bank,
        triggers.len()
    );

    Some(RemoteAction {
        device_ieee: event.ieee.clone(),
        endpoint_id: event.endpoint,
        cluster_id: event.cluster,
        command: command.name,
        manufacturer_specific: command.manufacturer_specific,
        args: command.args,
        bank,
        triggers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quirks::tests::{awox_signature, ts004f_signature};
    use crate::quirks::{AwoxVariant, QuirkRegistry};
    use crate::trigger::PressType;

    fn event(cluster: u16, command_id: u8, payload: &[u8], group: Option<u16>) -> CommandEvent {
        CommandEvent {
            ieee: "a4:c1:38:00:00:00:00:01".to_string(),
            endpoint: 1,
            cluster,
            command_id,
            payload: payload.to_vec(),
            group,
        }
    }

    #[test]
    fn test_bank_from_group() {
        let registry = QuirkRegistry::new(AwoxVariant::ThreeBanks).unwrap();
        let quirk = registry.find(&awox_signature()).unwrap();

        let action =
            handle_cluster_request(quirk, &event(768, 0x30, &[0x00, 0xFF], Some(0x800B))).unwrap();
        assert_eq!(action.command, "awox_color");
        assert!(action.manufacturer_specific);
        assert_eq!(action.bank, Some(Bank::Two));
        assert_eq!(
            action.triggers,
            vec![TriggerKey::new(PressType::ShortPress, "red_2")]
        );

        // Unknown group falls back to the first bank.
        let action =
            handle_cluster_request(quirk, &event(768, 0x30, &[0x00, 0xFF], Some(0x9999))).unwrap();
        assert_eq!(action.bank, Some(Bank::One));
        assert_eq!(action.triggers[0].action, "red_1");

        let action = handle_cluster_request(quirk, &event(6, 0x01, &[], None)).unwrap();
        assert_eq!(action.bank, Some(Bank::One));
        assert!(!action.manufacturer_specific);
        assert_eq!(action.triggers[0].action, "turn_on_1");
    }

    #[test]
    fn test_scene_recall_per_bank() {
        let registry = QuirkRegistry::new(AwoxVariant::ThreeBanks).unwrap();
        let quirk = registry.find(&awox_signature()).unwrap();

        // recall group 0x800C scene 2
        let action =
            handle_cluster_request(quirk, &event(5, 0x05, &[0x0C, 0x80, 0x02], Some(0x800C)))
                .unwrap();
        assert_eq!(action.command, "recall");
        assert_eq!(action.args.get("group_id"), Some(&0x800C));
        assert_eq!(action.triggers[0].action, "heart_2_3");
    }

    #[test]
    fn test_single_bank_drops_on_off() {
        let registry = QuirkRegistry::new(AwoxVariant::SingleBank).unwrap();
        let quirk = registry.find(&awox_signature()).unwrap();

        assert!(handle_cluster_request(quirk, &event(6, 0x01, &[], Some(0x800A))).is_none());

        let action =
            handle_cluster_request(quirk, &event(8, 0x10, &[0x00, 0x02], Some(0x800B))).unwrap();
        assert_eq!(action.command, "awox_refresh");
        assert_eq!(action.bank, None);
        assert_eq!(
            action.triggers,
            vec![TriggerKey::new(PressType::LongPress, "refresh_long")]
        );
    }

    #[test]
    fn test_unmatched_command_still_reported() {
        let registry = QuirkRegistry::new(AwoxVariant::ThreeBanks).unwrap();
        let quirk = registry.find(&awox_signature()).unwrap();

        // move_to_level is not bound to any button.
        let action = handle_cluster_request(quirk, &event(8, 0x00, &[0x80, 0x00, 0x00], None)).unwrap();
        assert_eq!(action.command, "move_to_level");
        assert!(action.triggers.is_empty());

        // Truncated payload is dropped.
        assert!(handle_cluster_request(quirk, &event(768, 0x30, &[0x00], None)).is_none());
    }

    #[test]
    fn test_standard_clusters_fire_every_matching_button() {
        let registry = QuirkRegistry::new(AwoxVariant::ThreeBanks).unwrap();
        let quirk = registry.find(&ts004f_signature()).unwrap();

        let action = handle_cluster_request(quirk, &event(6, 0x00, &[], Some(0x800A))).unwrap();
        assert_eq!(action.bank, None);
        let buttons: Vec<&str> = action.triggers.iter().map(|k| k.action.as_str()).collect();
        assert_eq!(buttons, vec!["button_2", "button_4", "button_6"]);
    }
}
