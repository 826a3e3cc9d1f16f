//! Device quirks.
//!
//! A quirk recognises a remote by its reported signature, replaces some of
//! its clusters with custom handlers and declares the automation triggers
//! the remote exposes.

pub mod awox;
pub mod awox_3banks;
pub mod eglo_3groups;

use crate::trigger::TriggerCatalog;
use crate::zcl::ClusterKind;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Endpoint as declared in a quirk signature.
#[derive(Debug)]
pub struct EndpointSignature {
    pub id: u8,
    pub profile_id: u16,
    pub device_type: u16,
    pub input_clusters: &'static [u16],
    pub output_clusters: &'static [u16],
}

/// Cluster substituted by a quirk.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CustomCluster {
    pub kind: ClusterKind,
    /// Resolve the bank from the destination group of every command.
    pub bank_aware: bool,
    /// Decode the AwoX manufacturer specific commands.
    pub awox_commands: bool,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ClusterSlot {
    Standard(u16),
    Custom(CustomCluster),
}

impl ClusterSlot {
    pub fn cluster_id(&self) -> u16 {
        match self {
            ClusterSlot::Standard(id) => *id,
            ClusterSlot::Custom(custom) => custom.kind.id(),
        }
    }
}

/// Endpoint after the quirk is applied.
#[derive(Debug)]
pub struct ReplacementEndpoint {
    pub id: u8,
    pub profile_id: u16,
    pub device_type: u16,
    pub input_clusters: &'static [ClusterSlot],
    pub output_clusters: &'static [ClusterSlot],
}

pub struct Quirk {
    pub name: &'static str,
    /// (manufacturer, model) pairs the quirk applies to.
    pub models_info: &'static [(&'static str, &'static str)],
    pub signature: &'static [EndpointSignature],
    pub replacement: &'static [ReplacementEndpoint],
    pub triggers: fn() -> anyhow::Result<TriggerCatalog>,
}

/// Simple descriptor of an endpoint, as announced by the Zigbee bridge.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SimpleDescriptor {
    pub endpoint: u8,
    pub profile_id: u16,
    pub device_type: u16,
    #[serde(default)]
    pub input_clusters: Vec<u16>,
    #[serde(default)]
    pub output_clusters: Vec<u16>,
}

/// What a device reports about itself when it joins.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DeviceSignature {
    pub manufacturer: String,
    pub model: String,
    #[serde(default)]
    pub endpoints: Vec<SimpleDescriptor>,
}

fn same_clusters(a: &[u16], b: &[u16]) -> bool {
    a.iter().collect::<BTreeSet<_>>() == b.iter().collect::<BTreeSet<_>>()
}

impl Quirk {
    pub fn matches_model(&self, manufacturer: &str, model: &str) -> bool {
        self.models_info
            .iter()
            .any(|(m, d)| *m == manufacturer && *d == model)
    }

    /// Full signature check: model info and every endpoint (the ZDO endpoint
    /// 0 aside) with profile, device type and clusters.
    pub fn matches(&self, device: &DeviceSignature) -> bool {
        if !self.matches_model(&device.manufacturer, &device.model) {
            return false;
        }

        let endpoints: Vec<&SimpleDescriptor> =
            device.endpoints.iter().filter(|ep| ep.endpoint != 0).collect();
        if endpoints.len() != self.signature.len() {
            return false;
        }

        self.signature.iter().all(|expected| {
            endpoints.iter().any(|ep| {
                ep.endpoint == expected.id
                    && ep.profile_id == expected.profile_id
                    && ep.device_type == expected.device_type
                    && same_clusters(&ep.input_clusters, expected.input_clusters)
                    && same_clusters(&ep.output_clusters, expected.output_clusters)
            })
        })
    }

    /// Output (client) cluster of the replaced device the remote sends
    /// commands from.
    pub fn output_cluster(&self, endpoint: u8, cluster_id: u16) -> Option<ClusterSlot> {
        self.replacement
            .iter()
            .find(|ep| ep.id == endpoint)?
            .output_clusters
            .iter()
            .find(|slot| slot.cluster_id() == cluster_id)
            .copied()
    }
}

impl std::fmt::Debug for Quirk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Quirk").field("name", &self.name).finish()
    }
}

/// Which AwoX quirk to apply. Both match the same remote signature.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwoxVariant {
    /// 23 triggers, banks are ignored.
    SingleBank,
    /// 66 triggers, suffixed with the active bank.
    #[default]
    ThreeBanks,
}

/// Quirk together with its trigger catalog, built once.
#[derive(Debug)]
pub struct LoadedQuirk {
    pub quirk: &'static Quirk,
    pub catalog: TriggerCatalog,
}

#[derive(Debug)]
pub struct QuirkRegistry {
    quirks: Vec<LoadedQuirk>,
}

impl QuirkRegistry {
    pub fn new(variant: AwoxVariant) -> anyhow::Result<Self> {
        let awox = match variant {
            AwoxVariant::SingleBank => &awox::QUIRK,
            AwoxVariant::ThreeBanks => &awox_3banks::QUIRK,
        };

        let mut quirks = Vec::new();
        for quirk in [&eglo_3groups::QUIRK, awox] {
            let catalog = (quirk.triggers)()?;
            info!(
                "Registered quirk {} with {} triggers",
                quirk.name,
                catalog.len()
            );
            quirks.push(LoadedQuirk { quirk, catalog });
        }

        Ok(Self { quirks })
    }

    pub fn find(&self, device: &DeviceSignature) -> Option<&LoadedQuirk> {
        let found = self.quirks.iter().find(|q| q.quirk.matches(device));
        if found.is_none() {
            debug!(
                "No quirk for {} {} with {} endpoints",
                device.manufacturer,
                device.model,
                device.endpoints.len()
            );
        }
        found
    }

    /// Model-only lookup, for remotes declared in the config file.
    pub fn find_by_model(&self, manufacturer: &str, model: &str) -> Option<&LoadedQuirk> {
        self.quirks
            .iter()
            .find(|q| q.quirk.matches_model(manufacturer, model))
    }

    pub fn by_name(&self, name: &str) -> Option<&LoadedQuirk> {
        self.quirks.iter().find(|q| q.quirk.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadedQuirk> {
        self.quirks.iter()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::consts::{device_type, AWOX_PROFILE_ID, ZHA_PROFILE_ID};

    pub fn awox_signature() -> DeviceSignature {
        DeviceSignature {
            manufacturer: "AwoX".to_string(),
            model: "ERCU_3groups_Zm".to_string(),
            endpoints: vec![
                SimpleDescriptor {
                    endpoint: 1,
                    profile_id: ZHA_PROFILE_ID,
                    device_type: device_type::COLOR_CONTROLLER,
                    input_clusters: vec![0, 3, 4, 4096],
                    output_clusters: vec![0, 3, 4, 5, 6, 8, 768, 4096],
                },
                SimpleDescriptor {
                    endpoint: 3,
                    profile_id: AWOX_PROFILE_ID,
                    device_type: device_type::COLOR_CONTROLLER,
                    input_clusters: vec![65360, 65361],
                    output_clusters: vec![65361, 65360],
                },
            ],
        }
    }

    pub fn ts004f_signature() -> DeviceSignature {
        DeviceSignature {
            manufacturer: "_TZ3000_4fjiwweb".to_string(),
            model: "TS004F".to_string(),
            endpoints: vec![SimpleDescriptor {
                endpoint: 1,
                profile_id: ZHA_PROFILE_ID,
                device_type: device_type::ON_OFF_LIGHT_SWITCH,
                input_clusters: vec![0, 1, 3, 4, 6, 4096],
                output_clusters: vec![25, 3, 4, 5, 6, 8, 4096],
            }],
        }
    }

    #[test]
    fn test_registry_picks_variant() {
        let registry = QuirkRegistry::new(AwoxVariant::ThreeBanks).unwrap();
        let found = registry.find(&awox_signature()).unwrap();
        assert_eq!(found.quirk.name, awox_3banks::QUIRK.name);
        assert_eq!(found.catalog.len(), 66);

        let registry = QuirkRegistry::new(AwoxVariant::SingleBank).unwrap();
        let found = registry.find(&awox_signature()).unwrap();
        assert_eq!(found.quirk.name, awox::QUIRK.name);
        assert_eq!(found.catalog.len(), 23);

        let found = registry.find(&ts004f_signature()).unwrap();
        assert_eq!(found.quirk.name, eglo_3groups::QUIRK.name);
    }

    #[test]
    fn test_signature_mismatch() {
        let registry = QuirkRegistry::new(AwoxVariant::default()).unwrap();

        let mut sig = awox_signature();
        sig.model = "ERCU_Zm".to_string();
        assert!(registry.find(&sig).is_none());

        let mut sig = awox_signature();
        sig.endpoints[0].output_clusters.retain(|c| *c != 768);
        assert!(registry.find(&sig).is_none());

        let mut sig = awox_signature();
        sig.endpoints.pop();
        assert!(registry.find(&sig).is_none());

        // ZDO endpoint is not part of the signature.
        let mut sig = awox_signature();
        sig.endpoints.push(SimpleDescriptor {
            endpoint: 0,
            profile_id: 0,
            device_type: 0,
            input_clusters: vec![],
            output_clusters: vec![],
        });
        assert!(registry.find(&sig).is_some());
    }

    #[test]
    fn test_find_by_model() {
        let registry = QuirkRegistry::new(AwoxVariant::ThreeBanks).unwrap();
        assert!(registry.find_by_model("AwoX", "ERCU_3groups_Zm").is_some());
        assert!(registry.find_by_model("_TZ3000_4fjiwweb", "TS004F").is_some());
        assert!(registry.find_by_model("IKEA", "TRADFRI").is_none());
    }
}
