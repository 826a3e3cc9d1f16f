//! Routes bridge events and helper changes between the quirks and HA.

use crate::consts;
use crate::handler::{handle_cluster_request, CommandEvent};
use crate::helpers::{self, Helper, HelperKind, HelperManager, RemoteDevice};
use crate::homeassistant::{discovery, DeviceAnnounce, Incoming, Outgoing};
use crate::quirks::QuirkRegistry;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

#[derive(Debug)]
struct Remote {
    device: RemoteDevice,
    quirk: &'static str,
}

#[derive(Debug)]
pub struct Gate {
    registry: QuirkRegistry,
    helpers: HelperManager,
    /// Registered remotes by IEEE.
    remotes: BTreeMap<String, Remote>,
}

fn state_message(helper: &Helper) -> Outgoing {
    Outgoing::State {
        topic: discovery::state_topic(helper),
        payload: helper.state.state(),
    }
}

impl Gate {
    pub fn new(registry: QuirkRegistry, helpers: HelperManager) -> Self {
        Self {
            registry,
            helpers,
            remotes: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    pub fn is_registered(&self, ieee: &str) -> bool {
        self.remotes.contains_key(ieee)
    }

    /// Remote declared in the config file. Matched by model only, as its
    /// endpoints are not known before it talks.
    pub fn register_configured(&mut self, device: RemoteDevice, now: DateTime<Utc>) -> Vec<Outgoing> {
        let quirk = if let Some(loaded) = self
            .registry
            .find_by_model(&device.manufacturer, &device.model)
        {
            loaded.quirk.name
        } else {
            warn!(
                "No quirk for remote {} ({} {}), skipping",
                device.name, device.manufacturer, device.model
            );
            return Vec::new();
        };
        self.register(device, quirk, now)
    }

    /// Remote announced by the bridge, matched by full signature. Name and
    /// area from the config file win when the bridge omits them.
    pub fn announce(&mut self, announce: DeviceAnnounce, now: DateTime<Utc>) -> Vec<Outgoing> {
        let quirk = if let Some(loaded) = self.registry.find(&announce.signature) {
            loaded.quirk.name
        } else {
            debug!("{}: not a supported remote", announce.ieee);
            return Vec::new();
        };

        let known = self.remotes.get(&announce.ieee).map(|r| &r.device);
        let name = announce
            .name
            .or_else(|| known.map(|d| d.name.clone()))
            .unwrap_or_else(|| announce.ieee.clone());
        let area = announce.area.or_else(|| known.and_then(|d| d.area.clone()));

        let device = RemoteDevice {
            ieee: Some(announce.ieee),
            name,
            manufacturer: announce.signature.manufacturer,
            model: announce.signature.model,
            area,
        };
        self.register(device, quirk, now)
    }

    fn register(&mut self, device: RemoteDevice, quirk: &'static str, now: DateTime<Utc>) -> Vec<Outgoing> {
        let ieee = if let Some(ieee) = device.ieee.clone().filter(|i| !i.is_empty()) {
            ieee
        } else {
            error!("Could not get IEEE for device {}", device.name);
            return Vec::new();
        };
        let loaded = if let Some(loaded) = self.registry.by_name(quirk) {
            loaded
        } else {
            error!("Quirk {} is not registered", quirk);
            return Vec::new();
        };

        let mut messages: Vec<Outgoing> =
            discovery::device_triggers(&device, &ieee, &loaded.catalog)
                .into_iter()
                .map(Outgoing::DiscoveryTrigger)
                .collect();

        self.helpers.create_for_device(&device, now);
        let helpers: Vec<&Helper> = self.helpers.for_device(&ieee).collect();
        for helper in &helpers {
            // Subscribe to HomeAssistant state changes.
            messages.extend(discovery::command_topic(helper).map(Outgoing::Subscribe));
            messages.extend(discovery::options_topic(helper).map(Outgoing::Subscribe));
        }
        messages.push(Outgoing::DiscoveryDevice(discovery::new_device(
            &device,
            &ieee,
            helpers.iter().copied(),
        )));
        messages.extend(helpers.iter().map(|helper| state_message(helper)));

        info!(
            "Registered remote {} ({}) with quirk {}, {} triggers",
            device.name,
            ieee,
            quirk,
            loaded.catalog.len()
        );
        self.remotes.insert(ieee, Remote { device, quirk });
        messages
    }

    pub fn command(&mut self, event: &CommandEvent, now: DateTime<Utc>) -> anyhow::Result<Vec<Outgoing>> {
        let loaded = match self.remotes.get(&event.ieee) {
            Some(remote) => self.registry.by_name(remote.quirk),
            None => {
                debug!("{}: command from unknown device, ignoring", event.ieee);
                return Ok(Vec::new());
            }
        };
        let action = match loaded.and_then(|quirk| handle_cluster_request(quirk, event)) {
            Some(action) => action,
            None => return Ok(Vec::new()),
        };

        if !action.triggers.is_empty() {
            let fired: Vec<String> = action.triggers.iter().map(|t| t.payload()).collect();
            info!("{}: {}", event.ieee, fired.join(", "));
        }

        let mut messages = vec![Outgoing::Action(action)];
        if let Some(id) = self.helpers.touch(&event.ieee, now)? {
            messages.extend(self.helpers.get(&id).map(state_message));
        }
        Ok(messages)
    }

    /// Value written to a helper from HA. The resulting state is published
    /// back, also when the value was refused.
    pub fn helper_set(&mut self, device: &str, object: &str, value: &str) -> anyhow::Result<Vec<Outgoing>> {
        let kind = if let Some(kind) = HelperKind::from_object(object) {
            kind
        } else {
            warn!("Unknown helper {} of {}", object, device);
            return Ok(Vec::new());
        };
        let id = helpers::unique_id(device, kind);

        match kind {
            HelperKind::CurrentArea | HelperKind::CurrentLight => {
                self.helpers.select_option(&id, value)?;
            }
            HelperKind::DefaultArea => {
                self.helpers.set_value(&id, value)?;
            }
            HelperKind::LastActivity => {
                warn!("{} is read only", id);
            }
        }
        Ok(self.helpers.get(&id).map(state_message).into_iter().collect())
    }

    /// New options for a select helper. The device discovery is sent again
    /// as it carries the options.
    pub fn helper_options(
        &mut self,
        device: &str,
        object: &str,
        options: Vec<String>,
    ) -> anyhow::Result<Vec<Outgoing>> {
        let id = match HelperKind::from_object(object) {
            Some(kind @ (HelperKind::CurrentArea | HelperKind::CurrentLight)) => {
                helpers::unique_id(device, kind)
            }
            _ => {
                warn!("Helper {} of {} has no options", object, device);
                return Ok(Vec::new());
            }
        };
        if !self.helpers.set_options(&id, options)? {
            return Ok(Vec::new());
        }

        let remote = self
            .remotes
            .iter()
            .find(|(ieee, _)| consts::clean_ieee(ieee) == device);
        let mut messages = Vec::new();
        if let Some((ieee, remote)) = remote {
            messages.push(Outgoing::DiscoveryDevice(discovery::new_device(
                &remote.device,
                ieee,
                self.helpers.for_device(ieee),
            )));
        }
        messages.extend(self.helpers.get(&id).map(state_message));
        Ok(messages)
    }

    /// Handle one incoming message, persisting helper state it changed.
    pub async fn handle(&mut self, message: Incoming, now: DateTime<Utc>) -> anyhow::Result<Vec<Outgoing>> {
        let messages = match message {
            Incoming::Announce(announce) => return Ok(self.announce(announce, now)),
            Incoming::Command(event) => self.command(&event, now)?,
            Incoming::HelperSet {
                device,
                object,
                value,
            } => self.helper_set(&device, &object, &value)?,
            Incoming::HelperOptions {
                device,
                object,
                options,
            } => self.helper_options(&device, &object, options)?,
        };

        // State stays in memory and is written with the next change.
        if !messages.is_empty() {
            if let Err(err) = self.helpers.save().await {
                error!("Unable to save helper state: {:?}", err);
            }
        }
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quirks::tests::{awox_signature, ts004f_signature};
    use crate::quirks::AwoxVariant;
    use crate::store::RemoteStore;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const IEEE: &str = "a4:c1:38:00:00:00:00:01";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 19, 9, 32, 0).unwrap()
    }

    async fn gate(dir: &TempDir) -> Gate {
        let registry = QuirkRegistry::new(AwoxVariant::ThreeBanks).unwrap();
        let store = RemoteStore::open(dir.path()).await.unwrap();
        Gate::new(registry, HelperManager::new(store))
    }

    fn configured() -> RemoteDevice {
        RemoteDevice {
            ieee: Some(IEEE.to_string()),
            name: "Living".to_string(),
            manufacturer: "AwoX".to_string(),
            model: "ERCU_3groups_Zm".to_string(),
            area: Some("Living Room".to_string()),
        }
    }

    fn red_2() -> CommandEvent {
        CommandEvent {
            ieee: IEEE.to_string(),
            endpoint: 1,
            cluster: 768,
            command_id: 0x30,
            payload: vec![0x00, 0xFF],
            group: Some(0x800B),
        }
    }

    #[tokio::test]
    async fn test_register_configured() {
        let dir = TempDir::new().unwrap();
        let mut gate = gate(&dir).await;
        let messages = gate.register_configured(configured(), now());

        let triggers = messages
            .iter()
            .filter(|m| matches!(m, Outgoing::DiscoveryTrigger(_)))
            .count();
        assert_eq!(triggers, 66);

        let subscriptions: Vec<&str> = messages
            .iter()
            .filter_map(|m| match m {
                Outgoing::Subscribe(topic) => Some(topic.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            subscriptions,
            vec![
                "eglo/a4c1380000000001/current_area/set",
                "eglo/a4c1380000000001/current_area/options/set",
                "eglo/a4c1380000000001/current_light/set",
                "eglo/a4c1380000000001/current_light/options/set",
                "eglo/a4c1380000000001/default_area/set",
            ]
        );

        let device = messages
            .iter()
            .find_map(|m| match m {
                Outgoing::DiscoveryDevice(d) => Some(d),
                _ => None,
            })
            .unwrap();
        assert_eq!(device.components.len(), 4);
        assert!(messages.iter().any(|m| matches!(
            m,
            Outgoing::State { topic, payload }
                if topic == "eglo/a4c1380000000001/current_area/state" && payload == "Living Room"
        )));
        assert!(gate.is_registered(IEEE));
    }

    #[tokio::test]
    async fn test_unknown_model_or_missing_ieee() {
        let dir = TempDir::new().unwrap();
        let mut gate = gate(&dir).await;

        let mut device = configured();
        device.model = "ERCU_2groups".to_string();
        assert!(gate.register_configured(device, now()).is_empty());

        let mut device = configured();
        device.ieee = None;
        assert!(gate.register_configured(device, now()).is_empty());
        assert!(!gate.is_registered(IEEE));
    }

    #[tokio::test]
    async fn test_command_fires_triggers() {
        let dir = TempDir::new().unwrap();
        let mut gate = gate(&dir).await;
        gate.register_configured(configured(), now());

        let later = now() + chrono::Duration::seconds(30);
        let messages = gate.handle(Incoming::Command(red_2()), later).await.unwrap();
        assert_eq!(messages.len(), 2);
        match &messages[0] {
            Outgoing::Action(action) => {
                assert_eq!(action.triggers.len(), 1);
                assert_eq!(action.triggers[0].payload(), "red_2_remote_button_short_press");
            }
            other => panic!("Unexpected {:?}", other),
        }
        match &messages[1] {
            Outgoing::State { topic, payload } => {
                assert_eq!(topic, "eglo/a4c1380000000001/last_activity/state");
                assert_eq!(payload, &later.to_rfc3339());
            }
            other => panic!("Unexpected {:?}", other),
        }

        // Touched remote was written to disk.
        let store = RemoteStore::open(dir.path()).await.unwrap();
        assert!(store.contains(IEEE, "last_activity"));
    }

    #[tokio::test]
    async fn test_command_delivered_when_storage_is_unwritable() {
        let dir = TempDir::new().unwrap();
        let mut gate = gate(&dir).await;
        gate.register_configured(configured(), now());

        // A plain file where the storage directory should be.
        std::fs::write(dir.path().join(".storage"), b"").unwrap();

        let messages = gate.handle(Incoming::Command(red_2()), now()).await.unwrap();
        match &messages[0] {
            Outgoing::Action(action) => {
                assert_eq!(action.triggers[0].payload(), "red_2_remote_button_short_press");
            }
            other => panic!("Unexpected {:?}", other),
        }
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn test_command_from_unknown_remote() {
        let dir = TempDir::new().unwrap();
        let mut gate = gate(&dir).await;
        assert!(gate.command(&red_2(), now()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_announce() {
        let dir = TempDir::new().unwrap();
        let mut gate = gate(&dir).await;

        let announce = DeviceAnnounce {
            ieee: "00:11:22:33:44:55:66:77".to_string(),
            name: None,
            area: None,
            signature: ts004f_signature(),
        };
        let messages = gate.announce(announce, now());
        let triggers = messages
            .iter()
            .filter(|m| matches!(m, Outgoing::DiscoveryTrigger(_)))
            .count();
        assert_eq!(triggers, 18);
        assert!(gate.is_registered("00:11:22:33:44:55:66:77"));

        // Configured name survives the announcement.
        gate.register_configured(configured(), now());
        let announce = DeviceAnnounce {
            ieee: IEEE.to_string(),
            name: None,
            area: None,
            signature: awox_signature(),
        };
        let messages = gate.announce(announce, now());
        let device = messages
            .iter()
            .find_map(|m| match m {
                Outgoing::DiscoveryDevice(d) => Some(d),
                _ => None,
            })
            .unwrap();
        assert_eq!(device.device.name, "Living");
        assert_eq!(device.device.suggested_area.as_deref(), Some("Living Room"));

        let mut signature = awox_signature();
        signature.endpoints.pop();
        let announce = DeviceAnnounce {
            ieee: "00:00:00:00:00:00:00:09".to_string(),
            name: None,
            area: None,
            signature,
        };
        assert!(gate.announce(announce, now()).is_empty());
    }

    #[tokio::test]
    async fn test_helper_set_and_options() {
        let dir = TempDir::new().unwrap();
        let mut gate = gate(&dir).await;
        gate.register_configured(configured(), now());
        let device = "a4c1380000000001";

        let messages = gate
            .handle(
                Incoming::HelperOptions {
                    device: device.to_string(),
                    object: "current_light".to_string(),
                    options: vec!["all".to_string(), "lamp".to_string()],
                },
                now(),
            )
            .await
            .unwrap();
        assert_eq!(messages.len(), 2);
        match &messages[0] {
            Outgoing::DiscoveryDevice(d) => {
                assert_eq!(
                    d.components["current_light"].options,
                    Some(vec!["all".to_string(), "lamp".to_string()])
                );
            }
            other => panic!("Unexpected {:?}", other),
        }

        let messages = gate.helper_set(device, "current_light", "lamp").unwrap();
        assert!(matches!(
            &messages[..],
            [Outgoing::State { payload, .. }] if payload == "lamp"
        ));

        // Refused value publishes the current one again.
        let messages = gate.helper_set(device, "current_light", "desk").unwrap();
        assert!(matches!(
            &messages[..],
            [Outgoing::State { payload, .. }] if payload == "lamp"
        ));

        let messages = gate.helper_set(device, "default_area", "Hall").unwrap();
        assert!(matches!(
            &messages[..],
            [Outgoing::State { payload, .. }] if payload == "Hall"
        ));

        assert!(gate.helper_set(device, "color", "red").unwrap().is_empty());
        assert!(gate
            .helper_options(device, "default_area", vec![])
            .unwrap()
            .is_empty());
    }
}
