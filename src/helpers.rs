//! Helper entities created for every remote.
//!
//! Automations use them to remember which area and light the remote
//! currently controls, its default area and when it was last used.

use crate::consts;
use crate::store::RemoteStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

pub const OPTION_ALL: &str = "all";

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub enum HelperKind {
    CurrentArea,
    CurrentLight,
    DefaultArea,
    LastActivity,
}

impl HelperKind {
    pub const ALL: [HelperKind; 4] = [
        HelperKind::CurrentArea,
        HelperKind::CurrentLight,
        HelperKind::DefaultArea,
        HelperKind::LastActivity,
    ];

    pub fn domain(self) -> &'static str {
        match self {
            HelperKind::CurrentArea | HelperKind::CurrentLight => "input_select",
            HelperKind::DefaultArea => "input_text",
            HelperKind::LastActivity => "input_datetime",
        }
    }

    /// Suffix of the unique id, also used as the store key.
    pub fn object(self) -> &'static str {
        match self {
            HelperKind::CurrentArea => "current_area",
            HelperKind::CurrentLight => "current_light",
            HelperKind::DefaultArea => "default_area",
            HelperKind::LastActivity => "last_activity",
        }
    }

    pub fn from_object(object: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.object() == object)
    }

    fn title(self) -> &'static str {
        match self {
            HelperKind::CurrentArea => "Current Area",
            HelperKind::CurrentLight => "Current Light",
            HelperKind::DefaultArea => "Default Area",
            HelperKind::LastActivity => "Last Activity",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HelperState {
    Select {
        options: Vec<String>,
        current: Option<String>,
    },
    Text {
        value: String,
    },
    Datetime {
        has_date: bool,
        has_time: bool,
        value: DateTime<Utc>,
    },
}

impl HelperState {
    /// Text representation published as the entity state.
    pub fn state(&self) -> String {
        match self {
            HelperState::Select { current, .. } => current.clone().unwrap_or_default(),
            HelperState::Text { value } => value.clone(),
            HelperState::Datetime { value, .. } => value.to_rfc3339(),
        }
    }
}

/// Remote known to the gate, from the config file or a bridge announcement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteDevice {
    pub ieee: Option<String>,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub area: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Helper {
    /// IEEE address of the remote owning the helper.
    pub device: String,
    pub kind: HelperKind,
    pub unique_id: String,
    pub name: String,
    pub state: HelperState,
}

impl Helper {
    pub fn entity_id(&self) -> String {
        format!("{}.{}", self.kind.domain(), self.unique_id)
    }

    fn initial(device: &RemoteDevice, ieee: &str, kind: HelperKind, now: DateTime<Utc>) -> Self {
        let area = device.area.clone().unwrap_or_default();
        let state = match kind {
            HelperKind::CurrentArea => HelperState::Select {
                options: vec![OPTION_ALL.to_string()],
                current: Some(if area.is_empty() {
                    OPTION_ALL.to_string()
                } else {
                    area
                }),
            },
            HelperKind::CurrentLight => HelperState::Select {
                options: vec![OPTION_ALL.to_string()],
                current: Some(OPTION_ALL.to_string()),
            },
            HelperKind::DefaultArea => HelperState::Text { value: area },
            HelperKind::LastActivity => HelperState::Datetime {
                has_date: true,
                has_time: true,
                value: now,
            },
        };

        Self {
            device: ieee.to_string(),
            kind,
            unique_id: unique_id(ieee, kind),
            name: format!("Eglo Remote {} {}", device.name, kind.title()),
            state,
        }
    }
}

pub fn unique_id(ieee: &str, kind: HelperKind) -> String {
    format!("eglo_remote_{}_{}", consts::clean_ieee(ieee), kind.object())
}

/// All helper entities, persisted through the remote store.
#[derive(Debug)]
pub struct HelperManager {
    store: RemoteStore,
    helpers: BTreeMap<String, Helper>,
}

impl HelperManager {
    pub fn new(store: RemoteStore) -> Self {
        Self {
            store,
            helpers: BTreeMap::new(),
        }
    }

    /// Create the helpers of a remote that don't exist yet. State saved by a
    /// previous run wins over initial values. Returns the unique ids of the
    /// created helpers.
    pub fn create_for_device(&mut self, device: &RemoteDevice, now: DateTime<Utc>) -> Vec<String> {
        let ieee = if let Some(ieee) = device.ieee.as_deref().filter(|i| !i.is_empty()) {
            ieee
        } else {
            error!("Could not get IEEE for device {}", device.name);
            return Vec::new();
        };

        let mut created = Vec::new();
        for kind in HelperKind::ALL {
            let mut helper = Helper::initial(device, ieee, kind, now);
            if self.helpers.contains_key(&helper.unique_id) {
                debug!("Helper already exists: {}", helper.entity_id());
                continue;
            }

            let stored = self.store.get(ieee, kind.object(), helper.state.clone());
            if std::mem::discriminant(&stored) == std::mem::discriminant(&helper.state) {
                helper.state = stored;
            } else {
                warn!("Stored state of {} has a wrong type, resetting", helper.entity_id());
            }

            info!("Creating helper entity: {}", helper.entity_id());
            created.push(helper.unique_id.clone());
            self.helpers.insert(helper.unique_id.clone(), helper);
        }
        created
    }

    pub fn get(&self, unique_id: &str) -> Option<&Helper> {
        self.helpers.get(unique_id)
    }

    pub fn for_device<'a>(&'a self, ieee: &'a str) -> impl Iterator<Item = &'a Helper> + 'a {
        self.helpers.values().filter(move |h| h.device == ieee)
    }

    /// Select an option. Values not among the options are ignored.
    pub fn select_option(&mut self, unique_id: &str, option: &str) -> anyhow::Result<bool> {
        self.update(unique_id, |state| match state {
            HelperState::Select { options, current } => {
                if options.iter().any(|o| o == option) {
                    *current = Some(option.to_string());
                    true
                } else {
                    debug!("Option {} not available, ignoring", option);
                    false
                }
            }
            _ => false,
        })
    }

    /// Replace the options of a select; a current value no longer present
    /// moves to the first option.
    pub fn set_options(&mut self, unique_id: &str, new_options: Vec<String>) -> anyhow::Result<bool> {
        self.update(unique_id, |state| match state {
            HelperState::Select { options, current } => {
                let still_valid = current
                    .as_ref()
                    .is_some_and(|c| new_options.iter().any(|o| o == c));
                if !still_valid {
                    *current = new_options.first().cloned();
                }
                *options = new_options;
                true
            }
            _ => false,
        })
    }

    pub fn set_value(&mut self, unique_id: &str, new_value: &str) -> anyhow::Result<bool> {
        self.update(unique_id, |state| match state {
            HelperState::Text { value } => {
                *value = new_value.to_string();
                true
            }
            _ => false,
        })
    }

    pub fn set_datetime(&mut self, unique_id: &str, new_value: DateTime<Utc>) -> anyhow::Result<bool> {
        self.update(unique_id, |state| match state {
            HelperState::Datetime { value, .. } => {
                *value = new_value;
                true
            }
            _ => false,
        })
    }

    /// Bump the last activity of a remote.
    pub fn touch(&mut self, ieee: &str, now: DateTime<Utc>) -> anyhow::Result<Option<String>> {
        let id = unique_id(ieee, HelperKind::LastActivity);
        if self.set_datetime(&id, now)? {
            Ok(Some(id))
        } else {
            Ok(None)
        }
    }

    pub async fn save(&self) -> anyhow::Result<()> {
        self.store.save().await
    }

    fn update<F>(&mut self, unique_id: &str, change: F) -> anyhow::Result<bool>
    where
        F: FnOnce(&mut HelperState) -> bool,
    {
        let helper = if let Some(helper) = self.helpers.get_mut(unique_id) {
            helper
        } else {
            warn!("Unknown helper {}", unique_id);
            return Ok(false);
        };

        if !change(&mut helper.state) {
            return Ok(false);
        }
        self.store
            .set(&helper.device, helper.kind.object(), &helper.state)?;
        Ok(true)
    }
}
