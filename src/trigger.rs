//! Device automation triggers.
//!
//! A catalog maps (press type, action name) pairs to the cluster command that
//! fires them. Home Assistant automations reference the keys by their exact
//! strings, so the tables in `quirks` are a stable contract.

use crate::bank::Bank;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Named integer arguments of a cluster command.
pub type Params = BTreeMap<String, i64>;

/// How the button was pressed. Reported by the remote itself, we never time
/// presses.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub enum PressType {
    #[serde(rename = "remote_button_short_press")]
    ShortPress,
    #[serde(rename = "remote_button_long_press")]
    LongPress,
    #[serde(rename = "remote_button_long_release")]
    LongRelease,
}

impl PressType {
    pub fn as_str(self) -> &'static str {
        match self {
            PressType::ShortPress => "remote_button_short_press",
            PressType::LongPress => "remote_button_long_press",
            PressType::LongRelease => "remote_button_long_release",
        }
    }
}

impl fmt::Display for PressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub struct TriggerKey {
    #[serde(rename = "type")]
    pub press_type: PressType,
    #[serde(rename = "subtype")]
    pub action: String,
}

impl TriggerKey {
    pub fn new(press_type: PressType, action: &str) -> Self {
        Self {
            press_type,
            action: action.to_string(),
        }
    }

    /// Payload published on the action topic when this trigger fires.
    pub fn payload(&self) -> String {
        format!("{}_{}", self.action, self.press_type.as_str())
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.press_type, self.action)
    }
}

/// Command pattern a trigger reacts to.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct TriggerDef {
    pub command: String,
    pub cluster_id: u16,
    pub endpoint_id: u8,
    #[serde(skip_serializing_if = "Params::is_empty")]
    pub params: Params,
    /// Set on catalogs generated per bank.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<Bank>,
}

impl TriggerDef {
    pub fn new(command: &str, cluster_id: u16, params: &[(&str, i64)]) -> Self {
        Self {
            command: command.to_string(),
            cluster_id,
            endpoint_id: 1,
            params: params
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
            bank: None,
        }
    }

    fn matches(&self, event: &TriggerEvent) -> bool {
        if self.command != event.command
            || self.cluster_id != event.cluster_id
            || self.endpoint_id != event.endpoint_id
        {
            return false;
        }
        if self.bank.is_some() && self.bank != event.bank {
            return false;
        }
        self.params
            .iter()
            .all(|(name, value)| event.args.get(name) == Some(value))
    }
}

/// Decoded command as seen by the trigger matcher.
#[derive(Debug, Clone, Copy)]
pub struct TriggerEvent<'a> {
    pub command: &'a str,
    pub cluster_id: u16,
    pub endpoint_id: u8,
    pub args: &'a Params,
    pub bank: Option<Bank>,
}

/// Ordered trigger table. Iteration order is the key order, independent of
/// the order entries were declared in.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct TriggerCatalog {
    entries: BTreeMap<TriggerKey, TriggerDef>,
}

impl TriggerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from declared entries. Fails on a repeated key.
    pub fn try_from_entries<'a, I>(entries: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (PressType, &'a str, TriggerDef)>,
    {
        let mut catalog = Self::new();
        for (press_type, action, def) in entries {
            catalog.insert(TriggerKey::new(press_type, action), def)?;
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, key: TriggerKey, def: TriggerDef) -> anyhow::Result<()> {
        if self.entries.contains_key(&key) {
            anyhow::bail!("Duplicated trigger {}", key);
        }
        self.entries.insert(key, def);
        Ok(())
    }

    pub fn get(&self, press_type: PressType, action: &str) -> Option<&TriggerDef> {
        self.entries.get(&TriggerKey::new(press_type, action))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TriggerKey, &TriggerDef)> {
        self.entries.iter()
    }

    /// All triggers fired by the event. Usually one, but tables with
    /// identical commands on different buttons yield several.
    pub fn matching(&self, event: &TriggerEvent) -> Vec<(&TriggerKey, &TriggerDef)> {
        self.entries
            .iter()
            .filter(|(_, def)| def.matches(event))
            .collect()
    }
}

impl Serialize for TriggerCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Entry<'a> {
            #[serde(flatten)]
            key: &'a TriggerKey,
            #[serde(flatten)]
            def: &'a TriggerDef,
        }

        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for (key, def) in &self.entries {
            seq.serialize_element(&Entry { key, def })?;
        }
        seq.end()
    }
}

/// Expand a table of bank-less actions into one entry per bank.
///
/// Each action `a` becomes `a_1`, `a_2` and `a_3`, pinned to endpoint 1 and
/// annotated with its bank. Keys cannot collide: source keys are unique and
/// the suffixes differ.
pub fn build_trigger_table(base: &TriggerCatalog) -> TriggerCatalog {
    let mut entries = BTreeMap::new();
    for (key, def) in base.iter() {
        for bank in Bank::ALL {
            let key = TriggerKey {
                press_type: key.press_type,
                action: bank.suffix(&key.action),
            };
            let def = TriggerDef {
                endpoint_id: 1,
                bank: Some(bank),
                ..def.clone()
            };
            entries.insert(key, def);
        }
    }
    TriggerCatalog { entries }
}
