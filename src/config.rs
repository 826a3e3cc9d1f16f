use crate::consts;
use crate::helpers::RemoteDevice;
use crate::quirks::AwoxVariant;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

fn default_manufacturer() -> String {
    consts::EGLO_MANUFACTURER.to_string()
}

fn default_model() -> String {
    consts::EGLO_MODEL.to_string()
}

/// Remote known ahead of time; gets its triggers and helpers on startup.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    pub ieee: Option<String>,
    #[serde(default = "default_manufacturer")]
    pub manufacturer: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub area: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub awox_variant: AwoxVariant,
    #[serde(default)]
    pub remotes: HashMap<String, RemoteConfig>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(filename: P) -> anyhow::Result<Self> {
        let handle = File::open(filename)?;
        let data: Config = serde_yaml::from_reader(handle)?;

        Ok(data)
    }

    pub fn parse(data: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(data)?)
    }

    pub fn remote_devices(&self) -> Vec<RemoteDevice> {
        let mut devices: Vec<RemoteDevice> = self
            .remotes
            .iter()
            .map(|(name, cfg)| RemoteDevice {
                ieee: cfg.ieee.clone(),
                name: name.clone(),
                manufacturer: cfg.manufacturer.clone(),
                model: cfg.model.clone(),
                area: cfg.area.clone(),
            })
            .collect();
        devices.sort_by(|a, b| a.name.cmp(&b.name));
        devices
    }
}
