//! Per-remote key/value store.
//!
//! Kept as a single JSON file in the `.storage/` directory, wrapped with a
//! version header:
//! ```json
//! {"version": 1, "minor_version": 1, "key": "eglo_remote_zha",
//!  "data": {"<ieee>": {"<key>": <value>}}}
//! ```

use crate::consts;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const VERSION: u32 = 1;
const MINOR_VERSION: u32 = 1;

type DeviceData = BTreeMap<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StorageFile {
    version: u32,
    minor_version: u32,
    key: String,
    data: BTreeMap<String, DeviceData>,
}

#[derive(Debug)]
pub struct RemoteStore {
    path: PathBuf,
    file: StorageFile,
}

impl RemoteStore {
    /// Load the store from `<config_dir>/.storage/`, starting empty if the
    /// file does not exist yet.
    pub async fn open<P: AsRef<Path>>(config_dir: P) -> anyhow::Result<Self> {
        let path = config_dir.as_ref().join(".storage").join(consts::DOMAIN);

        let file = if fs::try_exists(&path).await? {
            let content = fs::read_to_string(&path).await?;
            let file: StorageFile = serde_json::from_str(&content)?;
            if file.version != VERSION {
                anyhow::bail!(
                    "Unsupported storage version {} in {:?}, expected {}",
                    file.version,
                    path,
                    VERSION
                );
            }
            debug!("Loaded {} remotes from {:?}", file.data.len(), path);
            file
        } else {
            debug!("Storage file {:?} not found, starting empty", path);
            StorageFile {
                version: VERSION,
                minor_version: MINOR_VERSION,
                key: consts::DOMAIN.to_string(),
                data: BTreeMap::new(),
            }
        };

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, device: &str, key: &str) -> bool {
        self.file
            .data
            .get(device)
            .is_some_and(|data| data.contains_key(key))
    }

    /// Read a value. Missing keys, and values that don't parse as `T`, give
    /// back `default`.
    pub fn get<T: DeserializeOwned>(&self, device: &str, key: &str, default: T) -> T {
        let value = if let Some(value) = self.file.data.get(device).and_then(|d| d.get(key)) {
            value
        } else {
            return default;
        };

        match serde_json::from_value(value.clone()) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("Stored {}/{} is malformed ({}), using default", device, key, err);
                default
            }
        }
    }

    /// Write a value, creating the device entry if needed. Call `save` to
    /// persist.
    pub fn set<T: Serialize>(&mut self, device: &str, key: &str, value: &T) -> anyhow::Result<()> {
        let value = serde_json::to_value(value)?;
        self.file
            .data
            .entry(device.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    #[cfg(test)]
    pub fn devices(&self) -> impl Iterator<Item = &str> {
        self.file.data.keys().map(String::as_str)
    }

    /// Write to a temp file first, then rename over the old one.
    pub async fn save(&self) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let temp_path = self.path.with_extension("tmp");
        let content = serde_json::to_string_pretty(&self.file)?;
        fs::write(&temp_path, &content).await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!("Saved storage file {:?}", self.path);
        Ok(())
    }
}
