use std::fs;
use std::path::{Path, PathBuf};

use driverhub_sdk::DriverConfig;
use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

/// File name of the manifest inside each driver directory.
pub const MANIFEST_FILE: &str = "package.json";

/// Entry point used when the manifest does not name one.
pub const DEFAULT_ENTRY: &str = "index";

/// Package metadata declared by a driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub main: Option<String>,
    /// Default configuration seeded when nothing has been persisted yet.
    #[serde(default)]
    pub config: Option<DriverConfig>,
}

impl DriverManifest {
    pub fn load(dir: &Path) -> Result<Self, ManifestError> {
        let path = Self::path_in(dir);
        if !path.is_file() {
            return Err(ManifestError::Missing(path));
        }
        let raw = fs::read_to_string(&path).map_err(|source| ManifestError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ManifestError::Parse { path, source })
    }

    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_FILE)
    }

    /// Configuration to seed when none is persisted. An absent or falsy
    /// `config` field (`null`, `false`, `0`, `""`) yields an empty object.
    pub fn default_config(&self) -> DriverConfig {
        match &self.config {
            Some(config) if !is_falsy(config) => config.clone(),
            _ => DriverConfig::Object(Default::default()),
        }
    }

    pub fn entry(&self) -> &str {
        self.main
            .as_deref()
            .map(|main| main.trim_start_matches("./"))
            .filter(|main| !main.is_empty())
            .unwrap_or(DEFAULT_ENTRY)
    }
}

fn is_falsy(value: &DriverConfig) -> bool {
    match value {
        DriverConfig::Null => true,
        DriverConfig::Bool(flag) => !flag,
        DriverConfig::Number(number) => number.as_f64() == Some(0.0),
        DriverConfig::String(text) => text.is_empty(),
        DriverConfig::Array(_) | DriverConfig::Object(_) => false,
    }
}
