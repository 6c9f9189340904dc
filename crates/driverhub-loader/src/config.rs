use std::fs;
use std::path::{Path, PathBuf};

use driverhub_sdk::{ConfigError, ConfigSink, DriverConfig, Logger};

/// File name of each driver's persisted configuration.
pub const CONFIG_FILE: &str = "config.json";

/// Per-driver JSON configuration files under a common root:
/// `<root>/<driver>/config.json`.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    root: PathBuf,
    log: Logger,
}

impl ConfigStore {
    pub fn new(root: impl Into<PathBuf>, log: Logger) -> Self {
        Self {
            root: root.into(),
            log,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir_for(name).join(CONFIG_FILE)
    }

    /// Read the persisted configuration for `name`. Any read or parse
    /// failure is logged and reported as `None`.
    pub fn load(&self, name: &str) -> Option<DriverConfig> {
        let path = self.path_for(name);
        let parsed = fs::read_to_string(&path)
            .map_err(|err| err.to_string())
            .and_then(|raw| serde_json::from_str(&raw).map_err(|err| err.to_string()));
        match parsed {
            Ok(config) => Some(config),
            Err(err) => {
                self.log.warn(format_args!(
                    "Failed to load config for driver {name} from {}: {err}",
                    path.display()
                ));
                None
            }
        }
    }

    /// Write `config` for `name`, creating the driver's directory first.
    pub fn save(&self, name: &str, config: &DriverConfig) -> Result<(), ConfigError> {
        self.log
            .debug(format_args!("Saving config for driver {name}: {config}"));
        let dir = self.dir_for(name);
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|source| ConfigError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }
        let json = serde_json::to_string(config)?;
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, json).map_err(|source| ConfigError::Write { path, source })
    }
}

impl ConfigSink for ConfigStore {
    fn save_config(&self, name: &str, config: &DriverConfig) -> Result<(), ConfigError> {
        self.save(name, config)
    }
}
