use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use driverhub_sdk::{
    ConfigError, ConfigSink, Driver, DriverConfig, DriverContext, DriverEvents, Host, Logger,
    SaveHandle, VersionCallback,
};
use serde::Serialize;

use crate::config::ConfigStore;
use crate::manifest::DriverManifest;
use crate::resolver::DriverResolver;

/// A driver instance together with what the loader attached to it.
pub struct LoadedDriver {
    name: String,
    path: PathBuf,
    manifest: DriverManifest,
    log: Logger,
    save: SaveHandle,
    driver: Box<dyn Driver>,
}

impl LoadedDriver {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn manifest(&self) -> &DriverManifest {
        &self.manifest
    }

    pub fn log(&self) -> &Logger {
        &self.log
    }

    /// Configuration resolved when the driver was loaded.
    pub fn config(&self) -> &DriverConfig {
        self.save.snapshot()
    }

    /// Rewrite the driver's config file. See [`SaveHandle::save`].
    pub fn save(&self, config: Option<&DriverConfig>) -> Result<(), ConfigError> {
        self.save.save(config)
    }

    pub fn save_handle(&self) -> &SaveHandle {
        &self.save
    }

    /// Register event emitter of the driver. Listeners may run code from a
    /// driver library, so clones must not outlive the [`DriverLoader`].
    pub fn events(&self) -> &DriverEvents {
        self.driver.events()
    }

    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    pub fn driver_mut(&mut self) -> &mut dyn Driver {
        self.driver.as_mut()
    }

    pub fn summary(&self) -> DriverSummary {
        DriverSummary {
            name: self.name.clone(),
            path: self.path.clone(),
            version: self.manifest.version.clone(),
            config: self.config().clone(),
        }
    }
}

impl fmt::Debug for LoadedDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedDriver")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("log", &self.log)
            .field("config", self.config())
            .finish_non_exhaustive()
    }
}

/// Serializable description of a loaded driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverSummary {
    pub name: String,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub config: DriverConfig,
}

/// Discovers drivers in a set of search directories and keeps the ones that
/// loaded successfully, keyed by directory name.
///
/// All loading happens in [`DriverLoader::new`]. Problems with a directory or
/// a single driver are logged and skipped, so construction always succeeds
/// and a failed driver is simply absent from the registry.
pub struct DriverLoader {
    app: Arc<dyn Host>,
    log: Logger,
    store: Arc<ConfigStore>,
    search_paths: Vec<PathBuf>,
    // Drivers drop before the resolver that may hold their libraries.
    drivers: HashMap<String, LoadedDriver>,
    resolver: Box<dyn DriverResolver>,
}

impl DriverLoader {
    pub fn new<I, P>(
        app: Arc<dyn Host>,
        config_root: impl Into<PathBuf>,
        resolver: impl DriverResolver + 'static,
        search_paths: I,
    ) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let log = app.log().extend("Driver");
        let config_root = config_root.into();
        let search_paths: Vec<PathBuf> = search_paths.into_iter().map(Into::into).collect();

        log.debug(format_args!("Using driver paths: {search_paths:?}"));
        log.debug(format_args!("Using config path: {}", config_root.display()));

        let mut loader = Self {
            store: Arc::new(ConfigStore::new(config_root, log.clone())),
            app,
            log,
            resolver: Box::new(resolver),
            search_paths: Vec::new(),
            drivers: HashMap::new(),
        };
        for path in &search_paths {
            loader.load_path(path);
        }
        loader.search_paths = search_paths;
        loader
    }

    fn load_path(&mut self, path: &Path) {
        self.log
            .info(format_args!("Loading drivers from path {}", path.display()));

        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(err) => {
                self.log.warn(format_args!(
                    "Failed to load drivers from path {}: {err}",
                    path.display()
                ));
                return;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.log.warn(format_args!(
                        "Failed to read entry in {}: {err}",
                        path.display()
                    ));
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Err(err) = self.load_driver(&name, &entry.path()) {
                self.log
                    .warn(format_args!("Failed to load driver {name}: {err}"));
            }
        }
    }

    /// Load a single driver directory and register it under `name`.
    ///
    /// Missing manifests, unresolvable implementations, failing factories and
    /// duplicate names are logged and leave the registry untouched. Only a
    /// failure to persist the seeded default configuration is returned.
    pub fn load_driver(&mut self, name: &str, path: &Path) -> Result<(), ConfigError> {
        if self.drivers.contains_key(name) {
            self.log.warn(format_args!(
                "Driver {name} has already been loaded. Skipping."
            ));
            return Ok(());
        }

        self.log.info(format_args!(
            "Loading driver {name} from path {}",
            path.display()
        ));

        let manifest = match DriverManifest::load(path) {
            Ok(manifest) => manifest,
            Err(err) => {
                self.log
                    .warn(format_args!("Failed to load manifest for {name}: {err}"));
                return Ok(());
            }
        };

        let config = match self.store.load(name) {
            Some(config) => config,
            None => {
                let config = manifest.default_config();
                self.store.save(name, &config)?;
                config
            }
        };

        let factory = match self.resolver.resolve(name, path, &manifest) {
            Ok(factory) => factory,
            Err(err) => {
                self.log.warn(format_args!(
                    "Failed to load driver from {}: {err}",
                    path.display()
                ));
                return Ok(());
            }
        };

        let log = self.log.extend(name);
        let ctx = DriverContext {
            name: name.to_string(),
            config: config.clone(),
            app: Arc::clone(&self.app),
            log: log.clone(),
            version: VersionCallback::noop(),
        };
        let mut driver = match factory.create(ctx) {
            Ok(driver) => driver,
            Err(err) => {
                self.log
                    .warn(format_args!("Failed to construct driver {name}: {err}"));
                return Ok(());
            }
        };

        driver.set_log(log.clone());

        let sink: Arc<dyn ConfigSink> = self.store.clone();
        let save = SaveHandle::new(name, config, sink);
        driver.set_save(save.clone());

        let event_log = log.clone();
        driver
            .events()
            .on_register(move |device| event_log.debug(format_args!("Device registered {device}")));

        self.drivers.insert(
            name.to_string(),
            LoadedDriver {
                name: name.to_string(),
                path: path.to_path_buf(),
                manifest,
                log,
                save,
                driver,
            },
        );
        Ok(())
    }

    /// Persisted configuration for `name`, or `None` if it cannot be read.
    pub fn load_config(&self, name: &str) -> Option<DriverConfig> {
        self.store.load(name)
    }

    pub fn save_config(&self, name: &str, config: &DriverConfig) -> Result<(), ConfigError> {
        self.store.save(name, config)
    }

    pub fn config_store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn log(&self) -> &Logger {
        &self.log
    }

    pub fn drivers(&self) -> &HashMap<String, LoadedDriver> {
        &self.drivers
    }

    pub fn get(&self, name: &str) -> Option<&LoadedDriver> {
        self.drivers.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut LoadedDriver> {
        self.drivers.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    /// Registered driver names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.drivers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    pub fn into_drivers(self) -> HashMap<String, LoadedDriver> {
        self.drivers
    }
}

impl fmt::Debug for DriverLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverLoader")
            .field("log", &self.log)
            .field("config_root", &self.store.root())
            .field("search_paths", &self.search_paths)
            .field("drivers", &self.names())
            .finish_non_exhaustive()
    }
}
