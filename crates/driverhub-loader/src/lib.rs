//! Directory-based driver discovery for driverhub hosts.
//!
//! A [`DriverLoader`] scans one or more search directories. Every immediate
//! subdirectory is treated as a driver: its `package.json` manifest is read,
//! its configuration is loaded from (or seeded into)
//! `<config root>/<driver>/config.json`, its implementation is resolved
//! through a [`DriverResolver`] and the resulting instance is registered
//! under the directory name.

mod config;
mod error;
mod library;
mod loader;
mod manifest;
mod resolver;

pub use config::{ConfigStore, CONFIG_FILE};
pub use error::{ConfigError, ManifestError, ResolveError};
pub use library::{DriverEntryPoint, LibraryResolver};
pub use loader::{DriverLoader, DriverSummary, LoadedDriver};
pub use manifest::{DriverManifest, DEFAULT_ENTRY, MANIFEST_FILE};
pub use resolver::{CatalogResolver, ChainResolver, DriverResolver};
