use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use driverhub_sdk::DriverFactory;

use crate::error::ResolveError;
use crate::manifest::DriverManifest;

/// Resolves the implementation of a driver found on disk.
pub trait DriverResolver {
    fn resolve(
        &self,
        name: &str,
        dir: &Path,
        manifest: &DriverManifest,
    ) -> Result<Arc<dyn DriverFactory>, ResolveError>;
}

impl<R: DriverResolver + ?Sized> DriverResolver for Box<R> {
    fn resolve(
        &self,
        name: &str,
        dir: &Path,
        manifest: &DriverManifest,
    ) -> Result<Arc<dyn DriverFactory>, ResolveError> {
        (**self).resolve(name, dir, manifest)
    }
}

/// In-process factories compiled into the host.
///
/// A driver directory resolves by its manifest `name`, falling back to the
/// directory name.
#[derive(Clone, Default)]
pub struct CatalogResolver {
    factories: HashMap<String, Arc<dyn DriverFactory>>,
}

impl CatalogResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: DriverFactory + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn with<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: DriverFactory + 'static,
    {
        self.register(name, factory);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl DriverResolver for CatalogResolver {
    fn resolve(
        &self,
        name: &str,
        _dir: &Path,
        manifest: &DriverManifest,
    ) -> Result<Arc<dyn DriverFactory>, ResolveError> {
        manifest
            .name
            .as_deref()
            .and_then(|declared| self.factories.get(declared))
            .or_else(|| self.factories.get(name))
            .cloned()
            .ok_or_else(|| ResolveError::Unregistered(name.to_string()))
    }
}

impl fmt::Debug for CatalogResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("CatalogResolver")
            .field("factories", &names)
            .finish()
    }
}

/// Tries each resolver in order; the first success wins.
#[derive(Default)]
pub struct ChainResolver {
    resolvers: Vec<Box<dyn DriverResolver>>,
}

impl ChainResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, resolver: impl DriverResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }
}

impl DriverResolver for ChainResolver {
    fn resolve(
        &self,
        name: &str,
        dir: &Path,
        manifest: &DriverManifest,
    ) -> Result<Arc<dyn DriverFactory>, ResolveError> {
        let mut last_error = None;
        for resolver in &self.resolvers {
            match resolver.resolve(name, dir, manifest) {
                Ok(factory) => return Ok(factory),
                Err(err) => last_error = Some(err),
            }
        }
        Err(last_error.unwrap_or_else(|| ResolveError::Exhausted(name.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use driverhub_sdk::{Driver, DriverContext, DriverError};
    use pretty_assertions::assert_eq;

    use super::*;

    fn unavailable(_ctx: DriverContext) -> Result<Box<dyn Driver>, DriverError> {
        Err(DriverError::Init("unavailable".into()))
    }

    fn manifest(name: Option<&str>) -> DriverManifest {
        DriverManifest {
            name: name.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn catalog_prefers_manifest_name_then_directory() {
        let catalog = CatalogResolver::new().with("ninja-serial", unavailable);
        let dir = Path::new("/drivers/serial");

        assert!(catalog
            .resolve("serial", dir, &manifest(Some("ninja-serial")))
            .is_ok());
        assert!(catalog
            .resolve("ninja-serial", dir, &manifest(None))
            .is_ok());
        assert!(matches!(
            catalog.resolve("serial", dir, &manifest(None)),
            Err(ResolveError::Unregistered(name)) if name == "serial"
        ));
    }

    #[test]
    fn chain_returns_first_success_or_last_error() {
        let dir = Path::new("/drivers/lamp");
        let chain = ChainResolver::new()
            .push(CatalogResolver::new())
            .push(CatalogResolver::new().with("lamp", unavailable));
        assert!(chain.resolve("lamp", dir, &manifest(None)).is_ok());

        let err = chain.resolve("fan", dir, &manifest(None)).err().unwrap();
        assert_eq!(err.to_string(), "no implementation registered for driver fan");

        assert!(matches!(
            ChainResolver::new().resolve("fan", dir, &manifest(None)),
            Err(ResolveError::Exhausted(_))
        ));
    }
}
