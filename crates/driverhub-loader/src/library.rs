use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use driverhub_sdk::{
    Driver, DriverContext, DriverError, DriverEvents, DriverExport, DriverFactory, Logger,
    SaveHandle, ENTRYPOINT_SYMBOL,
};
use libloading::Library;
use parking_lot::Mutex;

use crate::error::ResolveError;
use crate::manifest::DriverManifest;
use crate::resolver::DriverResolver;

/// Signature of the symbol emitted by `declare_driverhub_drivers!`.
/// `DriverExport` is a Rust type; both sides must be built by the same
/// compiler.
#[allow(improper_ctypes_definitions)]
pub type DriverEntryPoint = unsafe extern "C" fn() -> DriverExport;

const ENTRYPOINT_NAME: &str = "driverhub_driver_entrypoint";

/// Loads drivers shipped as dynamic libraries.
///
/// The library is looked up from the manifest `main` entry (default
/// `index`), either as a literal file name or in the platform's
/// `lib<entry>.so` / `<entry>.dll` form.
///
/// Every library opened by the resolver stays loaded until the resolver is
/// dropped, even when no driver could be created from it.
#[derive(Default)]
pub struct LibraryResolver {
    libraries: Mutex<Vec<Arc<Library>>>,
}

impl LibraryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of libraries held open by this resolver.
    pub fn loaded_libraries(&self) -> usize {
        self.libraries.lock().len()
    }

    pub fn candidates(dir: &Path, entry: &str) -> Vec<PathBuf> {
        let mut candidates = vec![
            dir.join(entry),
            dir.join(format!("{DLL_PREFIX}{entry}{DLL_SUFFIX}")),
            dir.join(format!("{entry}{DLL_SUFFIX}")),
        ];
        candidates.dedup();
        candidates
    }

    pub fn locate(dir: &Path, entry: &str) -> Option<PathBuf> {
        Self::candidates(dir, entry)
            .into_iter()
            .find(|candidate| candidate.is_file())
    }
}

impl DriverResolver for LibraryResolver {
    fn resolve(
        &self,
        name: &str,
        dir: &Path,
        manifest: &DriverManifest,
    ) -> Result<Arc<dyn DriverFactory>, ResolveError> {
        let entry = manifest.entry();
        let path = Self::locate(dir, entry)
            .ok_or_else(|| ResolveError::MissingEntry(dir.join(entry)))?;

        let library = Arc::new(unsafe { Library::new(&path) }?);
        self.libraries.lock().push(Arc::clone(&library));

        let export = unsafe {
            let symbol = library
                .get::<DriverEntryPoint>(ENTRYPOINT_SYMBOL)
                .map_err(|_| ResolveError::missing_symbol(path.clone(), ENTRYPOINT_NAME))?;
            symbol()
        };
        let module = export.into_module();

        let factory = manifest
            .name
            .as_deref()
            .and_then(|declared| module.factory(declared))
            .or_else(|| module.factory(name))
            .or_else(|| module.sole_factory())
            .ok_or_else(|| ResolveError::UnknownFactory {
                path: path.clone(),
                name: name.to_string(),
            })?;

        Ok(Arc::new(LibraryFactory {
            factory,
            library,
            path,
        }))
    }
}

impl fmt::Debug for LibraryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryResolver")
            .field("loaded_libraries", &self.loaded_libraries())
            .finish()
    }
}

/// Factory that keeps its defining library loaded.
struct LibraryFactory {
    factory: Arc<dyn DriverFactory>,
    library: Arc<Library>,
    path: PathBuf,
}

impl DriverFactory for LibraryFactory {
    fn create(&self, ctx: DriverContext) -> Result<Box<dyn Driver>, DriverError> {
        let driver = self.factory.create(ctx)?;
        Ok(Box::new(LibraryDriver {
            driver,
            _library: Arc::clone(&self.library),
        }))
    }
}

impl fmt::Debug for LibraryFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryFactory")
            .field("path", &self.path)
            .finish()
    }
}

/// Driver created from a library. Field order matters: the driver must be
/// dropped before the library that holds its code.
struct LibraryDriver {
    driver: Box<dyn Driver>,
    _library: Arc<Library>,
}

impl Driver for LibraryDriver {
    fn events(&self) -> &DriverEvents {
        self.driver.events()
    }

    fn set_log(&mut self, log: Logger) {
        self.driver.set_log(log)
    }

    fn set_save(&mut self, save: SaveHandle) {
        self.driver.set_save(save)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn locate_prefers_literal_entry() {
        let dir = tempdir().unwrap();
        let literal = dir.path().join("driver.so");
        fs::write(&literal, b"").unwrap();
        assert_eq!(
            LibraryResolver::locate(dir.path(), "driver.so"),
            Some(literal)
        );
    }

    #[test]
    fn locate_falls_back_to_platform_library_name() {
        let dir = tempdir().unwrap();
        let platform = dir.path().join(format!("{DLL_PREFIX}index{DLL_SUFFIX}"));
        fs::write(&platform, b"").unwrap();
        assert_eq!(LibraryResolver::locate(dir.path(), "index"), Some(platform));
    }

    #[test]
    fn missing_entry_is_reported() {
        let dir = tempdir().unwrap();
        let result = LibraryResolver::new().resolve("lamp", dir.path(), &DriverManifest::default());
        assert!(matches!(result, Err(ResolveError::MissingEntry(path)) if path == dir.path().join("index")));
    }

    #[test]
    fn non_library_entry_fails_to_load() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("index"), b"not a shared object").unwrap();
        let resolver = LibraryResolver::new();
        let result = resolver.resolve("lamp", dir.path(), &DriverManifest::default());
        assert!(matches!(result, Err(ResolveError::LibraryLoad(_))));
        assert_eq!(resolver.loaded_libraries(), 0);
    }

    #[cfg(target_os = "linux")]
    const SYSTEM_LIBS: &[&str] = &[
        "/lib/x86_64-linux-gnu/libm.so.6",
        "/usr/lib/x86_64-linux-gnu/libm.so.6",
        "/lib/aarch64-linux-gnu/libm.so.6",
        "/usr/lib/aarch64-linux-gnu/libm.so.6",
        "/lib64/libm.so.6",
        "/usr/lib64/libm.so.6",
        "/usr/lib/libm.so.6",
    ];

    #[cfg(target_os = "linux")]
    #[test]
    fn opened_library_stays_loaded_when_entry_point_is_missing() {
        let Some(system_lib) = SYSTEM_LIBS
            .iter()
            .map(Path::new)
            .find(|path| path.is_file())
        else {
            return;
        };
        let dir = tempdir().unwrap();
        fs::copy(system_lib, dir.path().join("index")).unwrap();

        let resolver = LibraryResolver::new();
        let result = resolver.resolve("lamp", dir.path(), &DriverManifest::default());
        assert!(matches!(result, Err(ResolveError::MissingSymbol { .. })));
        assert_eq!(resolver.loaded_libraries(), 1);
    }
}
