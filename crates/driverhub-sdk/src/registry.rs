use std::collections::BTreeMap;
use std::sync::Arc;

use crate::DriverFactory;

/// Name of the symbol exported by [`declare_driverhub_drivers!`](crate::declare_driverhub_drivers).
pub const ENTRYPOINT_SYMBOL: &[u8] = b"driverhub_driver_entrypoint\0";

/// Set of named driver factories exported by one library.
#[derive(Default)]
pub struct DriverModule {
    factories: BTreeMap<String, Arc<dyn DriverFactory>>,
}

impl DriverModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_factory(
        &mut self,
        name: impl Into<String>,
        factory: Arc<dyn DriverFactory>,
    ) -> &mut Self {
        self.factories.insert(name.into(), factory);
        self
    }

    pub fn factory(&self, name: &str) -> Option<Arc<dyn DriverFactory>> {
        self.factories.get(name).cloned()
    }

    /// The only factory in the module, if there is exactly one.
    pub fn sole_factory(&self) -> Option<Arc<dyn DriverFactory>> {
        if self.factories.len() == 1 {
            self.factories.values().next().cloned()
        } else {
            None
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

pub struct DriverExport {
    module: DriverModule,
}

impl DriverExport {
    pub fn new(module: DriverModule) -> Self {
        Self { module }
    }

    pub fn module(&self) -> &DriverModule {
        &self.module
    }

    pub fn into_module(self) -> DriverModule {
        self.module
    }
}
