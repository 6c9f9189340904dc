//! Driverhub Driver SDK
//! ====================
//!
//! Types shared between the driver loader and the drivers it hosts. A driver
//! is a self-contained integration with an external device or service. It is
//! described by a manifest on disk and constructed through a
//! [`DriverFactory`], which receives a [`DriverContext`] holding the driver's
//! persisted configuration, the host application and a [`Logger`] scoped to
//! the driver's name.
//!
//! Drivers built as dynamic libraries export their factories with
//! [`declare_driverhub_drivers!`].

mod driver;
mod error;
mod events;
mod host;
mod logger;
mod registry;

pub use driver::{
    ConfigSink, Driver, DriverConfig, DriverContext, DriverFactory, SaveHandle, VersionCallback,
};
pub use error::{ConfigError, DriverError};
pub use events::{Device, DriverEvents};
pub use host::{Host, HostApp};
pub use logger::Logger;
pub use registry::{DriverExport, DriverModule, ENTRYPOINT_SYMBOL};

/// Common imports for driver authors.
pub mod prelude {
    pub use crate::{
        Device, Driver, DriverConfig, DriverContext, DriverError, DriverEvents, DriverExport,
        DriverFactory, DriverModule, Host, Logger, SaveHandle,
    };
}

/// Declare the entry point for a dynamic driver library.
///
/// Each `name => factory` pair registers a [`DriverFactory`] within the
/// exported [`DriverModule`]. The name is matched against the manifest
/// `name` of the driver directory the library was loaded from.
///
/// # Example
///
/// ```ignore
/// use driverhub_sdk::{declare_driverhub_drivers, DriverContext, DriverError, Driver};
///
/// fn create(ctx: DriverContext) -> Result<Box<dyn Driver>, DriverError> { /* ... */ }
///
/// declare_driverhub_drivers!("ninja-serial" => create);
/// ```
#[macro_export]
macro_rules! declare_driverhub_drivers {
    ($($name:expr => $factory:expr),+ $(,)?) => {
        #[no_mangle]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn driverhub_driver_entrypoint() -> $crate::DriverExport {
            let mut module = $crate::DriverModule::new();
            $(module.register_factory($name, ::std::sync::Arc::new($factory));)+
            $crate::DriverExport::new(module)
        }
    };
}
