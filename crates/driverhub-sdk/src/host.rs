use crate::Logger;

/// Host application the drivers are loaded into.
///
/// Drivers receive the host as a shared handle. The only capability the
/// loader relies on is the host's logger, from which every driver's scoped
/// logger is derived.
pub trait Host: Send + Sync {
    fn log(&self) -> &Logger;
}

/// Minimal [`Host`] used by the CLI and tests.
#[derive(Debug, Clone)]
pub struct HostApp {
    log: Logger,
}

impl HostApp {
    pub fn new(log: Logger) -> Self {
        Self { log }
    }
}

impl Default for HostApp {
    fn default() -> Self {
        Self::new(Logger::new("driverhub"))
    }
}

impl Host for HostApp {
    fn log(&self) -> &Logger {
        &self.log
    }
}
