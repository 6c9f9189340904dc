use std::fmt;
use std::sync::Arc;

use crate::{ConfigError, DriverError, DriverEvents, Host, Logger};

/// Persisted driver configuration. Usually a JSON object, but any JSON value
/// round-trips through the config store untouched.
pub type DriverConfig = serde_json::Value;

/// A loaded driver instance.
pub trait Driver: Send {
    /// Emitter the driver announces devices on.
    fn events(&self) -> &DriverEvents;

    /// Receives the logger scoped to this driver after construction.
    fn set_log(&mut self, _log: Logger) {}

    /// Receives the capability used to persist this driver's configuration.
    fn set_save(&mut self, _save: SaveHandle) {}
}

/// Constructs driver instances.
pub trait DriverFactory: Send + Sync {
    fn create(&self, ctx: DriverContext) -> Result<Box<dyn Driver>, DriverError>;
}

impl<F> DriverFactory for F
where
    F: Fn(DriverContext) -> Result<Box<dyn Driver>, DriverError> + Send + Sync,
{
    fn create(&self, ctx: DriverContext) -> Result<Box<dyn Driver>, DriverError> {
        self(ctx)
    }
}

/// Everything a driver receives at construction time.
pub struct DriverContext {
    pub name: String,
    pub config: DriverConfig,
    pub app: Arc<dyn Host>,
    /// Logger scoped to the driver's name.
    pub log: Logger,
    /// Legacy version reporting hook. The loader always passes a no-op.
    pub version: VersionCallback,
}

impl fmt::Debug for DriverContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverContext")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}

/// Callback some older drivers invoke to report their firmware version.
pub struct VersionCallback(Box<dyn Fn(&str) + Send + Sync>);

impl VersionCallback {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self(Box::new(callback))
    }

    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn call(&self, version: &str) {
        (self.0)(version)
    }
}

impl fmt::Debug for VersionCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VersionCallback")
    }
}

/// Destination for [`SaveHandle`] writes, implemented by the config store.
pub trait ConfigSink: Send + Sync {
    fn save_config(&self, name: &str, config: &DriverConfig) -> Result<(), ConfigError>;
}

/// Save capability bound to one driver's name and load-time configuration.
#[derive(Clone)]
pub struct SaveHandle {
    name: String,
    snapshot: Arc<DriverConfig>,
    sink: Arc<dyn ConfigSink>,
}

impl SaveHandle {
    pub fn new(name: impl Into<String>, snapshot: DriverConfig, sink: Arc<dyn ConfigSink>) -> Self {
        Self {
            name: name.into(),
            snapshot: Arc::new(snapshot),
            sink,
        }
    }

    /// Rewrite the driver's config file.
    ///
    /// The argument is ignored: the file always receives the configuration
    /// captured when the driver was loaded.
    pub fn save(&self, _config: Option<&DriverConfig>) -> Result<(), ConfigError> {
        self.sink.save_config(&self.name, &self.snapshot)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn snapshot(&self) -> &DriverConfig {
        &self.snapshot
    }
}

impl fmt::Debug for SaveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveHandle")
            .field("name", &self.name)
            .field("snapshot", &self.snapshot)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        writes: Mutex<Vec<(String, DriverConfig)>>,
    }

    impl ConfigSink for RecordingSink {
        fn save_config(&self, name: &str, config: &DriverConfig) -> Result<(), ConfigError> {
            self.writes.lock().push((name.to_string(), config.clone()));
            Ok(())
        }
    }

    #[test]
    fn save_writes_load_time_snapshot_regardless_of_argument() {
        let sink = Arc::new(RecordingSink::default());
        let handle = SaveHandle::new("lamp", json!({"interval": 10}), sink.clone());

        handle.save(Some(&json!({"interval": 99}))).unwrap();
        handle.save(None).unwrap();

        let writes = sink.writes.lock();
        assert_eq!(writes.len(), 2);
        for (name, config) in writes.iter() {
            assert_eq!(name, "lamp");
            assert_eq!(config, &json!({"interval": 10}));
        }
    }

    #[test]
    fn version_callback_forwards_calls() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let callback = VersionCallback::new(move |version| *sink.lock() = Some(version.to_string()));
        callback.call("1.2.0");
        VersionCallback::noop().call("ignored");
        assert_eq!(seen.lock().as_deref(), Some("1.2.0"));
    }
}
