use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Device announced by a driver through its `register` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Device {
    pub fn new(guid: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            name: None,
            kind: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.guid)?;
        if let Some(name) = &self.name {
            write!(f, " ({name})")?;
        }
        Ok(())
    }
}

type RegisterListener = Arc<dyn Fn(&Device) + Send + Sync>;

/// Event emitter owned by a driver instance.
///
/// Clones share the same listener list, so a driver can hand a clone to a
/// worker and still emit through the handle the loader subscribed to.
#[derive(Clone, Default)]
pub struct DriverEvents {
    register: Arc<Mutex<Vec<RegisterListener>>>,
}

impl DriverEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_register<F>(&self, listener: F)
    where
        F: Fn(&Device) + Send + Sync + 'static,
    {
        self.register.lock().push(Arc::new(listener));
    }

    /// Notify every `register` listener. Returns how many were called.
    pub fn emit_register(&self, device: &Device) -> usize {
        // Listeners may subscribe further listeners, so do not hold the lock.
        let listeners: Vec<_> = self.register.lock().iter().cloned().collect();
        for listener in &listeners {
            listener(device);
        }
        listeners.len()
    }

    pub fn register_listeners(&self) -> usize {
        self.register.lock().len()
    }
}

impl fmt::Debug for DriverEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverEvents")
            .field("register_listeners", &self.register_listeners())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn emit_reaches_listeners_on_every_clone() {
        let events = DriverEvents::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        events.on_register(move |device| sink.lock().push(device.guid.clone()));

        let worker = events.clone();
        assert_eq!(worker.emit_register(&Device::new("0101")), 1);
        assert_eq!(events.emit_register(&Device::new("0202")), 1);
        assert_eq!(*seen.lock(), vec!["0101".to_string(), "0202".to_string()]);
    }

    #[test]
    fn listener_may_subscribe_during_emit() {
        let events = DriverEvents::new();
        let nested = events.clone();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        events.on_register(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            nested.on_register(|_| {});
        });
        events.emit_register(&Device::new("a"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(events.register_listeners(), 2);
    }

    #[test]
    fn device_payload_omits_missing_fields() {
        let device = Device::new("1234").with_name("Lamp");
        let json = serde_json::to_string(&device).unwrap();
        assert_eq!(json, r#"{"guid":"1234","name":"Lamp"}"#);
        assert_eq!(device.to_string(), "1234 (Lamp)");
    }
}
