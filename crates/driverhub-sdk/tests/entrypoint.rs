use std::sync::Arc;

use driverhub_sdk::prelude::*;
use driverhub_sdk::{declare_driverhub_drivers, HostApp, VersionCallback};
use pretty_assertions::assert_eq;
use serde_json::json;

struct Lamp {
    events: DriverEvents,
}

impl Driver for Lamp {
    fn events(&self) -> &DriverEvents {
        &self.events
    }
}

fn lamp(ctx: DriverContext) -> Result<Box<dyn Driver>, DriverError> {
    let brightness = ctx
        .config
        .get("brightness")
        .and_then(|value| value.as_u64())
        .ok_or_else(|| DriverError::InvalidConfig("brightness missing".into()))?;
    ctx.log.info(format_args!("lamp starting at {brightness}"));
    Ok(Box::new(Lamp {
        events: DriverEvents::new(),
    }))
}

fn fan(_ctx: DriverContext) -> Result<Box<dyn Driver>, DriverError> {
    Err(DriverError::Init("no fan attached".into()))
}

declare_driverhub_drivers!("lamp" => lamp, "fan" => fan);

fn context(config: DriverConfig) -> DriverContext {
    let app = Arc::new(HostApp::default());
    let log = app.log().extend("Driver").extend("lamp");
    DriverContext {
        name: "lamp".into(),
        config,
        app,
        log,
        version: VersionCallback::noop(),
    }
}

#[test]
fn entrypoint_exports_every_declared_factory() {
    let module = driverhub_driver_entrypoint().into_module();
    assert_eq!(module.names().collect::<Vec<_>>(), vec!["fan", "lamp"]);
    assert!(module.sole_factory().is_none());

    let factory = module.factory("lamp").unwrap();
    let driver = factory.create(context(json!({"brightness": 70}))).unwrap();
    assert_eq!(driver.events().register_listeners(), 0);

    let err = factory.create(context(json!({}))).err().unwrap();
    assert_eq!(err.to_string(), "invalid driver configuration: brightness missing");
    assert!(module
        .factory("fan")
        .unwrap()
        .create(context(json!({})))
        .is_err());
}

#[test]
fn cloned_emitter_reaches_driver_listeners() {
    let driver = lamp(context(json!({"brightness": 40}))).unwrap();
    driver.events().on_register(|_| {});
    let worker = driver.events().clone();
    assert_eq!(worker.emit_register(&Device::new("lamp-1")), 1);
}
