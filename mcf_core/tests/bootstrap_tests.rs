//! Building the shared state from a machine definition file.

use std::fs;
use std::path::Path;

use mcf_core::prelude::*;
use tempfile::TempDir;

fn write_machine_toml(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("machine.toml");
    fs::write(&path, body).unwrap();
    path
}

const CELL: &str = r#"
[shared]
log_level = "debug"
service_name = "cell-01"

[[templates]]
name = "axis"
description = "Linear axis"

[[templates.groups]]
name = "motion"
description = "Motion profile"
parameters = [
    { name = "speed", type = "double", default = "25.0" },
    { name = "homed", type = "bool" },
]

[[templates.groups]]
name = "identity"
parameters = [{ name = "serial", type = "uuid" }]

[[instances]]
name = "axis1"
template = "axis"

[[instances]]
name = "laser1"
description = "Fiber laser"

[[instances.groups]]
name = "optics"
parameters = [{ name = "power", type = "int", default = "800" }]

[[instances.signals]]
name = "StartJob"
parameters = [{ name = "jobId", type = "string" }]
results = [{ name = "accepted", type = "bool" }]
"#;

#[test]
fn load_builds_registry_and_signals() {
    let dir = TempDir::new().unwrap();
    let path = write_machine_toml(dir.path(), CELL);

    let state = SystemState::load(&path).unwrap();
    assert_eq!(state.registry.instance_names(), vec!["axis1", "laser1"]);
    assert_eq!(state.registry.resolve_value("axis1.motion.speed").unwrap(), "25");
    assert_eq!(state.registry.resolve_value("axis1.motion.homed").unwrap(), "0");
    assert_eq!(
        state.registry.resolve_value("axis1.identity.serial").unwrap(),
        "00000000-0000-0000-0000-000000000000"
    );
    assert_eq!(state.registry.resolve_value("laser1.optics.power").unwrap(), "800");
    assert_eq!(state.registry.resolve_value("laser1.$state").unwrap(), "");
    assert_eq!(
        state.registry.parameter_handler("laser1").unwrap().description(),
        "Fiber laser"
    );

    let def = state.signals.signal_definition("laser1", "StartJob").unwrap();
    assert_eq!(def.parameters[0].name, "jobId");
    assert_eq!(state.signals.signal_names("laser1"), vec!["StartJob"]);
    assert!(state.signals.signal_names("axis1").is_empty());
}

#[test]
fn missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        SystemState::load(&dir.path().join("absent.toml")),
        Err(ConfigError::FileNotFound)
    ));
}

#[test]
fn invalid_instance_name_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_machine_toml(
        dir.path(),
        r#"
[shared]
service_name = "cell"

[[instances]]
name = "axis.1"
"#,
    );
    assert!(matches!(
        SystemState::load(&path),
        Err(ConfigError::ValidationError(msg)) if msg.contains("axis.1")
    ));
}

#[test]
fn duplicate_signal_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_machine_toml(
        dir.path(),
        r#"
[shared]
service_name = "cell"

[[instances]]
name = "laser1"
signals = [{ name = "Stop" }, { name = "Stop" }]
"#,
    );
    assert!(matches!(
        SystemState::load(&path),
        Err(ConfigError::ValidationError(msg)) if msg.contains("laser1/Stop")
    ));
}

#[test]
fn unknown_parameter_type_fails_parsing() {
    let dir = TempDir::new().unwrap();
    let path = write_machine_toml(
        dir.path(),
        r#"
[shared]
service_name = "cell"

[[instances]]
name = "laser1"

[[instances.groups]]
name = "optics"
parameters = [{ name = "power", type = "watts" }]
"#,
    );
    assert!(matches!(SystemState::load(&path), Err(ConfigError::ParseError(_))));
}

#[test]
fn derived_parameter_mirrors_other_instance() {
    let dir = TempDir::new().unwrap();
    let path = write_machine_toml(
        dir.path(),
        r#"
[shared]
service_name = "cell"

[[instances]]
name = "laser1"

[[instances.groups]]
name = "optics"
parameters = [{ name = "power", type = "int", default = "800" }]

[[instances]]
name = "hmi"

[[instances.groups]]
name = "display"
derived = [{ name = "laser_power", instance = "laser1", group = "optics", parameter = "power" }]
"#,
    );
    let state = SystemState::load(&path).unwrap();
    let optics = state
        .registry
        .parameter_handler("laser1")
        .unwrap()
        .require_group("optics")
        .unwrap();
    optics.set_int_value_by_name("power", 650).unwrap();
    assert_eq!(state.registry.resolve_value("hmi.display.laser_power").unwrap(), "650");

    let display = state
        .registry
        .parameter_handler("hmi")
        .unwrap()
        .require_group("display")
        .unwrap();
    let info = display.parameter_info_by_name("laser_power").unwrap();
    assert_eq!(info.source.as_deref(), Some("optics.power"));
    assert!(matches!(
        display.set_int_value_by_name("laser_power", 1),
        Err(CoreError::DerivedParameterReadOnly(_))
    ));
}

#[test]
fn malformed_signal_name_is_reported_with_instance() {
    let dir = TempDir::new().unwrap();
    let path = write_machine_toml(
        dir.path(),
        r#"
[shared]
service_name = "cell"

[[instances]]
name = "laser1"
signals = [{ name = "Start Job" }]
"#,
    );
    assert!(matches!(
        SystemState::load(&path),
        Err(ConfigError::ValidationError(msg)) if msg.contains("laser1/Start Job")
    ));
}
