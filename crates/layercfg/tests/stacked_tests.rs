//! StackedConfig over file backed and in-memory layers

use layercfg::{deferred, Config, Configuration, Map, StackedConfig, Value};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn data(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(path)
}

fn memory(json: serde_json::Value) -> Config {
    let Value::Object(map) = Value::from(json) else {
        panic!("not an object");
    };
    Config::from_map(map)
}

fn object(json: serde_json::Value) -> Value {
    json.into()
}

/// overrides (memory) in front of the fixture directory
fn stack() -> StackedConfig {
    StackedConfig::default()
        .with(memory(serde_json::json!({
            "app": { "name": "override", "plugins": ["extra"] },
            "service": { "hosts": "c.internal" },
            "entry1": "not a map",
        })))
        .with(Config::new(data("config")).unwrap())
}

#[test]
fn merges_across_file_and_memory_layers() {
    let mut config = stack();

    assert_eq!(
        config.get("app").unwrap(),
        Some(object(serde_json::json!({
            "name": "override",
            "debug": true,
            "plugins": ["extra", "core"],
        })))
    );
    assert_eq!(
        config.get("service.hosts").unwrap(),
        Some(object(serde_json::json!(["c.internal", "a.internal", "b.internal"])))
    );
    assert_eq!(config.get("entry1").unwrap(), Some(Value::from("not a map")));
    assert_eq!(config.get("entry1.key1").unwrap(), Some(Value::from("val1")));
}

#[test]
fn private_layer_wins_and_isolates_writes() {
    let mut config = stack();

    config.set("app.name", "private".into()).unwrap();
    config.set("service.port", 9090.into()).unwrap();

    assert_eq!(config.get("app.name").unwrap(), Some(Value::from("private")));
    assert_eq!(config.get("service.port").unwrap(), Some(Value::Integer(9090)));

    assert_eq!(
        config.layer_mut(0).unwrap().get("app.name").unwrap(),
        Some(Value::from("override"))
    );
    assert_eq!(
        config.layer_mut(1).unwrap().get("service.port").unwrap(),
        Some(Value::Integer(8080))
    );
    assert!(!config.layer_mut(0).unwrap().has("service.port").unwrap());
}

#[test]
fn all_is_a_deep_merge_by_priority() {
    let mut config = stack();
    let all = config.all().unwrap();

    assert_eq!(
        all["app"],
        object(serde_json::json!({ "name": "override", "debug": true, "plugins": ["extra"] }))
    );
    assert_eq!(
        all["service"],
        object(serde_json::json!({ "port": 8080, "hosts": "c.internal" }))
    );
    assert_eq!(all["entry1"], Value::from("not a map"));
    assert_eq!(
        all["entry2"],
        object(serde_json::json!({ "name": "entry two", "nested": { "enabled": true, "tags": ["blue", "green"] } }))
    );
}

#[test]
fn deferred_values_in_layers() {
    let mut defaults = Map::new();
    defaults.insert("host".into(), "localhost".into());
    defaults.insert(
        "dsn".into(),
        deferred::mix(
            [("host", Value::from("@host")), ("port", 5432.into())]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            deferred::DEFAULT_SYMBOL,
        ),
    );

    let mut config = StackedConfig::default()
        .with(memory(serde_json::json!({ "dsn": { "user": "admin" } })))
        .with(Config::from_map(defaults));

    assert_eq!(
        config.get("dsn").unwrap(),
        Some(object(serde_json::json!({
            "user": "admin",
            "host": "localhost",
            "port": 5432,
        })))
    );
}
