//! multiple configurations as one
//!
//! A [StackedConfig] queries an ordered list of layers, the first layer having the highest priority.
//! By default a private, empty [Config] sits in front of all layers and receives every `set`, so the
//! stacked layers are never written to.
//!
//! ### Merging
//!
//! `get` collects the value of the key from every layer that has it and combines them by shape:
//!
//! | contributed values                | result                                                 |
//! |-----------------------------------|--------------------------------------------------------|
//! | at least one list, no map         | concatenation in priority order, scalars as `[scalar]` |
//! | only maps                         | merged map, every entry merged again the same way      |
//! | anything else                     | value of the first layer                               |
//!
//! `all` instead deep merges the complete data of all layers: maps merge, the highest priority
//! layer wins for everything else.
use crate::config::Config;
use crate::configuration::Configuration;
use crate::error::{Error, Result};
use crate::key;
use crate::value::{self, Map, Value};

/// Nested map merging gives up at this depth
pub const MAX_MERGE_DEPTH: usize = 64;

pub struct StackedConfig {
    /// Private writable layer in front of the stack
    base: Option<Config>,
    stack: Vec<Box<dyn Configuration>>,
}

enum Mode {
    Lists,
    Maps,
    First,
}

impl StackedConfig {
    /// Stack with a private writable layer in front
    pub fn new(stack: Vec<Box<dyn Configuration>>) -> Self {
        Self {
            base: Some(Config::default()),
            stack,
        }
    }

    /// Stack without a private layer, `set` writes into the first layer
    pub fn baseless(stack: Vec<Box<dyn Configuration>>) -> Self {
        Self { base: None, stack }
    }

    /// Append a layer with lower priority than all existing ones
    pub fn push(&mut self, layer: impl Configuration + 'static) {
        self.stack.push(Box::new(layer));
    }

    pub fn with(mut self, layer: impl Configuration + 'static) -> Self {
        self.push(layer);
        self
    }

    /// The private writable layer, `None` for baseless stacks
    pub fn base_mut(&mut self) -> Option<&mut Config> {
        self.base.as_mut()
    }

    /// Layer by position in the stack, not counting the private layer
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut (dyn Configuration + 'static)> {
        self.stack.get_mut(index).map(|layer| layer.as_mut())
    }

    /// Number of layers, not counting the private layer
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// All layers in priority order, including the private layer
    fn layers_mut(&mut self) -> impl Iterator<Item = &mut (dyn Configuration + 'static)> + '_ {
        let base = self
            .base
            .as_mut()
            .map(|base| base as &mut (dyn Configuration + 'static));

        base.into_iter()
            .chain(self.stack.iter_mut().map(|layer| layer.as_mut()))
    }

    #[tracing::instrument(level = "trace", skip(self))]
    fn merged(&mut self, key: &str, depth: usize) -> Result<Option<Value>> {
        if depth > MAX_MERGE_DEPTH {
            return Err(Error::CyclicResolution {
                key: key.to_string(),
            });
        }

        let mut found = vec![];
        for layer in self.layers_mut() {
            if !layer.has(key)? {
                continue;
            }

            if let Some(value) = layer.get(key)? {
                found.push(value);
            }
        }

        let Some(mode) = Mode::of(&found) else {
            return Ok(None);
        };

        let merged = match mode {
            Mode::Lists => Value::Array(
                found
                    .into_iter()
                    .flat_map(|value| match value {
                        Value::Array(list) => list,
                        other => vec![other],
                    })
                    .collect(),
            ),
            Mode::Maps => {
                let raw = found
                    .into_iter()
                    .rev()
                    .filter_map(|value| match value {
                        Value::Object(map) => Some(map),
                        _ => None,
                    })
                    .fold(Map::new(), |mut merged, layer| {
                        merged.extend(layer);
                        merged
                    });

                let mut resolved = Map::with_capacity(raw.len());
                for (entry, raw_value) in raw {
                    let value = self
                        .merged(&key::join(key, &entry), depth + 1)?
                        .unwrap_or(raw_value);
                    resolved.insert(entry, value);
                }

                Value::Object(resolved)
            }
            Mode::First => found.swap_remove(0),
        };

        Ok(Some(merged))
    }
}

impl Mode {
    /// `None` when nothing was found
    fn of(found: &[Value]) -> Option<Mode> {
        if found.is_empty() {
            return None;
        }

        let lists = found.iter().filter(|v| matches!(v, Value::Array(_))).count();
        let maps = found.iter().filter(|v| matches!(v, Value::Object(_))).count();

        Some(if lists > 0 && maps == 0 {
            Mode::Lists
        } else if maps == found.len() {
            Mode::Maps
        } else {
            Mode::First
        })
    }
}

impl Configuration for StackedConfig {
    fn has(&mut self, key: &str) -> Result<bool> {
        for layer in self.layers_mut() {
            if layer.has(key)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn get(&mut self, key: &str) -> Result<Option<Value>> {
        self.merged(key, 0)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        match self.layers_mut().next() {
            Some(layer) => layer.set(key, value),
            None => Err(Error::ReadOnly),
        }
    }

    fn all(&mut self) -> Result<Map> {
        let mut layers = vec![];
        for layer in self.layers_mut() {
            layers.push(layer.all()?);
        }

        Ok(layers
            .into_iter()
            .rev()
            .fold(Map::new(), value::merge_maps))
    }
}

impl Default for StackedConfig {
    fn default() -> Self {
        Self::new(vec![])
    }
}

impl std::fmt::Debug for StackedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackedConfig")
            .field("base", &self.base)
            .field("layers", &self.stack.len())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn layer(json: serde_json::Value) -> Box<dyn Configuration> {
        let Value::Object(map) = Value::from(json) else {
            panic!("not an object");
        };
        Box::new(Config::from_map(map))
    }

    fn stack(layers: Vec<serde_json::Value>) -> StackedConfig {
        StackedConfig::new(layers.into_iter().map(layer).collect())
    }

    fn object(json: serde_json::Value) -> Value {
        json.into()
    }

    #[test]
    fn scalars_and_lists_concatenate() {
        let mut config = stack(vec![
            serde_json::json!({ "base": "s" }),
            serde_json::json!({ "base": ["l"] }),
            serde_json::json!({ "base": "t" }),
        ]);

        assert_eq!(
            config.get("base").unwrap(),
            Some(object(serde_json::json!(["s", "l", "t"])))
        );
    }

    #[test]
    fn duplicates_are_kept() {
        let mut config = stack(vec![
            serde_json::json!({ "plugins": ["a", "b"] }),
            serde_json::json!({ "plugins": ["b", "c"] }),
        ]);

        assert_eq!(
            config.get("plugins").unwrap(),
            Some(object(serde_json::json!(["a", "b", "b", "c"])))
        );
    }

    #[test]
    fn maps_merge_deep() {
        let mut config = stack(vec![
            serde_json::json!({ "base": { "k2": "a", "list": "x" } }),
            serde_json::json!({ "base": { "k2": "b", "k3": "c", "list": ["y", "z"] } }),
            serde_json::json!({ "base": { "k1": "d", "k2": "e", "k3": "f", "list": ["p", "q", "r"] } }),
        ]);

        let merged = config.get("base").unwrap().unwrap();
        assert_eq!(
            merged,
            object(serde_json::json!({
                "k1": "d",
                "k2": "a",
                "k3": "c",
                "list": ["x", "y", "z", "p", "q", "r"],
            }))
        );

        // lowest priority layer introduces keys first
        let keys: Vec<&String> = merged.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["k1", "k2", "k3", "list"]);
    }

    #[test]
    fn maps_of_different_depths() {
        let mut config = stack(vec![
            serde_json::json!({ "db": { "primary": { "host": "override" } } }),
            serde_json::json!({ "db": { "primary": { "host": "default", "port": 5432 }, "pool": 4 } }),
        ]);

        assert_eq!(
            config.get("db").unwrap(),
            Some(object(serde_json::json!({
                "primary": { "host": "override", "port": 5432 },
                "pool": 4,
            })))
        );
    }

    #[test]
    fn mixed_shapes_take_first() {
        let mut config = stack(vec![
            serde_json::json!({ "base": "first" }),
            serde_json::json!({ "base": { "key1": "map" } }),
            serde_json::json!({ "base": ["list"] }),
        ]);
        assert_eq!(config.get("base").unwrap(), Some("first".into()));

        let mut config = stack(vec![
            serde_json::json!({ "base": { "key1": "map" } }),
            serde_json::json!({ "base": "scalar" }),
        ]);
        assert_eq!(
            config.get("base").unwrap(),
            Some(object(serde_json::json!({ "key1": "map" })))
        );
    }

    #[test]
    fn empty_list_and_empty_map_are_distinct() {
        let mut config = stack(vec![
            serde_json::json!({ "base": [] }),
            serde_json::json!({ "base": "x" }),
        ]);
        assert_eq!(config.get("base").unwrap(), Some(object(serde_json::json!(["x"]))));

        let mut config = stack(vec![
            serde_json::json!({ "base": {} }),
            serde_json::json!({ "base": { "k": "v" } }),
        ]);
        assert_eq!(
            config.get("base").unwrap(),
            Some(object(serde_json::json!({ "k": "v" })))
        );
    }

    #[test]
    fn missing_keys_use_default() {
        let mut config = stack(vec![serde_json::json!({ "a": 1 })]);

        assert!(!config.has("b").unwrap());
        assert_eq!(config.get("b").unwrap(), None);
        assert_eq!(config.get_or("b", "fallback".into()).unwrap(), Value::from("fallback"));
        assert_eq!(config.get_or("b", Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn set_only_writes_private_layer() {
        let mut config = stack(vec![
            serde_json::json!({ "a": 1 }),
            serde_json::json!({ "a": 2, "b": 3 }),
        ]);

        config.set("a", 10.into()).unwrap();
        config.set("c", "new".into()).unwrap();

        assert_eq!(config.get("a").unwrap(), Some(10.into()));
        assert_eq!(config.get("c").unwrap(), Some("new".into()));

        assert_eq!(config.layer_mut(0).unwrap().get("a").unwrap(), Some(1.into()));
        assert!(!config.layer_mut(0).unwrap().has("c").unwrap());
        assert!(!config.layer_mut(1).unwrap().has("c").unwrap());
        assert_eq!(
            config.base_mut().unwrap().get("c").unwrap(),
            Some("new".into())
        );
    }

    #[test]
    fn baseless_writes_first_layer() {
        let mut config = StackedConfig::baseless(vec![
            layer(serde_json::json!({ "a": 1 })),
            layer(serde_json::json!({ "a": 2 })),
        ]);

        config.set("a", 10.into()).unwrap();
        assert!(config.base_mut().is_none());
        assert_eq!(config.layer_mut(0).unwrap().get("a").unwrap(), Some(10.into()));
        assert_eq!(config.layer_mut(1).unwrap().get("a").unwrap(), Some(2.into()));

        assert_eq!(
            StackedConfig::baseless(vec![]).set("a", 1.into()),
            Err(Error::ReadOnly)
        );
    }

    #[test]
    fn all_prioritizes_by_order_added() {
        let mut config = stack(vec![
            serde_json::json!({ "shared1": "one", "nested": { "a": 1, "list": [1] } }),
            serde_json::json!({ "shared1": "two", "shared2": "two", "nested": { "b": 2, "list": [2, 3] } }),
            serde_json::json!({ "shared2": "three" }),
        ]);

        assert_eq!(
            Value::Object(config.all().unwrap()),
            object(serde_json::json!({
                "shared1": "one",
                "shared2": "two",
                "nested": { "a": 1, "b": 2, "list": [1] },
            }))
        );
    }

    /// `{"k0": {"k1": ... {"k<depth - 1>": leaf}}}`
    fn nested(depth: usize, leaf: &str) -> Map {
        let Value::Object(map) = (0..depth)
            .rev()
            .fold(Value::from(leaf), |inner, level| {
                [(format!("k{level}"), inner)].into_iter().collect()
            })
        else {
            unreachable!()
        };
        map
    }

    #[test]
    fn merging_too_deep_maps_fails() {
        let mut config = StackedConfig::default()
            .with(Config::from_map(nested(MAX_MERGE_DEPTH + 6, "first")))
            .with(Config::from_map(nested(MAX_MERGE_DEPTH + 6, "second")));

        assert!(matches!(
            config.get("k0"),
            Err(Error::CyclicResolution { .. })
        ));

        let mut config = StackedConfig::default()
            .with(Config::from_map(nested(10, "first")))
            .with(Config::from_map(nested(10, "second")));

        assert_eq!(
            config.get("k0").unwrap().as_ref(),
            nested(10, "first").get("k0")
        );
    }

    #[test]
    fn stacks_nest() {
        let inner = stack(vec![
            serde_json::json!({ "list": ["inner"] }),
        ]);
        let mut outer = StackedConfig::default()
            .with(inner)
            .with(Config::from_map(
                [("list".to_string(), Value::from(vec!["outer"]))].into(),
            ));

        assert_eq!(
            outer.get("list").unwrap(),
            Some(object(serde_json::json!(["inner", "outer"])))
        );
    }

    #[test]
    fn deferred_values_resolve_within_their_layer() {
        let mut first = Config::default();
        first
            .set("greeting", crate::deferred::get("name", "nobody"))
            .unwrap();
        let mut second = Config::default();
        second.set("name", "second".into()).unwrap();

        let mut config = StackedConfig::default().with(first).with(second);
        config.set("name", "private".into()).unwrap();

        assert_eq!(config.get("greeting").unwrap(), Some("nobody".into()));
        assert_eq!(config.get("name").unwrap(), Some("private".into()));
    }
}
