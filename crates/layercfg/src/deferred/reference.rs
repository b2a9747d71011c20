//! variants that look up other keys of the configuration they live in
use super::Resolvable;
use crate::configuration::Configuration;
use crate::error::Result;
use crate::key;
use crate::value::{Map, Value};
use indexmap::IndexMap;

/// Value of `key`, or `default`
#[derive(derive_new::new, Debug, Clone)]
pub struct Reference {
    key: String,
    default: Value,
}

impl Resolvable for Reference {
    fn resolve(&self, config: &mut dyn Configuration) -> Result<Value> {
        config.get_or(&self.key, self.default.clone())
    }
}

/// Value of `key.selection`, or `default`
///
/// `selection` is decided when the configuration is authored, for example from the environment.
#[derive(derive_new::new, Debug, Clone)]
pub struct Selection {
    key: String,
    selection: String,
    default: Value,
}

impl Resolvable for Selection {
    fn resolve(&self, config: &mut dyn Configuration) -> Result<Value> {
        config.get_or(&key::join(&self.key, &self.selection), self.default.clone())
    }
}

/// `output key => source key`, resolves to `output key => value of source key`
#[derive(derive_new::new, Debug, Clone)]
pub struct MapReference {
    map: IndexMap<String, String>,
}

impl Resolvable for MapReference {
    fn resolve(&self, config: &mut dyn Configuration) -> Result<Value> {
        let mut resolved = Map::with_capacity(self.map.len());
        for (output, source) in &self.map {
            resolved.insert(output.clone(), config.get_or(source, Value::Null)?);
        }

        Ok(Value::Object(resolved))
    }
}

/// `output key => (source key, default)`
#[derive(derive_new::new, Debug, Clone)]
pub struct DefaultMap {
    map: IndexMap<String, (String, Value)>,
}

impl Resolvable for DefaultMap {
    fn resolve(&self, config: &mut dyn Configuration) -> Result<Value> {
        let mut resolved = Map::with_capacity(self.map.len());
        for (output, (source, default)) in &self.map {
            resolved.insert(output.clone(), config.get_or(source, default.clone())?);
        }

        Ok(Value::Object(resolved))
    }
}

/// Literal map where string values starting with `symbol` name the key to look up
///
/// `{"host": "@db.host", "port": 5432}` resolves `host` and keeps `port`.
#[derive(derive_new::new, Debug, Clone)]
pub struct Mix {
    map: Map,
    symbol: String,
}

impl Resolvable for Mix {
    fn resolve(&self, config: &mut dyn Configuration) -> Result<Value> {
        let mut resolved = self.map.clone();
        for value in resolved.values_mut() {
            let Some(source) = value.as_str().and_then(|s| strip_symbol(s, &self.symbol)) else {
                continue;
            };

            *value = config.get_or(&source.to_string(), Value::Null)?;
        }

        Ok(Value::Object(resolved))
    }
}

/// Literal map where keys starting with `symbol` are lookups
///
/// A flagged entry is renamed without the symbol. Its value is either `[source key, default]` or
/// just the source key (default null). `{"@host": ["db.host", "localhost"], "port": 5432}` resolves
/// to `{"port": 5432, "host": <db.host or "localhost">}`.
#[derive(derive_new::new, Debug, Clone)]
pub struct DefaultMix {
    map: Map,
    symbol: String,
}

impl Resolvable for DefaultMix {
    fn resolve(&self, config: &mut dyn Configuration) -> Result<Value> {
        let mut resolved = Map::with_capacity(self.map.len());
        let mut lookups = vec![];

        for (entry, value) in &self.map {
            match strip_symbol(entry, &self.symbol) {
                Some(output) => lookups.push((output.to_string(), value)),
                None => {
                    resolved.insert(entry.clone(), value.clone());
                }
            }
        }

        for (output, value) in lookups {
            let lookup = match value {
                Value::String(source) => config.get_or(source, Value::Null)?,
                Value::Array(pair) => match pair.as_slice() {
                    [Value::String(source)] => config.get_or(source, Value::Null)?,
                    [Value::String(source), default, ..] => config.get_or(source, default.clone())?,
                    _ => value.clone(),
                },
                _ => value.clone(),
            };
            resolved.insert(output, lookup);
        }

        Ok(Value::Object(resolved))
    }
}

/// `value` without all leading `symbol`s, `None` when not flagged
fn strip_symbol<'v>(value: &'v str, symbol: &str) -> Option<&'v str> {
    if symbol.is_empty() || !value.starts_with(symbol) {
        return None;
    }

    Some(value.trim_start_matches(symbol))
}
