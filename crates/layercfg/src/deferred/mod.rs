//! deferred values
//!
//! A deferred value is a placeholder embedded in configuration data. It is resolved against the
//! [Configuration] it lives in the first time it is read:
//!
//! ```
//! use layercfg::{deferred, Config, Configuration, Map, Value};
//!
//! let mut data = Map::new();
//! data.insert("name".into(), "app".into());
//! data.insert("title".into(), deferred::get("name", Value::Null));
//!
//! let mut config = Config::from_map(data);
//! assert_eq!(config.get("title").unwrap(), Some("app".into()));
//! ```
//!
//! The functions in this module build the available variants and return them as [Value]s.
mod callback;
mod environment;
mod reference;

pub use callback::{Callback, CallbackFn};
pub use environment::{EnvDetermined, Environment, ProcessEnv};
pub use reference::{DefaultMap, DefaultMix, MapReference, Mix, Reference, Selection};

use crate::configuration::Configuration;
use crate::error::Result;
use crate::value::{Map, Value};
use std::sync::Arc;

/// Sentinel prefix marking lookups in [Mix] and [DefaultMix]
pub const DEFAULT_SYMBOL: &str = "@";

/// Produces a value given the configuration it is read from
pub trait Resolvable: std::fmt::Debug + Send + Sync {
    fn resolve(&self, config: &mut dyn Configuration) -> Result<Value>;
}

/// Shared handle to a [Resolvable]
#[derive(Clone)]
pub struct Deferred(Arc<dyn Resolvable>);

impl Deferred {
    pub fn new(resolvable: impl Resolvable + 'static) -> Self {
        Self(Arc::new(resolvable))
    }

    pub fn resolve(&self, config: &mut dyn Configuration) -> Result<Value> {
        self.0.resolve(config)
    }

    pub fn ptr_eq(&self, other: &Deferred) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Deferred {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Deferred").field(&self.0).finish()
    }
}

/// Value of `key`, or `default`
pub fn get(key: impl Into<String>, default: impl Into<Value>) -> Value {
    Deferred::new(Reference::new(key.into(), default.into())).into()
}

/// Value of `key.selection`, or `default`
pub fn select(
    key: impl Into<String>,
    selection: impl Into<String>,
    default: impl Into<Value>,
) -> Value {
    Deferred::new(Selection::new(key.into(), selection.into(), default.into())).into()
}

/// New map of `output key => value of source key`
pub fn map<K, S>(map: impl IntoIterator<Item = (K, S)>) -> Value
where
    K: Into<String>,
    S: Into<String>,
{
    let map = map.into_iter().map(|(k, s)| (k.into(), s.into())).collect();
    Deferred::new(MapReference::new(map)).into()
}

/// New map of `output key => value of source key, or default`
pub fn map_default<K, S, D>(map: impl IntoIterator<Item = (K, (S, D))>) -> Value
where
    K: Into<String>,
    S: Into<String>,
    D: Into<Value>,
{
    let map = map
        .into_iter()
        .map(|(k, (s, d))| (k.into(), (s.into(), d.into())))
        .collect();
    Deferred::new(DefaultMap::new(map)).into()
}

/// Map where string values starting with `symbol` are replaced by the value of the key they name
pub fn mix(map: Map, symbol: impl Into<String>) -> Value {
    Deferred::new(Mix::new(map, symbol.into())).into()
}

/// Map where entries keyed with a leading `symbol` are replaced by a lookup
///
/// See [DefaultMix] for the entry format.
pub fn mix_default(map: Map, symbol: impl Into<String>) -> Value {
    Deferred::new(DefaultMix::new(map, symbol.into())).into()
}

/// Result of calling `callback` with `args` and the configuration
pub fn call<F>(callback: F, args: Vec<Value>) -> Value
where
    F: Fn(&[Value], &mut dyn Configuration) -> Result<Value> + Send + Sync + 'static,
{
    Deferred::new(Callback::new(Arc::new(callback), args)).into()
}

/// `@default` context merged with the context named by `APP_ENV` (falling back to `production`)
pub fn env_determined(conditions: Map, env: Arc<dyn Environment>) -> Value {
    Deferred::new(EnvDetermined::new(conditions, env)).into()
}
