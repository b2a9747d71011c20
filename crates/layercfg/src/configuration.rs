//! The contract shared by [crate::Config], [crate::StackedConfig] and anything that wants to be a layer
use crate::error::Result;
use crate::value::{Map, Value};

/// Key/value access by delimited key path
///
/// All operations take `&mut self`: reads may load data lazily and populate caches.
pub trait Configuration {
    /// Whether a value is present at `key`
    fn has(&mut self, key: &str) -> Result<bool>;

    /// Resolved value at `key`, `None` when absent
    ///
    /// Never returns [Value::Deferred], containers are returned fully resolved.
    fn get(&mut self, key: &str) -> Result<Option<Value>>;

    /// Resolved value at `key` or `default`
    ///
    /// `default` is never remembered.
    fn get_or(&mut self, key: &str, default: Value) -> Result<Value> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()>;

    /// Fully resolved snapshot of everything available
    fn all(&mut self) -> Result<Map>;
}

impl<C: Configuration + ?Sized> Configuration for Box<C> {
    fn has(&mut self, key: &str) -> Result<bool> {
        (**self).has(key)
    }

    fn get(&mut self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn get_or(&mut self, key: &str, default: Value) -> Result<Value> {
        (**self).get_or(key, default)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        (**self).set(key, value)
    }

    fn all(&mut self) -> Result<Map> {
        (**self).all()
    }
}
