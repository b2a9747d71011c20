//! value representation
//!
//! The layercfg data model contains the following data types
//! - null
//! - boolean (true/false)
//! - integer (signed, i64)
//! - decimal (f64)
//! - string (utf-8)
//! - array ("list" of values)
//! - object (order-preserving "map"/"dictionary", where the key is of type string)
//! - deferred (a placeholder that produces one of the above when read, see [crate::deferred])
//!
//! Integers that do not fit an i64 are read as decimals.
//!
use crate::deferred::Deferred;
use crate::key;
use serde::{
    ser::{Error as _, SerializeMap, SerializeSeq},
    Serializer,
};

/// Order-preserving string keyed map of values
pub type Map = indexmap::IndexMap<String, Value>;

/// All possible value types
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
    Array(Vec<Value>),
    Object(Map),
    Deferred(Deferred),
}

impl Value {
    /// Anything that is neither a container nor deferred
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            Value::Array(_) | Value::Object(_) | Value::Deferred(_)
        )
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Value::Deferred(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Recursively merge `overlay` on top of `self`
    ///
    /// Objects merge key by key, anything else is replaced by `overlay`.
    pub fn deep_merge(self, overlay: Value) -> Value {
        match (self, overlay) {
            (Value::Object(base), Value::Object(overlay)) => Value::Object(merge_maps(base, overlay)),
            (_, overlay) => overlay,
        }
    }

    /// Node at `path`, walking objects by key and arrays by index
    pub(crate) fn lookup<'v, 'k>(
        &'v self,
        mut path: impl Iterator<Item = &'k str>,
    ) -> Option<&'v Value> {
        let Some(segment) = path.next() else {
            return Some(self);
        };

        match self {
            Value::Object(object) => object.get(segment)?.lookup(path),
            Value::Array(array) => array.get(segment.parse::<usize>().ok()?)?.lookup(path),
            _ => None,
        }
    }

    /// Write `value` at `path` below `self`, creating objects on the way
    ///
    /// Scalars in the way are replaced with objects. Arrays are indexed when the segment is a valid
    /// index, otherwise they are converted into an object keyed by their indices.
    pub(crate) fn insert(&mut self, path: &[&str], value: Value) {
        let Some((segment, rest)) = path.split_first() else {
            *self = value;
            return;
        };

        if let Value::Array(array) = self {
            if let Some(element) = segment
                .parse::<usize>()
                .ok()
                .and_then(|index| array.get_mut(index))
            {
                element.insert(rest, value);
                return;
            }

            let indexed = std::mem::take(array)
                .into_iter()
                .enumerate()
                .map(|(index, element)| (index.to_string(), element))
                .collect();
            *self = Value::Object(indexed);
        }

        if !matches!(self, Value::Object(_)) {
            *self = Value::Object(Map::new());
        }

        let Value::Object(object) = self else {
            unreachable!("converted to object above");
        };

        object
            .entry(segment.to_string())
            .or_default()
            .insert(rest, value);
    }
}

/// [Value::deep_merge] for two maps
pub fn merge_maps(mut base: Map, overlay: Map) -> Map {
    for (entry, value) in overlay {
        match base.get_mut(&entry) {
            Some(existing) => *existing = std::mem::take(existing).deep_merge(value),
            None => {
                base.insert(entry, value);
            }
        }
    }

    base
}

/// Write `value` at the dotted `path` of a root map
pub(crate) fn insert_path(root: &mut Map, path: &str, value: Value) {
    let segments: Vec<&str> = key::segments(path).collect();
    let Some((first, rest)) = segments.split_first() else {
        return;
    };

    root.entry(first.to_string()).or_default().insert(rest, value);
}

/// Node at the dotted `path` of a root map
pub(crate) fn lookup_path<'m>(root: &'m Map, path: &str) -> Option<&'m Value> {
    let mut segments = key::segments(path);
    root.get(segments.next()?)?.lookup(segments)
}

/// Deferred node strictly above the dotted `path`, with its own key path
pub(crate) fn deferred_ancestor(root: &Map, path: &str) -> Option<(String, Deferred)> {
    let segments: Vec<&str> = key::segments(path).collect();
    let (first, rest) = segments.split_first()?;

    let mut node = root.get(*first)?;
    for (depth, segment) in rest.iter().enumerate() {
        node = match node {
            Value::Deferred(deferred) => {
                return Some((segments[..=depth].join("."), deferred.clone()))
            }
            Value::Object(object) => object.get(*segment)?,
            Value::Array(array) => array.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    None
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Deferred(a), Value::Deferred(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Self::Object(value)
    }
}

impl From<Deferred> for Value {
    fn from(value: Deferred) -> Self {
        Self::Deferred(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Object(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match value {
            Json::Null => Value::Null,
            Json::Bool(b) => b.into(),
            Json::Number(n) => match n.as_i64() {
                Some(int) => Value::Integer(int),
                None => Value::Decimal(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => s.into(),
            Json::Array(a) => a.into(),
            Json::Object(o) => o.into_iter().collect(),
        }
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value as Yaml;

        match value {
            Yaml::Null => Value::Null,
            Yaml::Bool(b) => b.into(),
            Yaml::Number(n) => match n.as_i64() {
                Some(int) => Value::Integer(int),
                None => Value::Decimal(n.as_f64().unwrap_or(f64::NAN)),
            },
            Yaml::String(s) => s.into(),
            Yaml::Sequence(s) => s.into(),
            Yaml::Mapping(m) => m
                .into_iter()
                .map(|(k, v)| (yaml_key(k), Value::from(v)))
                .collect(),
            Yaml::Tagged(tagged) => tagged.value.into(),
        }
    }
}

/// Mapping keys may be any yaml value; non-strings are keyed by their rendering
fn yaml_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => s,
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl From<hcl::Number> for Value {
    fn from(value: hcl::Number) -> Self {
        if let Some(int) = value.as_i64() {
            return Value::Integer(int);
        }

        Value::Decimal(value.as_f64().unwrap_or(f64::NAN))
    }
}

impl From<hcl::Value> for Value {
    fn from(value: hcl::Value) -> Value {
        match value {
            hcl::Value::Null => Value::Null,
            hcl::Value::Bool(b) => b.into(),
            hcl::Value::Number(n) => n.into(),
            hcl::Value::String(s) => s.into(),
            hcl::Value::Array(a) => a.into(),
            hcl::Value::Object(o) => o.into_iter().collect(),
        }
    }
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(value) => serializer.serialize_bool(*value),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Decimal(value) => serializer.serialize_f64(*value),
            Value::String(value) => serializer.serialize_str(value),
            Value::Array(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
            Value::Object(value) => {
                let mut ser = serializer.serialize_map(Some(value.len()))?;
                for (element_key, element_value) in value {
                    ser.serialize_entry(element_key, element_value)?;
                }
                ser.end()
            }
            Value::Deferred(deferred) => Err(S::Error::custom(format!(
                "unresolved deferred value {deferred:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn object(json: serde_json::Value) -> Value {
        json.into()
    }

    #[test]
    fn deep_merge_replaces_lists_and_scalars() {
        let base = object(serde_json::json!({
            "server": { "host": "localhost", "port": 8080 },
            "plugins": ["a", "b"],
        }));
        let overlay = object(serde_json::json!({
            "server": { "port": 9000 },
            "plugins": ["c"],
        }));

        assert_eq!(
            base.deep_merge(overlay),
            object(serde_json::json!({
                "server": { "host": "localhost", "port": 9000 },
                "plugins": ["c"],
            }))
        );
    }

    #[test]
    fn insert_creates_and_replaces() {
        let mut root = Map::new();
        insert_path(&mut root, "a.b.c", 1.into());
        insert_path(&mut root, "a.b.d", 2.into());
        assert_eq!(
            Value::Object(root.clone()),
            object(serde_json::json!({ "a": { "b": { "c": 1, "d": 2 } } }))
        );

        // scalar in the way
        insert_path(&mut root, "a.b.c.x", "deep".into());
        assert_eq!(
            lookup_path(&root, "a.b.c"),
            Some(&object(serde_json::json!({ "x": "deep" })))
        );
    }

    #[test]
    fn insert_into_arrays() {
        let mut root: Map = [("list".to_string(), Value::from(vec!["a", "b"]))].into();

        insert_path(&mut root, "list.1", "B".into());
        assert_eq!(root["list"], Value::from(vec!["a", "B"]));

        insert_path(&mut root, "list.key", "v".into());
        assert_eq!(
            root["list"],
            object(serde_json::json!({ "0": "a", "1": "B", "key": "v" }))
        );
    }

    #[test]
    fn lookup_walks_arrays_by_index() {
        let root = object(serde_json::json!({ "servers": [{ "host": "one" }, { "host": "two" }] }));
        let Value::Object(root) = root else {
            unreachable!()
        };

        assert_eq!(lookup_path(&root, "servers.1.host"), Some(&"two".into()));
        assert_eq!(lookup_path(&root, "servers.2.host"), None);
        assert_eq!(lookup_path(&root, "servers.x"), None);
    }

    #[test]
    fn deferred_ancestors() {
        let deferred = crate::deferred::get("other", Value::Null);
        let Value::Deferred(handle) = deferred.clone() else {
            unreachable!()
        };

        let mut root = Map::new();
        insert_path(&mut root, "a.list", vec![Value::Null, deferred.clone()].into());
        insert_path(&mut root, "a.plain", "x".into());
        root.insert("top".into(), deferred);

        let (key, found) = deferred_ancestor(&root, "a.list.1.inner").unwrap();
        assert_eq!(key, "a.list.1");
        assert!(found.ptr_eq(&handle));

        assert_eq!(deferred_ancestor(&root, "top.x.y").map(|(key, _)| key), Some("top".into()));

        // the deferred node itself, plain paths and dead ends
        assert!(deferred_ancestor(&root, "top").is_none());
        assert!(deferred_ancestor(&root, "a.list.1").is_none());
        assert!(deferred_ancestor(&root, "a.plain.x").is_none());
        assert!(deferred_ancestor(&root, "missing.x").is_none());
    }

    #[test]
    fn yaml_keys_are_stringified() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("1: one\ntrue: yes\nkey: [1, 2.5]").unwrap();
        assert_eq!(
            Value::from(yaml),
            object(serde_json::json!({ "1": "one", "true": "yes", "key": [1, 2.5] }))
        );
    }

    #[test]
    fn serializes_like_json() {
        let value = object(serde_json::json!({ "a": [1, null, "x"], "b": { "c": true } }));
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"a":[1,null,"x"],"b":{"c":true}}"#
        );
    }
}
