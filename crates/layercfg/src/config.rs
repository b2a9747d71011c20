//! single source resolver
//!
//! [Config] owns two structures:
//! - the store: the raw data as provided or loaded from files, deferred values included
//! - the cache: a flat map of full key path to the resolved value
//!
//! Only scalars are cached. Containers are rebuilt from the store on every read, their leaves come
//! from the cache where present. Writing into a container therefore never leaves a stale copy of it
//! behind. Deferred values are resolved when read; the resolved value goes to the cache while the
//! store keeps the deferred value.
use crate::configuration::Configuration;
use crate::deferred::Deferred;
use crate::error::{Error, Result};
use crate::key;
use crate::parser::Parsers;
use crate::source::{self, BaseFile, Source};
use crate::value::{self, Map, Value};
use indexmap::{IndexMap, IndexSet};
use std::path::{Path, PathBuf};

/// Deferred values resolving deferred values resolving ... gives up at this depth
pub const MAX_RESOLUTION_DEPTH: usize = 64;

#[derive(Debug, Clone)]
enum Origin {
    Memory,
    File(PathBuf),
    Directory(PathBuf),
}

#[derive(Debug)]
pub struct Config {
    origin: Origin,
    parsers: Parsers,

    /// Raw data
    store: Map,

    /// Resolved scalars by full key path
    cache: Map,

    /// Directory bases that have been loaded
    loaded: IndexSet<String>,

    /// Directory bases that failed to load. Never retried.
    failed: IndexMap<String, Error>,

    /// Keys whose deferred values are currently being resolved
    resolving: Vec<String>,
}

impl Config {
    /// Config from a [Map] or a path to a file or directory
    pub fn new(source: impl Into<Source>) -> Result<Self> {
        Self::with_parsers(source, Parsers::default())
    }

    pub fn with_parsers(source: impl Into<Source>, parsers: Parsers) -> Result<Self> {
        let (origin, store) = match source.into() {
            Source::Map(map) => (Origin::Memory, map),
            Source::Path(path) if path.is_file() => {
                let store = source::load_root_file(&path, &parsers)?;
                (Origin::File(path), store)
            }
            Source::Path(path) if path.is_dir() => (Origin::Directory(path), Map::new()),
            Source::Path(path) => return Err(Error::InvalidSource(path)),
        };

        Ok(Self {
            origin,
            parsers,
            store,
            cache: Default::default(),
            loaded: Default::default(),
            failed: Default::default(),
            resolving: Default::default(),
        })
    }

    pub fn from_map(map: Map) -> Self {
        Self {
            origin: Origin::Memory,
            parsers: Parsers::default(),
            store: map,
            cache: Default::default(),
            loaded: Default::default(),
            failed: Default::default(),
            resolving: Default::default(),
        }
    }

    /// Backing file or directory
    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            Origin::Memory => None,
            Origin::File(path) | Origin::Directory(path) => Some(path),
        }
    }

    /// Whether data for `base` is available without touching the file system
    pub fn is_loaded(&self, base: &str) -> bool {
        match self.origin {
            Origin::Directory(_) => self.loaded.contains(base),
            Origin::Memory | Origin::File(_) => true,
        }
    }

    /// Raw data as loaded so far
    pub fn stored(&self) -> &Map {
        &self.store
    }

    pub fn cached(&self) -> &Map {
        &self.cache
    }

    /// Snapshot of the internal state for debugging
    ///
    /// `cached` and `stored` are taken before `resolved`, which loads everything.
    pub fn inspect(&mut self) -> Result<Inspection> {
        let cached = self.cache.clone();
        let stored = self.store.clone();
        let resolved = self.all()?;

        Ok(Inspection {
            path: self.path().map(Path::to_path_buf),
            cached,
            stored,
            resolved,
        })
    }

    /// Load the file(s) for the first segment of `key`, once
    fn ensure_base_loaded(&mut self, key: &str) -> Result<()> {
        let Origin::Directory(dir) = &self.origin else {
            return Ok(());
        };

        let base = key::base(key);
        if self.loaded.contains(base) {
            return Ok(());
        }

        if let Some(error) = self.failed.get(base) {
            return Err(error.clone());
        }

        let files: Vec<BaseFile> = source::scan_directory(dir, &self.parsers)?
            .into_iter()
            .filter(|file| file.base == base)
            .collect();

        if files.is_empty() {
            tracing::trace!(base, "no file for base");
            return Ok(());
        }

        self.load_base(base, &files)
    }

    /// Load every base of a directory that is not loaded yet
    fn load_all_bases(&mut self) -> Result<()> {
        let Origin::Directory(dir) = &self.origin else {
            return Ok(());
        };

        let mut by_base: IndexMap<String, Vec<BaseFile>> = IndexMap::new();
        for file in source::scan_directory(dir, &self.parsers)? {
            by_base.entry(file.base.clone()).or_default().push(file);
        }

        for (base, files) in by_base {
            if self.loaded.contains(&base) {
                continue;
            }

            if let Some(error) = self.failed.get(&base) {
                return Err(error.clone());
            }

            self.load_base(&base, &files)?;
        }

        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self, files))]
    fn load_base(&mut self, base: &str, files: &[BaseFile]) -> Result<()> {
        let mut loaded: Option<Value> = None;

        for file in files {
            let value = match file.load(&self.parsers) {
                Ok(value) => value,
                Err(error) => {
                    tracing::debug!(%error, "base failed to load");
                    self.failed.insert(base.to_string(), error.clone());
                    return Err(error);
                }
            };

            loaded = Some(match loaded {
                Some(previous) => previous.deep_merge(value),
                None => value,
            });
        }

        self.loaded.insert(base.to_string());

        if let Some(value) = loaded {
            // values set before the file showed up take precedence
            match self.store.get_mut(base) {
                Some(existing) => *existing = value.deep_merge(std::mem::take(existing)),
                None => {
                    self.store.insert(base.to_string(), value);
                }
            }
        }

        Ok(())
    }

    /// Resolve `raw` found at `key`
    ///
    /// Deferred values are resolved, containers are rebuilt with all their leaves resolved. With
    /// `use_cache` scalars are read from and written to the cache.
    fn materialize(&mut self, key: &str, raw: Value, use_cache: bool) -> Result<Value> {
        if use_cache {
            if let Some(hit) = self.cache.get(key) {
                return Ok(hit.clone());
            }
        }

        match raw {
            Value::Deferred(deferred) => {
                let resolved = self.resolve_deferred(key, &deferred)?;
                if use_cache && resolved.is_scalar() {
                    self.cache.insert(key.to_string(), resolved.clone());
                }
                Ok(resolved)
            }
            Value::Object(object) => {
                let mut resolved = Map::with_capacity(object.len());
                for (entry, value) in object {
                    let value = self.materialize(&key::join(key, &entry), value, use_cache)?;
                    resolved.insert(entry, value);
                }
                Ok(Value::Object(resolved))
            }
            Value::Array(array) => {
                let mut resolved = Vec::with_capacity(array.len());
                for (index, value) in array.into_iter().enumerate() {
                    resolved.push(self.materialize(&key::join(key, index), value, use_cache)?);
                }
                Ok(Value::Array(resolved))
            }
            scalar => {
                if use_cache {
                    self.cache.insert(key.to_string(), scalar.clone());
                }
                Ok(scalar)
            }
        }
    }

    /// Resolve a deferred value, then everything it produced
    ///
    /// Nothing beneath a deferred value is cached: its result does not exist in the store.
    #[tracing::instrument(level = "trace", skip(self, deferred))]
    fn resolve_deferred(&mut self, key: &str, deferred: &Deferred) -> Result<Value> {
        if self.resolving.len() >= MAX_RESOLUTION_DEPTH || self.resolving.iter().any(|k| k == key)
        {
            tracing::debug!(chain=?self.resolving, "cyclic resolution");
            return Err(Error::CyclicResolution {
                key: key.to_string(),
            });
        }

        self.resolving.push(key.to_string());
        let resolved = deferred
            .resolve(self)
            .and_then(|value| self.materialize(key, value, false));
        self.resolving.pop();

        resolved
    }

    /// Value at `key` when the path runs through a deferred node
    ///
    /// The deferred ancestor is resolved and the rest of `key` is looked up in its result. Nothing
    /// found this way is cached.
    fn lookup_beneath_deferred(&mut self, key: &str) -> Result<Option<Value>> {
        let Some((ancestor, deferred)) = value::deferred_ancestor(&self.store, key) else {
            return Ok(None);
        };

        // only scalars are cached, nothing lies beneath them
        if self.cache.contains_key(&ancestor) {
            return Ok(None);
        }

        let resolved = self.resolve_deferred(&ancestor, &deferred)?;
        let rest = key[ancestor.len()..].trim_start_matches(key::DELIMITER);

        Ok(resolved.lookup(key::segments(rest)).cloned())
    }

    /// Drop cached values for `key`, its ancestors and its descendants
    fn invalidate(&mut self, key: &str) {
        let before = self.cache.len();
        self.cache.retain(|cached, _| !key::overlaps(cached, key));

        let removed = before - self.cache.len();
        if removed > 0 {
            tracing::debug!(key, removed, "cache invalidated");
        }
    }
}

impl Configuration for Config {
    fn has(&mut self, key: &str) -> Result<bool> {
        let key = key::normalize(key);
        if key.is_empty() {
            return Ok(false);
        }

        if self.cache.contains_key(&key) {
            return Ok(true);
        }

        self.ensure_base_loaded(&key)?;
        if value::lookup_path(&self.store, &key).is_some() {
            return Ok(true);
        }

        Ok(self.lookup_beneath_deferred(&key)?.is_some())
    }

    fn get(&mut self, key: &str) -> Result<Option<Value>> {
        let key = key::normalize(key);
        if key.is_empty() {
            return Ok(None);
        }

        if let Some(hit) = self.cache.get(&key) {
            tracing::trace!(%key, "cache hit");
            return Ok(Some(hit.clone()));
        }

        self.ensure_base_loaded(&key)?;

        let Some(raw) = value::lookup_path(&self.store, &key).cloned() else {
            return self.lookup_beneath_deferred(&key);
        };

        self.materialize(&key, raw, true).map(Some)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let key = key::normalize(key);
        if key.is_empty() {
            tracing::debug!("ignoring set with empty key");
            return Ok(());
        }

        self.ensure_base_loaded(&key)?;
        self.invalidate(&key);

        if value.is_scalar() {
            self.cache.insert(key.clone(), value.clone());
        }

        value::insert_path(&mut self.store, &key, value);
        Ok(())
    }

    fn all(&mut self) -> Result<Map> {
        self.load_all_bases()?;

        let store = self.store.clone();
        let mut resolved = Map::with_capacity(store.len());
        for (entry, value) in store {
            let value = self.materialize(&entry, value, true)?;
            resolved.insert(entry, value);
        }

        Ok(resolved)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_map(Map::new())
    }
}

/// See [Config::inspect]
#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub path: Option<PathBuf>,
    pub cached: Map,
    pub stored: Map,
    pub resolved: Map,
}
