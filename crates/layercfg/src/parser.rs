//! file parsing backends
//!
//! A [Parser] turns file contents into a [Value]. [Parsers] maps file extensions to parsers; the
//! default set understands `json`, `yaml`/`yml` and `hcl`.
use crate::value::Value;
use indexmap::IndexMap;
use std::sync::Arc;

pub trait Parser: Send + Sync {
    fn parse(&self, contents: &str) -> anyhow::Result<Value>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonParser;

impl Parser for JsonParser {
    fn parse(&self, contents: &str) -> anyhow::Result<Value> {
        let value: serde_json::Value = serde_json::from_str(contents)?;
        Ok(value.into())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct YamlParser;

impl Parser for YamlParser {
    fn parse(&self, contents: &str) -> anyhow::Result<Value> {
        let value: serde_yaml::Value = serde_yaml::from_str(contents)?;
        Ok(value.into())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HclParser;

impl Parser for HclParser {
    fn parse(&self, contents: &str) -> anyhow::Result<Value> {
        let value: hcl::Value = hcl::from_str(contents)?;
        Ok(value.into())
    }
}

/// Parsers by file extension
#[derive(Clone)]
pub struct Parsers {
    by_extension: IndexMap<String, Arc<dyn Parser>>,
}

impl Parsers {
    /// No parsers at all
    pub fn empty() -> Self {
        Self {
            by_extension: IndexMap::new(),
        }
    }

    /// Register `parser` for `extension`, replacing any previous one
    pub fn register(mut self, extension: impl Into<String>, parser: impl Parser + 'static) -> Self {
        self.by_extension
            .insert(extension.into().to_lowercase(), Arc::new(parser));
        self
    }

    pub fn get(&self, extension: &str) -> Option<&dyn Parser> {
        self.by_extension
            .get(&extension.to_lowercase())
            .map(|parser| parser.as_ref())
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.by_extension.keys().map(String::as_str)
    }
}

impl Default for Parsers {
    fn default() -> Self {
        Self::empty()
            .register("json", JsonParser)
            .register("yaml", YamlParser)
            .register("yml", YamlParser)
            .register("hcl", HclParser)
    }
}

impl std::fmt::Debug for Parsers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.extensions()).finish()
    }
}
