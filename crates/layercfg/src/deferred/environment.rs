//! environment dependent values
use super::Resolvable;
use crate::configuration::Configuration;
use crate::error::Result;
use crate::value::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Source of environment variables
pub trait Environment: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;

    fn var_or(&self, name: &str, default: &str) -> String {
        self.var(name).unwrap_or_else(|| default.to_string())
    }
}

/// The process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Picks a context from `conditions` based on an environment variable
///
/// `conditions` holds contexts keyed `@<name>`. The `@default` context (if any) is deep merged with
/// the context named after the lowercased value of `APP_ENV`, which falls back to `production`.
///
/// The selected context overrides the default one: maps merge key by key, any other value of the
/// selected context replaces the default value instead of being collected into a list with it.
#[derive(derive_new::new, Clone)]
pub struct EnvDetermined {
    conditions: Map,
    env: Arc<dyn Environment>,
    #[new(value = "\"APP_ENV\".to_string()")]
    var: String,
    #[new(value = "\"production\".to_string()")]
    default_env: String,
    #[new(value = "\"default\".to_string()")]
    default_context: String,
}

impl EnvDetermined {
    pub fn with_var(mut self, var: impl Into<String>) -> Self {
        self.var = var.into();
        self
    }

    pub fn with_default_env(mut self, default_env: impl Into<String>) -> Self {
        self.default_env = default_env.into();
        self
    }

    pub fn with_default_context(mut self, default_context: impl Into<String>) -> Self {
        self.default_context = default_context.into();
        self
    }

    pub fn environment(&self) -> String {
        self.env.var_or(&self.var, &self.default_env).to_lowercase()
    }

    fn context(&self, name: &str) -> Option<&Value> {
        self.conditions.get(&format!("{}{name}", super::DEFAULT_SYMBOL))
    }
}

impl Resolvable for EnvDetermined {
    #[tracing::instrument(level = "trace", skip_all, fields(var = %self.var))]
    fn resolve(&self, _config: &mut dyn Configuration) -> Result<Value> {
        let environment = self.environment();
        tracing::trace!(%environment, "selecting context");

        let default = self
            .context(&self.default_context)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        Ok(match self.context(&environment) {
            Some(selected) => default.deep_merge(selected.clone()),
            None => default,
        })
    }
}

impl std::fmt::Debug for EnvDetermined {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvDetermined")
            .field("conditions", &self.conditions)
            .field("var", &self.var)
            .field("default_env", &self.default_env)
            .field("default_context", &self.default_context)
            .finish_non_exhaustive()
    }
}
