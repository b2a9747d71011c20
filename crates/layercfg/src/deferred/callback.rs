use super::Resolvable;
use crate::configuration::Configuration;
use crate::error::Result;
use crate::value::Value;
use std::sync::Arc;

pub type CallbackFn = dyn Fn(&[Value], &mut dyn Configuration) -> Result<Value> + Send + Sync;

/// Calls a function with captured arguments, followed by the configuration
#[derive(derive_new::new, Clone)]
pub struct Callback {
    callback: Arc<CallbackFn>,
    args: Vec<Value>,
}

impl Resolvable for Callback {
    fn resolve(&self, config: &mut dyn Configuration) -> Result<Value> {
        (self.callback)(&self.args, config)
    }
}

impl std::fmt::Debug for Callback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callback")
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{deferred, Config, Configuration};
    use pretty_assertions::assert_eq;

    #[test]
    fn receives_args_and_configuration() {
        let mut config = Config::default();
        config.set("greeting", "hello".into()).unwrap();
        config
            .set(
                "message",
                deferred::call(
                    |args, config| {
                        let greeting = config.get_or("greeting", Value::Null)?;
                        let name = args.first().and_then(Value::as_str).unwrap_or("nobody");
                        Ok(format!("{} {name}", greeting.as_str().unwrap_or_default()).into())
                    },
                    vec!["world".into()],
                ),
            )
            .unwrap();

        assert_eq!(config.get("message").unwrap(), Some("hello world".into()));
    }
}
