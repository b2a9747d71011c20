//! # layercfg - lazy, layered configuration
//!
//! ## Introduction for developers
//!
//! Read this to understand how `layercfg` works internally.
//!
//! ### Keys
//!
//! Values are addressed by key paths such as `database.primary.host`. `/` may be used instead of
//! `.` (`database/primary/host`). The first segment (`database`) is called the "base". Segments
//! addressing a list are read as indices (`servers.0.host`).
//!
//! ### Values
//!
//! [value::Value] is a tagged union of null, booleans, numbers, strings, lists, maps and
//! [deferred::Deferred] values. A deferred value is a placeholder that computes its real value from
//! the configuration it is read from:
//!
//! ```
//! use layercfg::{deferred, Config, Configuration, Value};
//!
//! let mut config = Config::default();
//! config.set("db.host", "db.internal".into())?;
//! config.set("dsn", deferred::get("db.host", "localhost"))?;
//!
//! assert_eq!(config.get("dsn")?, Some(Value::from("db.internal")));
//! # Ok::<(), layercfg::Error>(())
//! ```
//!
//! ### Loading
//!
//! see [source]
//!
//! A [Config] is created from an in-memory map, a file, or a directory. A directory is not read up
//! front: each file in it provides one base and is loaded the first time a key with that base is
//! touched. Given
//!
//! ```text
//! config/
//!   app.json
//!   database.yaml
//! ```
//!
//! reading `database.host` only loads `database.yaml`. [Configuration::all] loads everything.
//!
//! ### Resolving and caching
//!
//! see [config]
//!
//! [Config] keeps the raw data (with deferred values) and a flat cache of resolved scalars by key
//! path. A deferred value is resolved on its first read and the result is cached, the raw data keeps
//! the deferred value. Containers are never cached; they are rebuilt from the raw data and the cached
//! scalars on each read, so a container always reflects values set inside it after it was first read.
//!
//! A deferred value that (indirectly) reads itself fails with [Error::CyclicResolution].
//!
//! ### Stacking
//!
//! see [stacked]
//!
//! [StackedConfig] combines several configurations. Writes go to a private layer in front. Reads
//! merge what every layer has for the key:
//!
//! | **layer 1** | **layer 2**      | **layer 3** | **result**                |
//! |-------------|------------------|-------------|---------------------------|
//! | `"s"`       | `["l"]`          | `"t"`       | `["s", "l", "t"]`         |
//! | `{a: 1}`    | `{a: 2, b: 3}`   |             | `{a: 1, b: 3}`            |
//! | `"s"`       | `{a: 1}`         |             | `"s"`                     |
//!
pub mod config;
mod configuration;
pub mod deferred;
mod error;
mod key;
pub mod parser;
pub mod source;
pub mod stacked;
pub mod value;

pub use config::{Config, Inspection};
pub use configuration::Configuration;
pub use error::{Error, Result};
pub use stacked::StackedConfig;
pub use value::{Map, Value};
