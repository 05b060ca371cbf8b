//! strata-core: Layered application configuration
//!
//! Configuration is resolved from ranked layers: built-in code overrides,
//! the command line, an explicitly requested file, and per-user,
//! system-wide and administrator-wide files. Queries walk the layers in
//! precedence order; the merged view folds them bottom-up with
//! deterministic rules. Loading is fail-soft, and nothing is global: each
//! [`Config`] is an independent context.
//!
//! # Example
//!
//! ```rust
//! use strata_core::{Config, Value};
//!
//! let mut config = Config::new("myapp");
//! config.set("verbose", true);
//!
//! assert_eq!(config.get("verbose"), Some(Value::Bool(true)));
//! assert_eq!(config.find_layer("verbose").as_deref(), Some("modified"));
//! ```

pub mod discovery;
pub mod error;
pub mod layer;
pub mod loader;
pub mod merge;
pub mod value;

mod config;

pub use config::{AppInfo, CommandLineSource, Config, ConfigBuilder, StaticArgs};
pub use error::{Error, ErrorKind, Result};
pub use layer::{Layer, LayerStack};
pub use value::Value;
