//! Layered configuration resolution
//!
//! [`Config`] owns the layer stack and answers every query from the
//! precedence order: `modified` over `command_line` over `specific_file`
//! over `user` over `global` over `system`. The command-line layer is
//! rebuilt from its source before each query, and file-backed layers are
//! re-read when the file they should come from changes.

use indexmap::IndexMap;

use crate::discovery::SearchPaths;
use crate::error::{Error, Result};
use crate::layer::{self, Layer, LayerStack};
use crate::loader::{DocumentStore, Loader, YamlStore};
use crate::merge::{override_merge, second_level_merge};
use crate::value::Value;

/// Keys intercepted by [`Config::set`] before generic storage
const RESERVED_KEYS: &[(&str, fn(&mut Config, &Value))] = &[
    ("log-level", Config::apply_log_level),
    ("config-file", Config::apply_config_file),
];

/// Supplies the parsed command-line tree
///
/// The command-line layer is rebuilt from this source before every
/// query, so options registered after construction show up without an
/// explicit reload. Unset options should appear as [`Value::Null`] so
/// they never shadow values defined in lower layers.
pub trait CommandLineSource {
    /// Current option values as a key/value mapping
    fn snapshot(&self) -> IndexMap<String, Value>;
}

/// Fixed command-line values, for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct StaticArgs {
    values: IndexMap<String, Value>,
}

impl StaticArgs {
    /// Create an empty value set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Add a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }
}

impl CommandLineSource for StaticArgs {
    fn snapshot(&self) -> IndexMap<String, Value> {
        self.values.clone()
    }
}

/// Application identity used for file discovery and help output
///
/// Fields left as `None` keep their current value when applied through
/// [`Config::describe_application`].
#[derive(Debug, Clone, Default)]
pub struct AppInfo {
    pub app_name: Option<String>,
    pub app_version: Option<String>,
    pub app_description: Option<String>,
    pub script_name: Option<String>,
}

/// Builder for [`Config`]
pub struct ConfigBuilder {
    script_name: String,
    app_name: Option<String>,
    app_version: Option<String>,
    app_description: Option<String>,
    paths: SearchPaths,
    store: Box<dyn DocumentStore>,
    command_line: Box<dyn CommandLineSource>,
}

impl ConfigBuilder {
    /// Start building a configuration for `script_name`
    ///
    /// The script name is the base name the per-application files are
    /// discovered under.
    pub fn new(script_name: impl Into<String>) -> Self {
        Self {
            script_name: script_name.into(),
            app_name: None,
            app_version: None,
            app_description: None,
            paths: SearchPaths::default(),
            store: Box::new(YamlStore),
            command_line: Box::new(StaticArgs::new()),
        }
    }

    /// Set the human-readable application name
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Set the application version
    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = Some(version.into());
        self
    }

    /// Set the application description
    pub fn with_app_description(mut self, description: impl Into<String>) -> Self {
        self.app_description = Some(description.into());
        self
    }

    /// Replace the search paths used for file discovery
    pub fn with_search_paths(mut self, paths: SearchPaths) -> Self {
        self.paths = paths;
        self
    }

    /// Replace the document store
    pub fn with_document_store(mut self, store: impl DocumentStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    /// Replace the command-line source
    pub fn with_command_line(mut self, source: impl CommandLineSource + 'static) -> Self {
        self.command_line = Box::new(source);
        self
    }

    /// Build the configuration and perform the initial load
    pub fn build(self) -> Config {
        let mut config = Config {
            stack: LayerStack::new(),
            loader: Loader::new(self.paths, self.store),
            command_line: self.command_line,
            script_name: self.script_name,
            app_name: self.app_name,
            app_version: self.app_version,
            app_description: self.app_description,
        };
        config.reload(false);
        config
    }
}

/// Layered application configuration
///
/// All queries take `&mut self`: even reads refresh the command-line
/// layer first, so a single mutable handle is the whole API. Nothing
/// here is global; independent `Config` values never share state.
pub struct Config {
    stack: LayerStack,
    loader: Loader,
    command_line: Box<dyn CommandLineSource>,
    script_name: String,
    app_name: Option<String>,
    app_version: Option<String>,
    app_description: Option<String>,
}

impl Config {
    /// Configuration for `script_name` with every default
    pub fn new(script_name: impl Into<String>) -> Self {
        ConfigBuilder::new(script_name).build()
    }

    /// Start a builder for `script_name`
    pub fn builder(script_name: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(script_name)
    }

    /// The script name the per-application files are named after
    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    /// The human-readable application name, if set
    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    /// The application version, if set
    pub fn app_version(&self) -> Option<&str> {
        self.app_version.as_deref()
    }

    /// The application description, if set
    pub fn app_description(&self) -> Option<&str> {
        self.app_description.as_deref()
    }

    /// Apply an application identity in one call
    ///
    /// A `Some` script name re-reads every file-backed layer, since the
    /// per-application files are discovered under that name.
    pub fn describe_application(&mut self, info: AppInfo) {
        if let Some(name) = info.app_name {
            self.app_name = Some(name);
        }
        if let Some(version) = info.app_version {
            self.app_version = Some(version);
        }
        if let Some(description) = info.app_description {
            self.app_description = Some(description);
        }
        if let Some(script) = info.script_name {
            self.set_script_name(script);
        }
    }

    /// Change the script name and re-read every file-backed layer
    pub fn set_script_name(&mut self, name: impl Into<String>) {
        self.script_name = name.into();
        self.reload(true);
    }

    /// Value for `key` from the highest-precedence layer defining it
    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.refresh_command_line();
        self.stack.iter().find_map(|layer| layer.get(key)).cloned()
    }

    /// Name of the highest-precedence layer defining `key`
    pub fn find_layer(&mut self, key: &str) -> Option<String> {
        self.refresh_command_line();
        self.stack.find_layer(key).map(str::to_string)
    }

    /// Store a value in the `modified` layer
    ///
    /// Reserved keys are intercepted first: `log-level` is applied to
    /// the logger and never stored, and `config-file` is stored and then
    /// re-reads the explicit-file layer. Interception only applies here;
    /// reads and direct layer writes see reserved keys as plain data.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        for (name, handler) in RESERVED_KEYS {
            if *name == key {
                handler(self, &value);
                return;
            }
        }
        self.stack.set(layer::MODIFIED, key, value);
    }

    /// Merge the declared layers into one view, lowest precedence first
    ///
    /// The three regular file layers fold with the second-level merge.
    /// The explicit-file layer folds with the override merge when the
    /// command line carries a truthy `config-override`, otherwise with
    /// the second-level merge. Command-line values and code overrides
    /// land last. Ad-hoc layers are not part of the view.
    pub fn materialize(&mut self) -> Value {
        self.refresh_command_line();
        let override_all = self
            .stack
            .get(layer::COMMAND_LINE, "config-override")
            .map(Value::is_truthy)
            .unwrap_or(false);

        let mut view = Value::Mapping(IndexMap::new());
        for name in [layer::SYSTEM, layer::GLOBAL, layer::USER] {
            view = second_level_merge(view, self.layer_value(name));
        }
        view = if override_all {
            override_merge(view, self.layer_value(layer::SPECIFIC_FILE))
        } else {
            second_level_merge(view, self.layer_value(layer::SPECIFIC_FILE))
        };
        view = second_level_merge(view, self.layer_value(layer::COMMAND_LINE));
        second_level_merge(view, self.layer_value(layer::MODIFIED))
    }

    /// Merged view rendered as YAML
    pub fn to_yaml(&mut self) -> Result<String> {
        let view = self.materialize();
        serde_yaml::to_string(&view)
            .map_err(|e| Error::parse(e.to_string()).with_help("The merged view did not serialize"))
    }

    /// Merged view rendered as pretty JSON
    pub fn to_json(&mut self) -> Result<String> {
        let view = self.materialize();
        serde_json::to_string_pretty(&view)
            .map_err(|e| Error::parse(e.to_string()).with_help("The merged view did not serialize"))
    }

    /// Run `action` unless a truthy `simulate` is set in any layer
    ///
    /// Pairs with the `--simulate` flag: during a dry run the action is
    /// skipped and `message` is logged instead, so the output shows
    /// what would have happened.
    pub fn run_unless_simulated<T>(
        &mut self,
        message: &str,
        action: impl FnOnce() -> T,
    ) -> Option<T> {
        if self.get("simulate").is_some_and(|flag| flag.is_truthy()) {
            log::info!("Simulating: {}", message);
            return None;
        }
        log::debug!("{}", message);
        Some(action())
    }

    /// Drop every value written by code
    pub fn reset(&mut self) {
        self.stack.reset(layer::MODIFIED, layer::SOURCE_MODIFIED);
    }

    /// Re-read the file-backed layers
    ///
    /// With `force` the origin comparison is bypassed and every file is
    /// read again; without it only layers whose origin changed are
    /// touched. The explicit-file layer follows the current value of
    /// `config-file`, wherever in the stack it is defined.
    pub fn reload(&mut self, force: bool) {
        self.refresh_command_line();
        let admin_base = self.loader.paths().admin_base.clone();
        let script = self.script_name.clone();
        self.loader
            .ensure_loaded(&mut self.stack, layer::SYSTEM, Some(admin_base.as_str()), force);
        self.loader
            .ensure_loaded(&mut self.stack, layer::GLOBAL, Some(script.as_str()), force);
        self.loader
            .ensure_loaded(&mut self.stack, layer::USER, Some(script.as_str()), force);
        let explicit = self.effective_config_file();
        self.loader.ensure_loaded(
            &mut self.stack,
            layer::SPECIFIC_FILE,
            explicit.as_deref(),
            force,
        );
    }

    /// Value stored in one specific layer, bypassing precedence
    pub fn get_from(&mut self, layer: &str, key: &str) -> Option<Value> {
        if layer == layer::COMMAND_LINE {
            self.refresh_command_line();
        }
        self.stack.get(layer, key).cloned()
    }

    /// Store a value in one specific layer, bypassing interception
    ///
    /// Values written to the command-line layer do not survive the next
    /// query; that layer is rebuilt from its source every time.
    pub fn set_in(&mut self, layer: &str, key: impl Into<String>, value: impl Into<Value>) {
        self.stack.set(layer, key, value);
    }

    /// All layers in precedence order
    pub fn layers(&self) -> &LayerStack {
        &self.stack
    }

    /// One layer by name
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.stack.layer(name)
    }

    fn refresh_command_line(&mut self) {
        let snapshot = self.command_line.snapshot();
        if let Some(command_line) = self.stack.layer_mut(layer::COMMAND_LINE) {
            command_line.content = snapshot;
        }
    }

    fn layer_value(&self, name: &str) -> Value {
        self.stack.layer(name).map(Layer::to_value).unwrap_or_default()
    }

    /// The explicit file currently requested, wherever it was set
    fn effective_config_file(&self) -> Option<String> {
        self.stack
            .iter()
            .find_map(|layer| layer.get("config-file"))
            .and_then(file_name_from)
    }

    fn apply_log_level(&mut self, value: &Value) {
        match parse_level(value) {
            Some(level) => {
                log::set_max_level(level);
                log::debug!("Log level set to {}", level);
            }
            None => log::warn!("Unrecognized log level: {}", value),
        }
    }

    fn apply_config_file(&mut self, value: &Value) {
        self.stack.set(layer::MODIFIED, "config-file", value.clone());
        let candidate = match value {
            Value::Null => None,
            _ => match file_name_from(value) {
                Some(name) => Some(name),
                None => {
                    log::warn!(
                        "config-file expects a file name, got a {}; keeping the current explicit file",
                        value.type_name()
                    );
                    return;
                }
            },
        };
        self.loader.ensure_loaded(
            &mut self.stack,
            layer::SPECIFIC_FILE,
            candidate.as_deref(),
            true,
        );
    }
}

/// File name a `config-file` value designates
///
/// Scalars read as their textual form, so this is the one rule shared
/// by the write-path trigger and generic reloads; a tree names no file.
fn file_name_from(value: &Value) -> Option<String> {
    match value {
        Value::String(name) => Some(name.clone()),
        Value::Bool(_) | Value::Integer(_) | Value::Float(_) => Some(value.to_string()),
        _ => None,
    }
}

/// Numeric levels follow the conventional 0 to 5 scale where higher is
/// quieter; names go through the standard level parser.
fn parse_level(value: &Value) -> Option<log::LevelFilter> {
    match value {
        Value::Integer(n) => level_from_number(*n),
        Value::String(s) => match s.parse::<i64>() {
            Ok(n) => level_from_number(n),
            Err(_) => s.parse::<log::LevelFilter>().ok(),
        },
        _ => None,
    }
}

fn level_from_number(n: i64) -> Option<log::LevelFilter> {
    match n {
        0 => Some(log::LevelFilter::Debug),
        1 => Some(log::LevelFilter::Info),
        2 => Some(log::LevelFilter::Warn),
        3 | 4 => Some(log::LevelFilter::Error),
        5 => Some(log::LevelFilter::Off),
        _ => None,
    }
}
