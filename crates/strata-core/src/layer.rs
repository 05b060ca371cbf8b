//! Named configuration layers and the ordered stack
//!
//! The stack is seeded with the six declared layers in precedence order,
//! so iterating it visits the highest-ranked layer first. Layers created
//! on the fly by a write land after the declared ones and therefore rank
//! below all of them.

use indexmap::IndexMap;

use crate::value::Value;

/// The in-memory layer written by [`crate::Config::set`]
pub const MODIFIED: &str = "modified";
/// The layer rebuilt from the command line before every query
pub const COMMAND_LINE: &str = "command_line";
/// The layer backed by an explicitly requested file
pub const SPECIFIC_FILE: &str = "specific_file";
/// The layer backed by the per-user file
pub const USER: &str = "user";
/// The layer backed by the system-wide file, named after the script
pub const GLOBAL: &str = "global";
/// The layer backed by the administrator-wide file
pub const SYSTEM: &str = "system";

/// Declared layers, highest precedence first
pub const LAYER_ORDER: [&str; 6] = [MODIFIED, COMMAND_LINE, SPECIFIC_FILE, USER, GLOBAL, SYSTEM];

/// The file-backed subset of the declared layers, in load order
pub const FILE_LAYERS: [&str; 4] = [SYSTEM, GLOBAL, USER, SPECIFIC_FILE];

/// Source label for the in-memory override layer
pub const SOURCE_MODIFIED: &str = "Changed by code";
/// Source label for the command-line layer
pub const SOURCE_COMMAND_LINE: &str = "Command line";
/// Source label for layers created implicitly by a write
pub const SOURCE_UNKNOWN: &str = "Unknown source";

/// A single named configuration layer
#[derive(Debug, Clone)]
pub struct Layer {
    /// Layer name (e.g., "user")
    pub name: String,
    /// Parsed key/value content
    pub content: IndexMap<String, Value>,
    /// Human-readable description of where the content came from
    pub source: Option<String>,
    /// Identity of the last load request, compared to decide whether a
    /// reload can be skipped
    pub origin: Option<String>,
}

impl Layer {
    /// Create an empty layer
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: IndexMap::new(),
            source: None,
            origin: None,
        }
    }

    /// Create an empty layer with a fixed source label
    pub fn with_source(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::new(name)
        }
    }

    /// Look up a key, treating a stored null as absent
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.content.get(key).filter(|value| !value.is_null())
    }

    /// Whether the layer holds a non-null value for the key
    pub fn defines(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Store a value under the key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.content.insert(key.into(), value.into());
    }

    /// The content as a mapping value, for merging and display
    pub fn to_value(&self) -> Value {
        Value::Mapping(self.content.clone())
    }
}

/// Ordered collection of configuration layers
///
/// Keyed by layer name; iteration order is precedence order.
#[derive(Debug, Clone)]
pub struct LayerStack {
    layers: IndexMap<String, Layer>,
}

impl LayerStack {
    /// Create a stack holding the declared layers in precedence order
    pub fn new() -> Self {
        let mut layers = IndexMap::new();
        for name in LAYER_ORDER {
            layers.insert(name.to_string(), Layer::new(name));
        }
        if let Some(modified) = layers.get_mut(MODIFIED) {
            modified.source = Some(SOURCE_MODIFIED.to_string());
        }
        if let Some(command_line) = layers.get_mut(COMMAND_LINE) {
            command_line.source = Some(SOURCE_COMMAND_LINE.to_string());
        }
        Self { layers }
    }

    /// Layer names in precedence order, ad-hoc layers last
    pub fn names(&self) -> Vec<&str> {
        self.layers.keys().map(String::as_str).collect()
    }

    /// Layers in precedence order, highest first
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    /// One layer by name
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    /// Mutable access to one layer by name
    pub fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.layers.get_mut(name)
    }

    /// Whether a layer with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    /// Number of layers, ad-hoc ones included
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// True when the stack holds no layers at all
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Value stored in one layer, nulls filtered
    ///
    /// Reading an unknown layer logs a warning and finds nothing.
    pub fn get(&self, layer: &str, key: &str) -> Option<&Value> {
        match self.layers.get(layer) {
            Some(found) => found.get(key),
            None => {
                log::warn!("Unknown configuration layer '{}'", layer);
                None
            }
        }
    }

    /// Store a value in one layer
    ///
    /// Writing to an unknown layer creates it on the fly with a
    /// placeholder source, ranked after every declared layer.
    pub fn set(&mut self, layer: &str, key: impl Into<String>, value: impl Into<Value>) {
        if !self.layers.contains_key(layer) {
            log::warn!("Unknown configuration layer '{}', creating it", layer);
            self.layers
                .insert(layer.to_string(), Layer::with_source(layer, SOURCE_UNKNOWN));
        }
        if let Some(target) = self.layers.get_mut(layer) {
            target.set(key, value);
        }
    }

    /// Name of the highest-precedence layer defining the key
    pub fn find_layer(&self, key: &str) -> Option<&str> {
        self.layers
            .values()
            .find(|layer| layer.defines(key))
            .map(|layer| layer.name.as_str())
    }

    /// Empty a layer's content and restore a fixed source description
    ///
    /// Resetting an unknown layer logs a warning and does nothing.
    pub fn reset(&mut self, layer: &str, source: &str) {
        match self.layers.get_mut(layer) {
            Some(found) => {
                found.content.clear();
                found.source = Some(source.to_string());
                found.origin = None;
            }
            None => log::warn!("Unknown configuration layer '{}'", layer),
        }
    }

    /// Insert or replace a layer, keeping its position when it already
    /// exists
    pub fn put(&mut self, layer: Layer) {
        self.layers.insert(layer.name.clone(), layer);
    }
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::new()
    }
}
