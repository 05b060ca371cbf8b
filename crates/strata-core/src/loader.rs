//! Layer loading and the document store seam
//!
//! `Loader` turns a load request (layer name plus a candidate file name)
//! into layer content, going through a [`DocumentStore`] so tests and
//! embedders can swap the file system out. Loading is fail-soft: a
//! missing file leaves the layer empty with a log entry at info, a
//! malformed file leaves it empty with a log entry at error, and no
//! outcome ever disturbs another layer.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::discovery::{find_file, SearchPaths};
use crate::error::{Error, Result};
use crate::layer::{Layer, LayerStack};
use crate::value::Value;

/// Access to configuration documents
///
/// The default implementation reads YAML from the local file system.
pub trait DocumentStore {
    /// Whether a candidate path exists
    fn exists(&self, path: &Path) -> bool;

    /// Parse the document at `path` into layer content
    ///
    /// The document must hold a mapping at the top level; an empty
    /// document counts as an empty mapping.
    fn parse(&self, path: &Path) -> Result<IndexMap<String, Value>>;
}

/// Reads YAML documents from the local file system
#[derive(Debug, Clone, Default)]
pub struct YamlStore;

impl DocumentStore for YamlStore {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn parse(&self, path: &Path) -> Result<IndexMap<String, Value>> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::io(e.to_string()).with_path(path.display().to_string()))?;
        let value: Value = serde_yaml::from_str(&text).map_err(|e| {
            Error::parse(e.to_string())
                .with_path(path.display().to_string())
                .with_help("Check the file for YAML syntax errors")
        })?;
        match value {
            Value::Null => Ok(IndexMap::new()),
            Value::Mapping(map) => Ok(map),
            other => Err(Error::parse(format!(
                "Expected a mapping at the top level, got a {}",
                other.type_name()
            ))
            .with_path(path.display().to_string())),
        }
    }
}

/// Loads file-backed layers into the stack
pub struct Loader {
    paths: SearchPaths,
    store: Box<dyn DocumentStore>,
}

impl Loader {
    /// Create a loader over the given search paths and document store
    pub fn new(paths: SearchPaths, store: Box<dyn DocumentStore>) -> Self {
        Self { paths, store }
    }

    /// The search paths this loader probes
    pub fn paths(&self) -> &SearchPaths {
        &self.paths
    }

    /// Load a layer from `candidate` unless the stack already holds
    /// content for that exact origin
    ///
    /// `candidate` is a base name for the regular layers, or a file name
    /// or path for the explicit layer; a candidate naming an existing
    /// file is used verbatim, anything else goes through discovery.
    /// `force` bypasses the origin comparison.
    pub fn ensure_loaded(
        &self,
        stack: &mut LayerStack,
        layer_name: &str,
        candidate: Option<&str>,
        force: bool,
    ) {
        if !force {
            if let Some(existing) = stack.layer(layer_name) {
                if existing.origin.as_deref() == candidate {
                    log::debug!(
                        "Layer '{}' already loaded for origin {:?}, skipping",
                        layer_name,
                        candidate
                    );
                    return;
                }
            }
        }

        let mut layer = Layer::new(layer_name);
        layer.origin = candidate.map(str::to_string);

        let Some(base) = candidate else {
            log::info!("No configuration file requested for layer '{}'", layer_name);
            stack.put(layer);
            return;
        };

        let path = if self.store.exists(Path::new(base)) {
            Some(PathBuf::from(base))
        } else {
            find_file(
                self.paths.dirs_for(layer_name),
                base,
                &self.paths.extensions,
                |p| self.store.exists(p),
            )
        };

        let Some(path) = path else {
            log::info!(
                "No configuration file found for layer '{}' (base name '{}')",
                layer_name,
                base
            );
            stack.put(layer);
            return;
        };

        match self.store.parse(&path) {
            Ok(content) => {
                log::debug!(
                    "Loaded {} entries into layer '{}' from {}",
                    content.len(),
                    layer_name,
                    path.display()
                );
                layer.content = content;
            }
            Err(e) => {
                // Keep the source so the broken file stays visible in
                // layer introspection
                log::error!("Failed to load layer '{}': {}", layer_name, e);
            }
        }
        layer.source = Some(path.display().to_string());
        stack.put(layer);
    }
}
