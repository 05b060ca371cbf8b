//! Configuration file discovery
//!
//! A layer's backing file is found by probing candidate directories in
//! order, trying every recognized extension in one directory before
//! moving to the next. The first existing candidate wins, so directory
//! order dominates extension order.

use std::path::{Path, PathBuf};

use crate::layer;

/// Recognized configuration file extensions, in probe order
pub const EXTENSIONS: [&str; 8] = ["conf", "yml", "cfg", "yaml", "CFG", "YML", "YAML", "Yaml"];

/// Candidate directories and file naming for the file-backed layers
#[derive(Debug, Clone)]
pub struct SearchPaths {
    /// Directories probed for the administrator-wide file
    pub system_dirs: Vec<PathBuf>,
    /// Directories probed for the system-wide file
    pub global_dirs: Vec<PathBuf>,
    /// Directories probed for the per-user file
    pub user_dirs: Vec<PathBuf>,
    /// Directories probed when an explicit file is given as a bare name
    pub specific_dirs: Vec<PathBuf>,
    /// Extensions tried in each directory
    pub extensions: Vec<String>,
    /// Base name of the administrator-wide file, shared by every
    /// application of the product
    pub admin_base: String,
}

impl SearchPaths {
    /// Candidate directories for a file-backed layer
    pub fn dirs_for(&self, layer: &str) -> &[PathBuf] {
        match layer {
            layer::SYSTEM => &self.system_dirs,
            layer::GLOBAL => &self.global_dirs,
            layer::USER => &self.user_dirs,
            _ => &self.specific_dirs,
        }
    }

    /// Replace the administrator-wide base name
    pub fn with_admin_base(mut self, base: impl Into<String>) -> Self {
        self.admin_base = base.into();
        self
    }

    /// Replace the administrator-wide directories
    pub fn with_system_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.system_dirs = dirs;
        self
    }

    /// Replace the system-wide directories
    pub fn with_global_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.global_dirs = dirs;
        self
    }

    /// Replace the per-user directories
    pub fn with_user_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.user_dirs = dirs;
        self
    }

    /// Replace the directories probed for explicit files
    pub fn with_specific_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.specific_dirs = dirs;
        self
    }

    /// Replace the extension list
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }
}

impl Default for SearchPaths {
    fn default() -> Self {
        let system_dirs = admin_places();
        let global_dirs = global_places();
        let user_dirs = user_places();
        // Explicit files given as bare names are looked up near the user
        // first, then in the system-wide locations
        let mut specific_dirs = user_dirs.clone();
        specific_dirs.extend(global_dirs.iter().cloned());
        Self {
            system_dirs,
            global_dirs,
            user_dirs,
            specific_dirs,
            extensions: EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            admin_base: "strata".to_string(),
        }
    }
}

#[cfg(unix)]
fn admin_places() -> Vec<PathBuf> {
    vec![PathBuf::from("/etc")]
}

#[cfg(unix)]
fn global_places() -> Vec<PathBuf> {
    vec![PathBuf::from("/etc"), PathBuf::from("/usr/local/etc")]
}

#[cfg(windows)]
fn admin_places() -> Vec<PathBuf> {
    std::env::var_os("ProgramData")
        .map(PathBuf::from)
        .into_iter()
        .collect()
}

#[cfg(windows)]
fn global_places() -> Vec<PathBuf> {
    admin_places()
}

fn user_places() -> Vec<PathBuf> {
    dirs::config_dir().into_iter().collect()
}

/// Probe `dirs` in order for `base` with every extension, returning the
/// first candidate accepted by `exists`.
pub fn find_file<F>(
    dirs: &[PathBuf],
    base: &str,
    extensions: &[String],
    exists: F,
) -> Option<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    for dir in dirs {
        for ext in extensions {
            let candidate = dir.join(format!("{}.{}", base, ext));
            log::debug!("Probing for configuration file {}", candidate.display());
            if exists(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}
