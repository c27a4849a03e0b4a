use std::path::Path;

use serde::Deserialize;

use crate::error::{FileDepError, Result};

/// Name of the configuration file looked up at the first workspace root.
pub const CONFIG_FILE_NAME: &str = "filedep.toml";

/// Extensions scanned when the configuration does not name any, in resolution
/// precedence order.
pub const DEFAULT_TARGET_EXTENSIONS: &[&str] =
    &[".js", ".jsx", ".ts", ".tsx", ".vue", ".svelte", ".css"];

/// Directory names skipped during collection (hidden directories are always skipped).
pub const DEFAULT_IGNORED_DIRECTORIES: &[&str] =
    &["node_modules", "dist", "build", "out", "target", "coverage"];

const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// How enabling a directory propagates through the directory tree.
///
/// Disabling always cascades to descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryTogglePolicy {
    /// Enabling a directory also enables its descendants and its ancestors.
    #[default]
    Symmetric,
    /// Enabling a directory touches only that directory.
    Asymmetric,
}

/// Configuration loaded from `filedep.toml` at the workspace root.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileDepConfig {
    /// Extensions to scan, in resolution precedence order. `None` uses
    /// [`DEFAULT_TARGET_EXTENSIONS`].
    pub target_extensions: Option<Vec<String>>,
    /// Extensions removed from the target list.
    pub ignored_extensions: Vec<String>,
    /// Directory names never descended into.
    pub ignored_directories: Vec<String>,
    /// Glob patterns excluded from collection (matched on full path and on each component).
    pub exclude: Vec<String>,
    /// Explicit directory list for the filter UI, replacing auto-derived ancestors.
    pub directories: Option<Vec<String>>,
    /// Honor `.gitignore` files while walking.
    pub respect_gitignore: bool,
    /// Files larger than this are kept as nodes without being read.
    pub max_file_size: u64,
    /// Worker threads for extraction and resolution. `0` lets rayon decide.
    pub concurrency: usize,
    /// Narrow the target list to extensions actually present in the workspace.
    pub detect_extensions: bool,
    pub directory_toggle: DirectoryTogglePolicy,
}

impl Default for FileDepConfig {
    fn default() -> Self {
        Self {
            target_extensions: None,
            ignored_extensions: Vec::new(),
            ignored_directories: DEFAULT_IGNORED_DIRECTORIES
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            exclude: Vec::new(),
            directories: None,
            respect_gitignore: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            concurrency: 0,
            detect_extensions: false,
            directory_toggle: DirectoryTogglePolicy::default(),
        }
    }
}

impl FileDepConfig {
    /// Load configuration from `filedep.toml` in the given root directory.
    ///
    /// Returns a default configuration if the file does not exist or cannot be
    /// read or parsed; problems are logged as warnings.
    pub fn load(root: &Path) -> Self {
        match Self::try_load(root) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(err) => {
                tracing::warn!("{err}. Using defaults.");
                Self::default()
            }
        }
    }

    /// Like [`FileDepConfig::load`] but reports failures. `Ok(None)` means no config file.
    pub fn try_load(root: &Path) -> Result<Option<Self>> {
        let config_path = root.join(CONFIG_FILE_NAME);
        if !config_path.is_file() {
            return Ok(None);
        }

        let contents =
            std::fs::read_to_string(&config_path).map_err(|source| FileDepError::Read {
                path: config_path.clone(),
                source,
            })?;

        toml::from_str::<Self>(&contents)
            .map(Some)
            .map_err(|source| FileDepError::ConfigParse {
                path: config_path,
                source,
            })
    }

    /// The effective target extensions: configured (or default) list,
    /// normalized, de-duplicated, minus ignored extensions. Order is preserved.
    pub fn effective_target_extensions(&self) -> Vec<String> {
        let configured: Vec<String> = match &self.target_extensions {
            Some(list) => list.clone(),
            None => DEFAULT_TARGET_EXTENSIONS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        };
        normalize_extension_list(&configured, &self.ignored_extensions)
    }
}

/// Normalize an extension to lower case with a leading dot. Returns `None` for empty input.
pub fn normalize_extension(ext: &str) -> Option<String> {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

/// Normalize a list of extensions, dropping duplicates and anything in `ignored`.
pub fn normalize_extension_list(list: &[String], ignored: &[String]) -> Vec<String> {
    let ignored: Vec<String> = ignored
        .iter()
        .filter_map(|e| normalize_extension(e))
        .collect();

    let mut out: Vec<String> = Vec::with_capacity(list.len());
    for ext in list.iter().filter_map(|e| normalize_extension(e)) {
        if !ignored.contains(&ext) && !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}
