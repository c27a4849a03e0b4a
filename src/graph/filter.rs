use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{DirectoryTogglePolicy, normalize_extension, normalize_extension_list};
use crate::graph::GraphSnapshot;
use crate::graph::directory::DirectoryFilter;
use crate::graph::node::FileNode;
use crate::language::extension_of;

/// An extension in the target list with its toggle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionEntry {
    pub extension: String,
    pub enabled: bool,
}

/// Target extension list (in resolution precedence order) plus individually disabled ones.
#[derive(Debug, Clone, Default)]
pub struct ExtensionFilter {
    targets: Vec<String>,
    disabled: BTreeSet<String>,
}

impl ExtensionFilter {
    pub fn new(targets: Vec<String>) -> Self {
        Self {
            targets,
            disabled: BTreeSet::new(),
        }
    }

    /// Replace the target list. Entries are normalized, de-duplicated, and
    /// anything in `ignored` is dropped. Disabled flags survive for extensions
    /// that stay in the list.
    pub fn set_targets(&mut self, extensions: &[String], ignored: &[String]) {
        self.targets = normalize_extension_list(extensions, ignored);
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn entries(&self) -> Vec<ExtensionEntry> {
        self.targets
            .iter()
            .map(|ext| ExtensionEntry {
                extension: ext.clone(),
                enabled: !self.disabled.contains(ext),
            })
            .collect()
    }

    pub fn set_enabled(&mut self, extension: &str, enabled: bool) {
        let Some(ext) = normalize_extension(extension) else {
            return;
        };
        if enabled {
            self.disabled.remove(&ext);
        } else {
            self.disabled.insert(ext);
        }
    }

    /// Not individually disabled. Says nothing about membership in the target list.
    pub fn is_enabled(&self, extension: &str) -> bool {
        normalize_extension(extension).is_none_or(|ext| !self.disabled.contains(&ext))
    }

    /// In the target list and not disabled.
    pub fn is_active(&self, extension: &str) -> bool {
        normalize_extension(extension)
            .is_some_and(|ext| self.targets.contains(&ext) && !self.disabled.contains(&ext))
    }
}

/// All user-controlled filtering state. Survives re-scans.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub extensions: ExtensionFilter,
    pub directories: DirectoryFilter,
}

impl FilterState {
    pub fn new(targets: Vec<String>, policy: DirectoryTogglePolicy) -> Self {
        Self {
            extensions: ExtensionFilter::new(targets),
            directories: DirectoryFilter::new(policy),
        }
    }

    /// A scanned file is active when its extension is active and its directory enabled.
    pub fn is_file_active(&self, node: &FileNode) -> bool {
        self.extensions.is_active(&node.extension) && self.directories.is_enabled(&node.directory)
    }

    /// Activity of an arbitrary edge endpoint. Targets outside the scan are
    /// judged by extension alone.
    fn is_path_active(&self, snapshot: &GraphSnapshot, path: &Path) -> bool {
        match snapshot.files.get(path) {
            Some(node) => self.is_file_active(node),
            None => extension_of(path).is_some_and(|ext| self.extensions.is_active(&ext)),
        }
    }

    /// Restrict `map` (the snapshot's forward or reverse mapping) to active files
    /// on both sides of every edge.
    pub fn apply(
        &self,
        snapshot: &GraphSnapshot,
        map: &BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    ) -> BTreeMap<PathBuf, Vec<PathBuf>> {
        map.iter()
            .filter(|(source, _)| self.is_path_active(snapshot, source))
            .map(|(source, targets)| {
                let kept = targets
                    .iter()
                    .filter(|t| self.is_path_active(snapshot, t))
                    .cloned()
                    .collect();
                (source.clone(), kept)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_entries_and_toggles() {
        let mut filter = ExtensionFilter::new(exts(&[".ts", ".css"]));
        filter.set_enabled("CSS", false);

        assert_eq!(
            filter.entries(),
            vec![
                ExtensionEntry {
                    extension: ".ts".into(),
                    enabled: true
                },
                ExtensionEntry {
                    extension: ".css".into(),
                    enabled: false
                },
            ]
        );
        assert!(!filter.is_enabled(".css"));
        assert!(!filter.is_active(".css"));
        assert!(filter.is_active(".TS"));

        filter.set_enabled(".css", true);
        assert!(filter.is_active(".css"));
    }

    #[test]
    fn test_non_target_is_enabled_but_not_active() {
        let filter = ExtensionFilter::new(exts(&[".ts"]));
        assert!(filter.is_enabled(".png"));
        assert!(!filter.is_active(".png"));
    }

    #[test]
    fn test_set_targets_normalizes_and_keeps_disabled() {
        let mut filter = ExtensionFilter::new(exts(&[".ts"]));
        filter.set_enabled(".js", false);
        filter.set_targets(&exts(&["JS", "ts", ".js", "css"]), &exts(&["css"]));

        assert_eq!(filter.targets(), &exts(&[".js", ".ts"])[..]);
        assert!(!filter.is_active(".js"));
    }

    #[test]
    fn test_empty_target_list_activates_nothing() {
        let mut filter = ExtensionFilter::new(exts(&[".ts"]));
        filter.set_targets(&[], &[]);
        assert!(!filter.is_active(".ts"));
        assert!(filter.entries().is_empty());
    }
}
