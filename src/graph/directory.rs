use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::DirectoryTogglePolicy;

/// A directory in the filter tree with its effective state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub path: String,
    pub enabled: bool,
}

/// Enable/disable state for workspace-relative directories.
///
/// Only explicit toggles are stored; anything never toggled is enabled. A
/// directory is effectively enabled only when it and every ancestor are, so
/// directories discovered by a later scan under a disabled parent start disabled.
#[derive(Debug, Clone, Default)]
pub struct DirectoryFilter {
    policy: DirectoryTogglePolicy,
    states: BTreeMap<String, bool>,
}

impl DirectoryFilter {
    pub fn new(policy: DirectoryTogglePolicy) -> Self {
        Self {
            policy,
            states: BTreeMap::new(),
        }
    }

    pub fn set_policy(&mut self, policy: DirectoryTogglePolicy) {
        self.policy = policy;
    }

    /// Toggle `path`. `known` is the current directory list, so descendants that
    /// have never been toggled get an explicit state too.
    ///
    /// Disabling cascades to every descendant. Enabling follows the policy:
    /// symmetric enables descendants and ancestors as well, asymmetric touches
    /// only `path`.
    pub fn set_enabled(&mut self, path: &str, enabled: bool, known: &[String]) {
        let path = normalize_directory(path);
        let cascade_down = !enabled || self.policy == DirectoryTogglePolicy::Symmetric;

        if cascade_down {
            let descendants: Vec<String> = known
                .iter()
                .map(|d| normalize_directory(d))
                .chain(self.states.keys().cloned())
                .filter(|d| is_descendant(d, &path))
                .collect();
            for dir in descendants {
                self.states.insert(dir, enabled);
            }
        }

        if enabled && self.policy == DirectoryTogglePolicy::Symmetric {
            for ancestor in ancestors(&path) {
                self.states.insert(ancestor, true);
            }
        }

        tracing::debug!(directory = %path, enabled, "directory toggled");
        self.states.insert(path, enabled);
    }

    /// Effective state: `path` and all its ancestors are enabled.
    pub fn is_enabled(&self, path: &str) -> bool {
        let path = normalize_directory(path);
        ancestors(&path)
            .chain(std::iter::once(path.clone()))
            .all(|dir| self.states.get(&dir).copied().unwrap_or(true))
    }

    /// Effective state for each directory in `directories`, order preserved.
    pub fn entries(&self, directories: &[String]) -> Vec<DirectoryEntry> {
        directories
            .iter()
            .map(|d| DirectoryEntry {
                path: d.clone(),
                enabled: self.is_enabled(d),
            })
            .collect()
    }
}

/// Strip surrounding slashes, unify separators, drop `.` segments.
pub fn normalize_directory(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Proper ancestors of `path`, shallowest first, starting at the root `""`.
fn ancestors(path: &str) -> impl Iterator<Item = String> + '_ {
    let root = (!path.is_empty()).then(String::new);
    let inner = path
        .match_indices('/')
        .map(move |(i, _)| path[..i].to_owned());
    root.into_iter().chain(inner)
}

/// True if `dir` lies strictly below `parent`.
fn is_descendant(dir: &str, parent: &str) -> bool {
    if parent.is_empty() {
        return !dir.is_empty();
    }
    dir.len() > parent.len() && dir.starts_with(parent) && dir[parent.len()..].starts_with('/')
}
