use std::path::{Path, PathBuf};

/// Watch event after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A file was created or modified.
    Modified(PathBuf),
    /// A file or directory no longer exists.
    Deleted(PathBuf),
    /// `filedep.toml` changed. Triggers a config reload before the rescan.
    ConfigChanged,
}

impl WatchEvent {
    pub fn path(&self) -> Option<&Path> {
        match self {
            WatchEvent::Modified(p) | WatchEvent::Deleted(p) => Some(p),
            WatchEvent::ConfigChanged => None,
        }
    }
}
