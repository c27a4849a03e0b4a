use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::language::{FileClass, extension_of};

/// Metadata about a scanned file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNode {
    /// Absolute, lexically normalized path.
    pub path: PathBuf,
    /// Lower-cased extension including the dot (empty if none).
    pub extension: String,
    /// Containing directory relative to the owning workspace root, `/`-separated.
    /// The root itself is `""`.
    pub directory: String,
    pub class: FileClass,
}

impl FileNode {
    /// Build the node for `path`, found under workspace root `root`.
    pub fn new(path: PathBuf, root: &Path) -> Self {
        let extension = extension_of(&path).unwrap_or_default();
        let class = FileClass::from_extension(&extension);
        let directory = relative_directory(root, &path);
        Self {
            path,
            extension,
            directory,
            class,
        }
    }

    /// File name for display labels.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// The containing directory of `file` relative to `root`, `/`-separated; `""` for the root.
pub fn relative_directory(root: &Path, file: &Path) -> String {
    let parent = file.parent().unwrap_or(file);
    let rel = parent.strip_prefix(root).unwrap_or(parent);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_node_metadata() {
        let node = FileNode::new(PathBuf::from("/ws/src/ui/Button.TSX"), Path::new("/ws"));
        assert_eq!(node.extension, ".tsx");
        assert_eq!(node.directory, "src/ui");
        assert_eq!(node.class, FileClass::Script);
        assert_eq!(node.name(), "Button.TSX");
    }

    #[test]
    fn test_root_level_file_has_empty_directory() {
        assert_eq!(relative_directory(Path::new("/ws"), Path::new("/ws/a.ts")), "");
    }
}
