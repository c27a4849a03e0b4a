use std::path::Path;

use serde::{Deserialize, Serialize};

/// The extraction class of a file, derived from its extension.
///
/// Uses a plain enum (not trait objects). Cheap to copy and pattern-matched
/// when selecting extraction rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileClass {
    /// JavaScript / TypeScript modules.
    Script,
    /// Single-file components mixing script and markup (Vue, Svelte, Astro).
    Component,
    /// CSS and preprocessor stylesheets.
    Stylesheet,
    /// HTML documents.
    Markup,
    /// Anything else. No extraction rules apply.
    Other,
}

impl FileClass {
    /// Classify a normalized extension (lower case, leading dot).
    pub fn from_extension(ext: &str) -> FileClass {
        match ext {
            ".js" | ".jsx" | ".ts" | ".tsx" | ".mjs" | ".cjs" | ".mts" | ".cts" => {
                FileClass::Script
            }
            ".vue" | ".svelte" | ".astro" => FileClass::Component,
            ".css" | ".scss" | ".sass" | ".less" => FileClass::Stylesheet,
            ".html" | ".htm" => FileClass::Markup,
            _ => FileClass::Other,
        }
    }

    /// Classify a path by its extension.
    pub fn from_path(path: &Path) -> FileClass {
        extension_of(path)
            .map(|ext| FileClass::from_extension(&ext))
            .unwrap_or(FileClass::Other)
    }

    /// Whether script-style rules (imports, require, JSX attributes) apply.
    pub fn has_script(&self) -> bool {
        matches!(self, FileClass::Script | FileClass::Component)
    }

    /// Whether markup rules (link/script/img tags) apply.
    pub fn has_markup(&self) -> bool {
        matches!(self, FileClass::Markup | FileClass::Component)
    }
}

/// The lower-cased extension of `path`, including the leading dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.to_lowercase()))
}
