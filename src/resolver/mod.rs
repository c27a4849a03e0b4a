pub mod path_resolver;

pub use path_resolver::{ResolutionOutcome, normalize_path, resolve_specifier};

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::language::FileClass;

/// Per-file resolution result.
#[derive(Debug, Default)]
pub struct FileResolution {
    /// Existing files the source depends on.
    pub resolved: BTreeSet<PathBuf>,
    /// Number of specifiers that matched nothing on disk.
    pub unresolved: usize,
}

/// Resolve every specifier extracted from `source`.
///
/// The base directory is the parent of `source`. Misses are counted and logged
/// at debug level, never reported as errors.
pub fn resolve_file_dependencies<'a>(
    source: &Path,
    specifiers: impl IntoIterator<Item = &'a String>,
    candidates: &[String],
) -> FileResolution {
    let mut result = FileResolution::default();
    let Some(base_dir) = source.parent() else {
        return result;
    };

    for specifier in specifiers {
        match resolve_specifier(base_dir, specifier, candidates) {
            ResolutionOutcome::Resolved(target) => {
                // An index file importing its own directory resolves to itself.
                if target != source {
                    result.resolved.insert(target);
                }
            }
            ResolutionOutcome::Unresolved(reason) => {
                result.unresolved += 1;
                tracing::debug!(
                    "{}: '{}' unresolved ({reason})",
                    source.display(),
                    specifier
                );
            }
        }
    }

    result
}

/// The candidate extensions used for extension-less specifiers from a file of `class`.
///
/// Stylesheets only resolve against stylesheet extensions (`@import 'reset'` never
/// means `reset.ts`); every other class uses the full list in precedence order.
pub fn candidates_for(class: FileClass, all: &[String]) -> Vec<String> {
    match class {
        FileClass::Stylesheet => all
            .iter()
            .filter(|ext| FileClass::from_extension(ext) == FileClass::Stylesheet)
            .cloned()
            .collect(),
        _ => all.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_candidates_for_stylesheet() {
        let all = exts(&[".ts", ".css", ".js", ".scss"]);
        assert_eq!(candidates_for(FileClass::Stylesheet, &all), exts(&[".css", ".scss"]));
        assert_eq!(candidates_for(FileClass::Script, &all), all);
    }

    #[test]
    fn test_resolve_file_dependencies_counts_misses() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.ts"), "").unwrap();
        fs::write(src.join("b.ts"), "").unwrap();

        let specs = exts(&["./b", "./missing", "./b.ts"]);
        let result = resolve_file_dependencies(&src.join("a.ts"), &specs, &exts(&[".ts"]));

        assert_eq!(result.resolved.len(), 1, "both spellings resolve to one target");
        assert!(result.resolved.contains(&src.join("b.ts")));
        assert_eq!(result.unresolved, 1);
    }

    #[test]
    fn test_self_reference_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("index.ts");
        fs::write(&index, "").unwrap();

        let specs = exts(&["./index"]);
        let result = resolve_file_dependencies(&index, &specs, &exts(&[".ts"]));
        assert!(result.resolved.is_empty());
        assert_eq!(result.unresolved, 0);
    }
}
