use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::config::FileDepConfig;
use crate::language::extension_of;

/// Parameters for a single collection pass.
#[derive(Debug, Clone, Default)]
pub struct CollectOptions {
    /// Normalized extensions (lower case, leading dot) to include.
    pub target_extensions: Vec<String>,
    /// Directory names never descended into.
    pub ignored_directories: Vec<String>,
    /// Glob patterns excluded from collection.
    pub exclude: Vec<String>,
    /// Honor `.gitignore` files.
    pub respect_gitignore: bool,
}

impl CollectOptions {
    pub fn from_config(config: &FileDepConfig, target_extensions: Vec<String>) -> Self {
        Self {
            target_extensions,
            ignored_directories: config.ignored_directories.clone(),
            exclude: config.exclude.clone(),
            respect_gitignore: config.respect_gitignore,
        }
    }
}

/// Walk a workspace root and collect every file whose extension is a target extension.
///
/// Hidden directories and `ignored_directories` below the root are skipped.
/// A directory that cannot be read is logged and its subtree skipped; the walk
/// continues with its siblings.
pub fn collect_files(root: &Path, options: &CollectOptions) -> BTreeSet<PathBuf> {
    let mut files = BTreeSet::new();
    if options.target_extensions.is_empty() {
        tracing::debug!("no target extensions; nothing to collect under {}", root.display());
        return files;
    }

    let targets: HashSet<&str> = options
        .target_extensions
        .iter()
        .map(String::as_str)
        .collect();

    walk_files(root, options, |path| {
        if let Some(ext) = extension_of(path)
            && targets.contains(ext.as_str())
        {
            tracing::trace!("collected {}", path.display());
            files.insert(path.to_path_buf());
        }
    });

    files
}

/// Walk a workspace root and return every file extension present (lower case, leading dot).
///
/// Applies the same directory exclusions as [`collect_files`]. Used as an
/// optional pre-pass to narrow the target extension list.
pub fn discover_extensions(root: &Path, options: &CollectOptions) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    walk_files(root, options, |path| {
        if let Some(ext) = extension_of(path) {
            found.insert(ext);
        }
    });
    found
}

/// Shared traversal: calls `visit` for every regular file that survives the
/// directory and glob exclusions.
fn walk_files(root: &Path, options: &CollectOptions, mut visit: impl FnMut(&Path)) {
    let ignored: HashSet<String> = options.ignored_directories.iter().cloned().collect();
    let patterns = compile_patterns(&options.exclude);

    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .git_ignore(options.respect_gitignore)
        // Read .gitignore files even when the directory is not inside a git repository.
        .require_git(false)
        .filter_entry(move |entry| {
            // The root is walked even when its own name looks hidden (e.g. temp dirs).
            if entry.depth() == 0 {
                return true;
            }
            let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
            if !is_dir {
                return true;
            }
            let name = entry.file_name().to_str().unwrap_or("");
            !is_skipped_directory(name, &ignored)
        })
        .build();

    for result in walker {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!("skipping unreadable path under {}: {err}", root.display());
                continue;
            }
        };

        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if is_excluded_by_patterns(relative, &patterns) {
            continue;
        }

        visit(path);
    }
}

/// Returns true if a directory with this name is never descended into.
fn is_skipped_directory(name: &str, ignored: &HashSet<String>) -> bool {
    name.starts_with('.') || ignored.contains(name)
}

fn compile_patterns(patterns: &[String]) -> Vec<glob::Pattern> {
    patterns
        .iter()
        .filter_map(|p| match glob::Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                tracing::warn!("ignoring invalid exclude pattern '{p}': {err}");
                None
            }
        })
        .collect()
}

/// Returns true if the root-relative `path` matches any exclusion pattern,
/// either as a whole or by one of its components.
fn is_excluded_by_patterns(path: &Path, patterns: &[glob::Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let path_str = path.to_string_lossy();
    patterns.iter().any(|pattern| {
        pattern.matches(&path_str)
            || path
                .components()
                .filter_map(|c| c.as_os_str().to_str())
                .any(|s| pattern.matches(s))
    })
}
