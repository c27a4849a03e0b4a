use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::FileDepConfig;
use crate::error::{FileDepError, Result};
use crate::graph::node::FileNode;
use crate::graph::{DependencyMap, GraphSnapshot};
use crate::parser::extract_imports;
use crate::resolver::{candidates_for, normalize_path, resolve_file_dependencies};
use crate::walker::{CollectOptions, collect_files, discover_extensions};

/// Everything one scan needs, detached from the engine so it can move into a blocking task.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Scan targets and resolution candidates, in precedence order.
    pub target_extensions: Vec<String>,
    pub collect: CollectOptions,
    pub max_file_size: u64,
    pub concurrency: usize,
    pub detect_extensions: bool,
    pub explicit_directories: Option<Vec<String>>,
}

impl ScanOptions {
    pub fn from_config(config: &FileDepConfig, target_extensions: Vec<String>) -> Self {
        Self {
            collect: CollectOptions::from_config(config, target_extensions.clone()),
            target_extensions,
            max_file_size: config.max_file_size,
            concurrency: config.concurrency,
            detect_extensions: config.detect_extensions,
            explicit_directories: config.directories.clone(),
        }
    }
}

/// Aggregate statistics for one scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStats {
    pub generation: u64,
    pub roots: usize,
    pub files: usize,
    pub edges: usize,
    /// Relative specifiers that matched no file.
    pub unresolved: usize,
    /// Files kept as empty nodes because they could not be read.
    pub unreadable: usize,
    /// Files kept as empty nodes because they exceed the size ceiling.
    pub oversized: usize,
    /// Files with neither dependencies nor dependents.
    pub isolated: usize,
    pub directories: usize,
    pub elapsed_secs: f64,
}

/// Per-file result of the extract+resolve stage.
struct FileAnalysis {
    resolved: BTreeSet<PathBuf>,
    unresolved: usize,
    failure: Option<FileDepError>,
}

/// Run one full scan over `roots`: collect, extract, resolve, aggregate.
///
/// Never fails: unreadable directories are skipped, unreadable or over-size
/// files become nodes without edges, and an empty target list yields an empty
/// graph.
pub fn build_graph(
    roots: &[PathBuf],
    options: &ScanOptions,
    generation: u64,
) -> (GraphSnapshot, ScanStats) {
    let started = Instant::now();
    let roots = prepare_roots(roots);

    tracing::debug!(generation, "scan: collecting");
    let targets = effective_targets(&roots, options);
    let collect = CollectOptions {
        target_extensions: targets.clone(),
        ..options.collect.clone()
    };

    let mut files: BTreeMap<PathBuf, FileNode> = BTreeMap::new();
    for root in &roots {
        for path in collect_files(root, &collect) {
            files
                .entry(path.clone())
                .or_insert_with(|| FileNode::new(path, root));
        }
    }

    tracing::debug!(generation, files = files.len(), "scan: extracting and resolving");
    let work = || {
        files
            .par_iter()
            .map(|(path, node)| (path.clone(), analyze_file(node, &targets, options.max_file_size)))
            .collect::<Vec<_>>()
    };
    let analyses = match build_pool(options.concurrency) {
        Some(pool) => pool.install(work),
        None => work(),
    };

    tracing::debug!(generation, "scan: aggregating");
    let mut stats = ScanStats {
        generation,
        roots: roots.len(),
        ..ScanStats::default()
    };
    let mut dependencies = DependencyMap::new();
    for (path, analysis) in analyses {
        stats.unresolved += analysis.unresolved;
        match analysis.failure {
            Some(FileDepError::TooLarge { .. }) => stats.oversized += 1,
            Some(_) => stats.unreadable += 1,
            None => {}
        }
        dependencies.insert(path, analysis.resolved);
    }

    let snapshot = GraphSnapshot::new(
        generation,
        roots,
        files,
        dependencies,
        options.explicit_directories.as_deref(),
    );

    stats.files = snapshot.file_count();
    stats.edges = snapshot.edge_count();
    stats.isolated = snapshot.isolated_files().len();
    stats.directories = snapshot.directories.len();
    stats.elapsed_secs = started.elapsed().as_secs_f64();
    tracing::debug!(generation, files = stats.files, edges = stats.edges, "scan: ready");

    (snapshot, stats)
}

/// Read, extract and resolve one file. Failures leave the file with no edges.
fn analyze_file(node: &FileNode, targets: &[String], max_file_size: u64) -> FileAnalysis {
    let content = match read_source(&node.path, max_file_size) {
        Ok(content) => content,
        Err(err) => {
            match &err {
                FileDepError::TooLarge { .. } => tracing::debug!("{err}; keeping as an empty node"),
                _ => tracing::warn!("{err}; keeping as an empty node"),
            }
            return FileAnalysis {
                resolved: BTreeSet::new(),
                unresolved: 0,
                failure: Some(err),
            };
        }
    };

    let specifiers = extract_imports(&content, node.class);
    let candidates = candidates_for(node.class, targets);
    let resolution = resolve_file_dependencies(&node.path, &specifiers, &candidates);

    FileAnalysis {
        resolved: resolution.resolved,
        unresolved: resolution.unresolved,
        failure: None,
    }
}

/// Read a file as text, refusing anything above `max_file_size`. Invalid UTF-8 is replaced.
pub fn read_source(path: &Path, max_file_size: u64) -> Result<String> {
    let metadata = std::fs::metadata(path).map_err(|source| FileDepError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.len() > max_file_size {
        return Err(FileDepError::TooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            limit: max_file_size,
        });
    }

    let bytes = std::fs::read(path).map_err(|source| FileDepError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Make roots absolute and canonical so collected paths and resolved targets
/// share one spelling. Duplicates are dropped.
pub fn prepare_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::with_capacity(roots.len());
    for root in roots {
        let prepared = match std::fs::canonicalize(root) {
            Ok(p) => p,
            Err(err) => {
                tracing::warn!("cannot canonicalize {}: {err}", root.display());
                let absolute = std::env::current_dir()
                    .map(|cwd| cwd.join(root))
                    .unwrap_or_else(|_| root.clone());
                normalize_path(&absolute)
            }
        };
        if !out.contains(&prepared) {
            out.push(prepared);
        }
    }
    out
}

/// The configured targets, optionally narrowed to extensions present on disk.
fn effective_targets(roots: &[PathBuf], options: &ScanOptions) -> Vec<String> {
    if !options.detect_extensions {
        return options.target_extensions.clone();
    }

    let mut present = BTreeSet::new();
    for root in roots {
        present.extend(discover_extensions(root, &options.collect));
    }
    let narrowed: Vec<String> = options
        .target_extensions
        .iter()
        .filter(|ext| present.contains(*ext))
        .cloned()
        .collect();
    tracing::debug!("detected extensions: {narrowed:?}");
    narrowed
}

/// A dedicated pool bounds file-descriptor use on large trees. `0` means the global pool.
fn build_pool(concurrency: usize) -> Option<rayon::ThreadPool> {
    if concurrency == 0 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .thread_name(|i| format!("filedep-scan-{i}"))
        .build()
    {
        Ok(pool) => Some(pool),
        Err(err) => {
            tracing::warn!("failed to build a {concurrency}-thread pool: {err}; using the global pool");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("tempdir")
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn options(config: &FileDepConfig) -> ScanOptions {
        ScanOptions::from_config(config, config.effective_target_extensions())
    }

    fn rel_map(snapshot: &GraphSnapshot) -> BTreeMap<String, Vec<String>> {
        let root = &snapshot.roots[0];
        let rel = |p: &PathBuf| {
            p.strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        };
        snapshot
            .dependencies
            .iter()
            .map(|(k, v)| (rel(k), v.iter().map(rel).collect()))
            .collect()
    }

    #[test]
    fn test_example_workspace() {
        let dir = tmp();
        write(dir.path(), "src/a.ts", "import {B} from './b'\nimport './c'\n");
        write(dir.path(), "src/b.ts", "export const B = 1;\n");
        write(dir.path(), "src/c/index.ts", "");

        let config = FileDepConfig::default();
        let (snapshot, stats) = build_graph(&[dir.path().to_path_buf()], &options(&config), 1);

        let expected: BTreeMap<String, Vec<String>> = [
            ("src/a.ts", vec!["src/b.ts", "src/c/index.ts"]),
            ("src/b.ts", vec![]),
            ("src/c/index.ts", vec![]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into_iter().map(String::from).collect()))
        .collect();
        assert_eq!(rel_map(&snapshot), expected);
        assert_eq!(snapshot.directories, vec!["", "src", "src/c"]);
        assert_eq!(stats.files, 3);
        assert_eq!(stats.edges, 2);
        assert_eq!(stats.isolated, 0);
        assert_eq!(stats.generation, 1);
    }

    #[test]
    fn test_package_import_never_produces_edge() {
        let dir = tmp();
        write(dir.path(), "a.ts", "import x from 'b';\nimport y from 'b.ts';");
        write(dir.path(), "b.ts", "");
        let config = FileDepConfig::default();
        let (snapshot, _) = build_graph(&[dir.path().to_path_buf()], &options(&config), 1);
        assert_eq!(snapshot.edge_count(), 0);
    }

    #[test]
    fn test_all_edge_targets_are_regular_files() {
        let dir = tmp();
        write(
            dir.path(),
            "src/main.js",
            "import a from './a';\nimport s from './style.css';\nrequire('./gone');",
        );
        write(dir.path(), "src/a.jsx", "");
        write(dir.path(), "src/style.css", "@import './base';\n");
        write(dir.path(), "src/base.css", "");

        let config = FileDepConfig::default();
        let (snapshot, stats) = build_graph(&[dir.path().to_path_buf()], &options(&config), 1);
        for targets in snapshot.dependencies.values() {
            for t in targets {
                assert!(t.is_file(), "{} should be a file", t.display());
            }
        }
        assert_eq!(stats.edges, 3);
        assert_eq!(stats.unresolved, 1);
    }

    #[test]
    fn test_oversized_and_non_utf8_files_are_still_nodes() {
        let dir = tmp();
        write(dir.path(), "big.ts", &format!("import './b';\n{}", "x".repeat(64)));
        write(dir.path(), "b.ts", "");
        fs::write(dir.path().join("bin.ts"), [0xff, 0xfe, b'\n']).unwrap();

        let config = FileDepConfig {
            max_file_size: 32,
            ..FileDepConfig::default()
        };
        let (snapshot, stats) = build_graph(&[dir.path().to_path_buf()], &options(&config), 1);
        assert_eq!(stats.files, 3);
        assert_eq!(stats.oversized, 1);
        assert_eq!(stats.edges, 0);
        assert_eq!(stats.isolated, 3);
        assert!(snapshot.dependencies.values().all(BTreeSet::is_empty));
    }

    #[test]
    fn test_file_removed_after_collection_is_an_empty_node() {
        let dir = tmp();
        write(dir.path(), "gone.ts", "import './b';");
        write(dir.path(), "b.ts", "");
        let node = FileNode::new(dir.path().join("gone.ts"), dir.path());
        fs::remove_file(&node.path).unwrap();

        let analysis = analyze_file(&node, &[".ts".to_string()], 1024);
        assert!(analysis.resolved.is_empty());
        assert_eq!(analysis.unresolved, 0);
        assert!(matches!(analysis.failure, Some(FileDepError::Read { .. })));
        assert!(matches!(
            read_source(&node.path, 1024),
            Err(FileDepError::Read { .. })
        ));
    }

    #[test]
    fn test_rescan_is_stable() {
        let dir = tmp();
        write(dir.path(), "a.ts", "import './b'; import './c';");
        write(dir.path(), "b.ts", "import './c';");
        write(dir.path(), "c.ts", "");
        let config = FileDepConfig {
            concurrency: 2,
            ..FileDepConfig::default()
        };
        let roots = [dir.path().to_path_buf()];
        let (first, _) = build_graph(&roots, &options(&config), 1);
        let (second, _) = build_graph(&roots, &options(&config), 2);
        assert_eq!(first.dependencies, second.dependencies);
    }

    #[test]
    fn test_empty_target_list_gives_empty_graph() {
        let dir = tmp();
        write(dir.path(), "a.ts", "");
        let config = FileDepConfig {
            target_extensions: Some(Vec::new()),
            ..FileDepConfig::default()
        };
        let (snapshot, stats) = build_graph(&[dir.path().to_path_buf()], &options(&config), 1);
        assert!(snapshot.dependencies.is_empty());
        assert_eq!(stats.files, 0);
    }

    #[test]
    fn test_multiple_roots_are_unioned() {
        let one = tmp();
        let two = tmp();
        write(one.path(), "a.ts", "");
        write(two.path(), "lib/b.ts", "");

        let config = FileDepConfig::default();
        let roots = [one.path().to_path_buf(), two.path().to_path_buf(), one.path().to_path_buf()];
        let (snapshot, stats) = build_graph(&roots, &options(&config), 1);
        assert_eq!(stats.roots, 2);
        assert_eq!(stats.files, 2);
        assert_eq!(snapshot.directories, vec!["", "lib"]);
    }

    #[test]
    fn test_detect_extensions_narrows_targets() {
        let dir = tmp();
        write(dir.path(), "a.ts", "import './b';");
        write(dir.path(), "b.ts", "");
        let config = FileDepConfig {
            detect_extensions: true,
            ..FileDepConfig::default()
        };
        let opts = options(&config);
        let roots = prepare_roots(&[dir.path().to_path_buf()]);
        assert_eq!(effective_targets(&roots, &opts), vec![".ts"]);

        let (snapshot, _) = build_graph(&roots, &opts, 1);
        assert_eq!(snapshot.edge_count(), 1);
    }

    #[test]
    fn test_stylesheet_resolves_only_stylesheets() {
        let dir = tmp();
        write(dir.path(), "main.css", "@import './theme';");
        write(dir.path(), "theme.js", "");
        let config = FileDepConfig::default();
        let (snapshot, _) = build_graph(&[dir.path().to_path_buf()], &options(&config), 1);
        assert_eq!(snapshot.edge_count(), 0);

        write(dir.path(), "theme.css", "");
        let (snapshot, _) = build_graph(&[dir.path().to_path_buf()], &options(&config), 2);
        assert_eq!(snapshot.edge_count(), 1);
    }
}
