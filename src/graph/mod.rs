pub mod directory;
pub mod filter;
pub mod node;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use petgraph::Directed;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use serde::Serialize;

use directory::normalize_directory;
use node::FileNode;

/// Source file → set of files it depends on (or, for the reverse view, is depended on by).
pub type DependencyMap = BTreeMap<PathBuf, BTreeSet<PathBuf>>;

/// One published scan result. Immutable once built; a new scan produces a new snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphSnapshot {
    /// Scan ticket that produced this snapshot. `0` is the empty initial snapshot.
    pub generation: u64,
    /// Workspace roots that were scanned.
    pub roots: Vec<PathBuf>,
    /// Every scanned file.
    pub files: BTreeMap<PathBuf, FileNode>,
    /// Forward mapping. Every scanned file is a key, possibly with an empty set.
    pub dependencies: DependencyMap,
    /// Reverse mapping, derived from `dependencies`.
    pub dependents: DependencyMap,
    /// Filter-tree directories, sorted shallow to deep.
    pub directories: Vec<String>,
}

impl GraphSnapshot {
    /// Assemble a snapshot and derive its reverse mapping and directory list.
    ///
    /// `explicit_directories`, when given, replaces the auto-derived ancestor list.
    pub fn new(
        generation: u64,
        roots: Vec<PathBuf>,
        files: BTreeMap<PathBuf, FileNode>,
        dependencies: DependencyMap,
        explicit_directories: Option<&[String]>,
    ) -> Self {
        let dependents = derive_dependents(&dependencies);
        let directories = match explicit_directories {
            Some(list) => sort_directories(list.iter().map(|d| normalize_directory(d)).collect()),
            None => unique_directories(files.values().map(|f| f.directory.as_str())),
        };
        Self {
            generation,
            roots,
            files,
            dependencies,
            dependents,
            directories,
        }
    }

    pub fn file_count(&self) -> usize {
        self.dependencies.len()
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(BTreeSet::len).sum()
    }

    /// Files with neither outgoing nor incoming edges.
    pub fn isolated_files(&self) -> Vec<&PathBuf> {
        self.dependencies
            .iter()
            .filter(|(path, deps)| {
                deps.is_empty() && self.dependents.get(*path).is_none_or(BTreeSet::is_empty)
            })
            .map(|(path, _)| path)
            .collect()
    }
}

/// Invert a forward mapping. Every forward key and every target appears as a key.
pub fn derive_dependents(dependencies: &DependencyMap) -> DependencyMap {
    let mut reverse: DependencyMap = dependencies
        .keys()
        .map(|k| (k.clone(), BTreeSet::new()))
        .collect();
    for (source, targets) in dependencies {
        for target in targets {
            reverse
                .entry(target.clone())
                .or_default()
                .insert(source.clone());
        }
    }
    reverse
}

/// Every ancestor of every given directory (by path segment), including the
/// root `""` and the directories themselves, sorted shallow to deep.
pub fn unique_directories<'a>(directories: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut found: BTreeSet<String> = BTreeSet::new();
    for dir in directories {
        found.insert(String::new());
        let mut current = String::new();
        for segment in dir.split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            found.insert(current.clone());
        }
    }
    sort_directories(found.into_iter().collect())
}

fn directory_depth(dir: &str) -> usize {
    if dir.is_empty() {
        0
    } else {
        dir.split('/').count()
    }
}

/// Sort by depth, then lexicographically, dropping duplicates.
pub fn sort_directories(mut directories: Vec<String>) -> Vec<String> {
    directories.sort_by(|a, b| {
        directory_depth(a)
            .cmp(&directory_depth(b))
            .then_with(|| a.cmp(b))
    });
    directories.dedup();
    directories
}

/// A petgraph view of a filtered mapping, used by the exporters.
pub struct FileGraph {
    pub graph: StableGraph<FileNode, (), Directed>,
    /// Maps file paths to their node indices for O(1) lookup.
    pub index: HashMap<PathBuf, NodeIndex>,
}

impl FileGraph {
    /// Build from a (filtered) mapping. Targets missing from `snapshot.files`
    /// get a node with metadata relative to the first root.
    pub fn from_mapping(snapshot: &GraphSnapshot, mapping: &BTreeMap<PathBuf, Vec<PathBuf>>) -> Self {
        let mut fg = FileGraph {
            graph: StableGraph::new(),
            index: HashMap::new(),
        };
        for (source, targets) in mapping {
            let from = fg.add_file(snapshot, source);
            for target in targets {
                let to = fg.add_file(snapshot, target);
                fg.graph.add_edge(from, to, ());
            }
        }
        fg
    }

    fn add_file(&mut self, snapshot: &GraphSnapshot, path: &PathBuf) -> NodeIndex {
        if let Some(&existing) = self.index.get(path) {
            return existing;
        }
        let node = match snapshot.files.get(path) {
            Some(node) => node.clone(),
            None => {
                let root = snapshot
                    .roots
                    .iter()
                    .find(|r| path.starts_with(r))
                    .or(snapshot.roots.first())
                    .cloned()
                    .unwrap_or_default();
                FileNode::new(path.clone(), &root)
            }
        };
        let idx = self.graph.add_node(node);
        self.index.insert(path.clone(), idx);
        idx
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
