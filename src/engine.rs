use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::FileDepConfig;
use crate::error::{FileDepError, Result};
use crate::graph::GraphSnapshot;
use crate::graph::directory::DirectoryEntry;
use crate::graph::filter::{ExtensionEntry, FilterState};
use crate::pipeline::{ScanOptions, ScanStats, build_graph};

/// Filtered dependency view: source file → files it depends on (or, for
/// [`DependencyGraphEngine::get_dependents`], files that depend on it).
pub type DependencyView = BTreeMap<PathBuf, Vec<PathBuf>>;

/// Owns the current graph and the user's filter state for a set of workspace roots.
///
/// Readers always see a complete snapshot: a scan builds a fresh
/// [`GraphSnapshot`] off to the side and swaps it in under a short write lock.
/// Every scan takes a generation ticket; a result is only published if no scan
/// with a later ticket has been published first.
pub struct DependencyGraphEngine {
    roots: Vec<PathBuf>,
    config: RwLock<FileDepConfig>,
    filters: RwLock<FilterState>,
    snapshot: RwLock<Arc<GraphSnapshot>>,
    next_generation: AtomicU64,
}

impl DependencyGraphEngine {
    /// Create an engine for `roots`, loading `filedep.toml` from the first root.
    pub fn new(roots: Vec<PathBuf>) -> Result<Self> {
        let first = roots.first().ok_or(FileDepError::NoRoots)?;
        let config = FileDepConfig::load(first);
        Self::with_config(roots, config)
    }

    pub fn with_config(roots: Vec<PathBuf>, config: FileDepConfig) -> Result<Self> {
        if roots.is_empty() {
            return Err(FileDepError::NoRoots);
        }
        let filters = FilterState::new(config.effective_target_extensions(), config.directory_toggle);
        Ok(Self {
            roots,
            config: RwLock::new(config),
            filters: RwLock::new(filters),
            snapshot: RwLock::new(Arc::new(GraphSnapshot::default())),
            next_generation: AtomicU64::new(0),
        })
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn config(&self) -> FileDepConfig {
        read(&self.config).clone()
    }

    /// Re-read `filedep.toml`. Target extensions and the toggle policy are
    /// replaced; individual extension and directory toggles are kept.
    pub fn reload_config(&self) {
        let config = FileDepConfig::load(&self.roots[0]);
        {
            let mut filters = write(&self.filters);
            filters
                .extensions
                .set_targets(&config.effective_target_extensions(), &config.ignored_extensions);
            filters.directories.set_policy(config.directory_toggle);
        }
        *write(&self.config) = config;
        tracing::info!("configuration reloaded");
    }

    /// Rescan every root and publish the result. Extraction and resolution run
    /// on the blocking pool so the async runtime stays responsive.
    pub async fn update_dependencies(&self) -> ScanStats {
        let generation = self.take_ticket();
        let roots = self.roots.clone();
        let options = self.scan_options();

        match tokio::task::spawn_blocking(move || build_graph(&roots, &options, generation)).await {
            Ok((snapshot, stats)) => {
                self.publish(snapshot);
                stats
            }
            Err(err) => {
                tracing::error!("scan {generation} did not complete: {err}");
                ScanStats {
                    generation,
                    ..ScanStats::default()
                }
            }
        }
    }

    /// Synchronous variant of [`update_dependencies`](Self::update_dependencies)
    /// for callers without a runtime.
    pub fn update_dependencies_blocking(&self) -> ScanStats {
        let generation = self.take_ticket();
        let (snapshot, stats) = build_graph(&self.roots, &self.scan_options(), generation);
        self.publish(snapshot);
        stats
    }

    fn take_ticket(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn scan_options(&self) -> ScanOptions {
        let targets = read(&self.filters).extensions.targets().to_vec();
        ScanOptions::from_config(&read(&self.config), targets)
    }

    /// Swap in `snapshot` unless a newer one is already published.
    fn publish(&self, snapshot: GraphSnapshot) -> bool {
        let mut current = write(&self.snapshot);
        if snapshot.generation <= current.generation {
            tracing::debug!(
                stale = snapshot.generation,
                current = current.generation,
                "discarding stale scan result"
            );
            return false;
        }
        tracing::debug!(generation = snapshot.generation, "publishing snapshot");
        *current = Arc::new(snapshot);
        true
    }

    /// The currently published snapshot, unfiltered.
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        Arc::clone(&read(&self.snapshot))
    }

    /// Forward mapping restricted to active files. Empty before the first scan.
    pub fn get_dependencies(&self) -> DependencyView {
        let snapshot = self.snapshot();
        read(&self.filters).apply(&snapshot, &snapshot.dependencies)
    }

    /// Reverse mapping restricted to active files.
    pub fn get_dependents(&self) -> DependencyView {
        let snapshot = self.snapshot();
        read(&self.filters).apply(&snapshot, &snapshot.dependents)
    }

    /// Every directory containing a scanned file, plus all ancestors, shallow to deep.
    pub fn get_unique_directories(&self) -> Vec<String> {
        self.snapshot().directories.clone()
    }

    /// [`get_unique_directories`](Self::get_unique_directories) with effective enabled state.
    pub fn get_directories(&self) -> Vec<DirectoryEntry> {
        let snapshot = self.snapshot();
        read(&self.filters).directories.entries(&snapshot.directories)
    }

    /// Replace the target extension list. Takes effect on the next scan; the
    /// filtered views switch immediately.
    pub fn set_target_extensions(&self, extensions: &[String]) {
        let ignored = read(&self.config).ignored_extensions.clone();
        write(&self.filters).extensions.set_targets(extensions, &ignored);
    }

    pub fn get_target_extensions(&self) -> Vec<ExtensionEntry> {
        read(&self.filters).extensions.entries()
    }

    pub fn set_extension_enabled(&self, extension: &str, enabled: bool) {
        write(&self.filters).extensions.set_enabled(extension, enabled);
    }

    pub fn is_extension_enabled(&self, extension: &str) -> bool {
        read(&self.filters).extensions.is_enabled(extension)
    }

    /// Toggle a workspace-relative directory. Disabling cascades to descendants;
    /// enabling follows the configured [`DirectoryTogglePolicy`](crate::config::DirectoryTogglePolicy).
    pub fn set_directory_enabled(&self, path: &str, enabled: bool) {
        let snapshot = self.snapshot();
        write(&self.filters)
            .directories
            .set_enabled(path, enabled, &snapshot.directories);
    }

    pub fn is_directory_enabled(&self, path: &str) -> bool {
        read(&self.filters).directories.is_enabled(path)
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
