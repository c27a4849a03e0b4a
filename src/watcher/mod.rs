pub mod event;

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use notify::RecursiveMode;
use notify_debouncer_mini::{DebounceEventResult, new_debouncer};
use tokio::sync::mpsc as tokio_mpsc;
use tokio::task::JoinHandle;

use crate::config::{CONFIG_FILE_NAME, FileDepConfig};
use crate::engine::DependencyGraphEngine;
use crate::error::{FileDepError, Result};
use crate::language::extension_of;
use crate::pipeline::{ScanStats, prepare_roots};

use event::WatchEvent;

const DEBOUNCE: Duration = Duration::from_millis(75);

/// Handle to a running watcher. Dropping it stops watching.
pub struct WatcherHandle {
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    _bridge_task: JoinHandle<()>,
}

/// Path filter applied before events reach the engine. Mirrors the walker's
/// directory exclusions so ignored trees never trigger a rescan.
///
/// Only the first root's `filedep.toml` is configuration, matching
/// [`DependencyGraphEngine::reload_config`].
struct WatchFilter {
    /// Each root with its `.gitignore` matcher when gitignore support is on.
    roots: Vec<(PathBuf, Option<Gitignore>)>,
    ignored_directories: Vec<String>,
}

impl WatchFilter {
    fn new(roots: &[PathBuf], config: &FileDepConfig) -> Self {
        let roots = roots
            .iter()
            .map(|root| {
                let gitignore = config
                    .respect_gitignore
                    .then(|| build_gitignore_matcher(root));
                (root.clone(), gitignore)
            })
            .collect();
        Self {
            roots,
            ignored_directories: config.ignored_directories.clone(),
        }
    }

    /// Rebuild from the first root's configuration after it changed on disk.
    fn reload(&mut self) {
        let roots: Vec<PathBuf> = self.roots.iter().map(|(root, _)| root.clone()).collect();
        if let Some(first) = roots.first() {
            *self = WatchFilter::new(&roots, &FileDepConfig::load(first));
            tracing::debug!("watch filter rebuilt");
        }
    }

    /// Classify a debounced path, or `None` if it should be ignored.
    fn classify(&self, path: &Path) -> Option<WatchEvent> {
        let position = self.roots.iter().position(|(r, _)| path.starts_with(r))?;
        let (root, gitignore) = &self.roots[position];
        let relative = path.strip_prefix(root).ok()?;

        let mut components = relative.components().peekable();
        while let Some(component) = components.next() {
            let Component::Normal(name) = component else {
                continue;
            };
            let name = name.to_string_lossy();
            // The last component is the file itself; only directories are filtered by name.
            let is_directory = components.peek().is_some();
            if is_directory
                && (name.starts_with('.')
                    || self.ignored_directories.iter().any(|d| d.as_str() == name.as_ref()))
            {
                return None;
            }
        }

        if gitignore
            .as_ref()
            .is_some_and(|gi| gi.matched_path_or_any_parents(path, path.is_dir()).is_ignore())
        {
            return None;
        }

        if position == 0 && relative == Path::new(CONFIG_FILE_NAME) {
            return Some(WatchEvent::ConfigChanged);
        }

        if path.exists() {
            Some(WatchEvent::Modified(path.to_path_buf()))
        } else {
            Some(WatchEvent::Deleted(path.to_path_buf()))
        }
    }
}

/// Root `.gitignore` matcher. Nested ignore files are honored by the walker on rescan.
fn build_gitignore_matcher(root: &Path) -> Gitignore {
    let mut builder = GitignoreBuilder::new(root);
    let path = root.join(".gitignore");
    if path.exists()
        && let Some(err) = builder.add(&path)
    {
        tracing::warn!("ignoring malformed {}: {err}", path.display());
    }
    builder.build().unwrap_or_else(|_| Gitignore::empty())
}

/// Start a debounced recursive watcher over every engine root.
///
/// Returns a handle that must be kept alive and a receiver of classified events.
pub fn start_watcher(
    roots: &[PathBuf],
    config: &FileDepConfig,
) -> Result<(WatcherHandle, tokio_mpsc::Receiver<WatchEvent>)> {
    // Event paths arrive canonical; match them against canonical roots.
    let roots = prepare_roots(roots);
    let (std_tx, std_rx) = std::sync::mpsc::channel::<DebounceEventResult>();

    let mut debouncer = new_debouncer(DEBOUNCE, move |res| {
        let _ = std_tx.send(res);
    })
    .map_err(|source| FileDepError::Watch {
        path: roots.first().cloned().unwrap_or_default(),
        source,
    })?;
    for root in &roots {
        debouncer
            .watcher()
            .watch(root, RecursiveMode::Recursive)
            .map_err(|source| FileDepError::Watch {
                path: root.clone(),
                source,
            })?;
    }

    let mut filter = WatchFilter::new(&roots, config);
    let (tokio_tx, tokio_rx) = tokio_mpsc::channel::<WatchEvent>(256);

    let bridge_task = tokio::task::spawn_blocking(move || {
        while let Ok(result) = std_rx.recv() {
            match result {
                Ok(events) => {
                    for debounced in events {
                        let Some(event) = filter.classify(&debounced.path) else {
                            continue;
                        };
                        if event == WatchEvent::ConfigChanged {
                            filter.reload();
                        }
                        if tokio_tx.blocking_send(event).is_err() {
                            return;
                        }
                    }
                }
                Err(err) => tracing::warn!("watch error: {err:?}"),
            }
        }
    });

    Ok((
        WatcherHandle {
            _debouncer: debouncer,
            _bridge_task: bridge_task,
        },
        tokio_rx,
    ))
}

/// Whether an event can change the graph given the current target extensions.
///
/// Deletions always count: the path may have been a directory full of sources.
fn is_relevant(event: &WatchEvent, targets: &[String]) -> bool {
    match event {
        WatchEvent::ConfigChanged | WatchEvent::Deleted(_) => true,
        WatchEvent::Modified(path) => extension_of(path).is_some_and(|ext| targets.contains(&ext)),
    }
}

/// Drive full rescans from watch events until the channel closes.
///
/// Events that arrive while a batch is pending are coalesced into one rescan.
/// `on_update` runs after every published scan.
pub async fn run_watch_loop(
    engine: Arc<DependencyGraphEngine>,
    mut events: tokio_mpsc::Receiver<WatchEvent>,
    mut on_update: impl FnMut(&ScanStats),
) {
    while let Some(first) = events.recv().await {
        let mut batch = vec![first];
        while let Ok(next) = events.try_recv() {
            batch.push(next);
        }

        if batch.contains(&WatchEvent::ConfigChanged) {
            engine.reload_config();
        }

        let targets: Vec<String> = engine
            .get_target_extensions()
            .into_iter()
            .map(|e| e.extension)
            .collect();
        let relevant: Vec<&WatchEvent> = batch.iter().filter(|e| is_relevant(e, &targets)).collect();
        if relevant.is_empty() {
            continue;
        }
        for event in &relevant {
            if let Some(path) = event.path() {
                tracing::debug!("change: {}", path.display());
            }
        }

        let stats = engine.update_dependencies().await;
        tracing::info!(
            files = stats.files,
            edges = stats.edges,
            "rescanned after {} change(s)",
            relevant.len()
        );
        on_update(&stats);
    }
}
