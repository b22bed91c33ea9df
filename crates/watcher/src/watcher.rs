//! Registry of watched roots and the periodic scan loop

use crate::coordinator::{RootCoordinator, ScanReport};
use crate::error::WatchError;
use crate::hasher::ContentHasher;
use crate::ignore::IgnoreRules;
use crate::options::WatchOptions;
use crate::walk::list_files;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use store::{ErrorSink, RootSetting, SledSnapshotStore, SnapshotStore, StoreError};
use sw_core::{byte_count_iec, normalize_path};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

struct WatchedRoot {
    options: WatchOptions,
    ignore: IgnoreRules,
    coordinator: RootCoordinator,
}

/// Tracks any number of roots against one store and one hasher
pub struct Watcher<S = SledSnapshotStore> {
    store: S,
    hasher: ContentHasher,
    roots: BTreeMap<PathBuf, WatchedRoot>,
}

impl<S: SnapshotStore> Watcher<S> {
    pub fn new(store: S, hasher: ContentHasher) -> Self {
        Self {
            store,
            hasher,
            roots: BTreeMap::new(),
        }
    }

    pub fn hasher(&self) -> &ContentHasher {
        &self.hasher
    }

    /// Register a root
    ///
    /// The path is made absolute first. Registering a root again replaces its
    /// options and forgets its prior state.
    pub fn add(&mut self, path: impl AsRef<Path>, options: WatchOptions) -> Result<PathBuf, WatchError> {
        let root = absolute(path.as_ref())?;

        match std::fs::metadata(&root) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WatchError::PathNotFound(root));
            }
            Err(source) => return Err(WatchError::Io { path: root, source }),
        }

        let ignore = IgnoreRules::new(&root, &options.ignore)?;
        debug!("Ignore patterns of {}: {:?}", root.display(), ignore.patterns());
        self.roots.insert(
            root.clone(),
            WatchedRoot {
                options,
                ignore,
                coordinator: RootCoordinator::new(root.clone()),
            },
        );

        info!("Add path: {}", root.display());
        Ok(root)
    }

    /// Forget a root; returns whether it was registered
    pub fn remove(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let root = absolute(path).unwrap_or_else(|_| path.to_path_buf());
        self.roots.remove(&root).is_some()
    }

    /// Registered roots, in path order
    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        self.roots.keys().map(PathBuf::as_path)
    }

    pub fn options(&self, root: &Path) -> Option<&WatchOptions> {
        self.roots.get(root).map(|r| &r.options)
    }

    /// Metadata of the last load or save of `root`
    pub fn setting(&self, root: &Path) -> Option<&RootSetting> {
        self.roots.get(root).and_then(|r| r.coordinator.setting())
    }

    /// Load the prior state of every root
    ///
    /// Every root is attempted; roots whose state cannot be read start empty
    /// and their errors are returned together.
    pub fn load_all(&mut self) -> Result<(), StoreError> {
        let mut sink = ErrorSink::new();
        for (root, watched) in self.roots.iter_mut() {
            let result = watched.coordinator.load(&self.store);
            if let Err(e) = &result {
                warn!("Failed to load state of {}: {}", root.display(), e);
            }
            sink.attempt(result);
        }
        sink.finish()
    }

    /// Scan every root once
    ///
    /// A root that cannot be listed is reported as failed without affecting
    /// the others.
    pub fn scan_all(&mut self) -> Vec<ScanReport> {
        let mut reports = Vec::with_capacity(self.roots.len());

        for (root, watched) in self.roots.iter_mut() {
            info!("mapping files of {:?}...", root.display().to_string());
            let current = match list_files(root, &watched.options, &watched.ignore) {
                Ok(files) => files,
                Err(e) => {
                    warn!("Failed to list {}: {}", root.display(), e);
                    reports.push(ScanReport::failed(root, e));
                    continue;
                }
            };

            let stats = current.stats();
            info!(
                "mapping files of {:?} done, total size: {}, files: {}, directories: {}, symlinks: {}",
                root.display().to_string(),
                byte_count_iec(stats.total_size),
                stats.file_count,
                stats.dir_count,
                stats.link_count
            );

            reports.push(watched.coordinator.scan(current, &self.hasher, &self.store));
        }

        reports
    }
}

fn absolute(path: &Path) -> Result<PathBuf, WatchError> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| WatchError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .join(path)
    };
    Ok(PathBuf::from(normalize_path(&joined.to_string_lossy())))
}

/// Scan every `period` until Ctrl-C, passing each round's reports to `handler`
///
/// Scans run on the blocking pool; the first one starts immediately.
pub async fn run<S, F>(watcher: Arc<Mutex<Watcher<S>>>, period: Duration, mut handler: F) -> Result<(), WatchError>
where
    S: SnapshotStore + 'static,
    F: FnMut(Vec<ScanReport>) + Send,
{
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Watching every {:?}, press Ctrl-C to stop", period);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                let watcher = Arc::clone(&watcher);
                let reports = tokio::task::spawn_blocking(move || watcher.lock().scan_all()).await?;
                debug!("Scan round done for {} roots", reports.len());
                handler(reports);
            }
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Stopping watch loop");
                return Ok(());
            }
        }
    }
}
