//! Per-root change tracking
//!
//! A [`RootCoordinator`] owns the in-memory snapshot of one root. Each scan
//! compares a fresh listing against it, hashes what may have changed,
//! resolves moves and renames, and persists the new snapshot when anything
//! differs.

use crate::event::{Event, Op, OpSet};
use crate::hasher::ContentHasher;
use serde::Serialize;
use std::path::{Path, PathBuf};
use store::{RootSetting, SnapshotStore, StoreError};
use sw_core::{
    compare_changes, resolve_identity, ChangeSet, FileCollection, FileStats, HashAlgorithm, Relocations,
};
use tracing::{debug, error, info};

/// Counts of one scan, per kind of change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub moved: usize,
    pub renamed: usize,
}

impl ScanSummary {
    pub fn total(&self) -> usize {
        self.created + self.updated + self.deleted + self.moved + self.renamed
    }
}

/// Result of scanning one root
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub root: PathBuf,
    pub changes: ChangeSet,
    pub relocations: Relocations,
    /// Stats of the current listing
    pub stats: FileStats,
    /// Whether the new snapshot was persisted
    pub saved: bool,
    /// Why the root could not be scanned or persisted
    pub error: Option<String>,
}

impl ScanReport {
    /// A root that could not be scanned at all
    pub fn failed(root: &Path, error: impl ToString) -> Self {
        Self {
            root: root.to_path_buf(),
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            created: self.changes.created.len(),
            updated: self.changes.updated.len(),
            deleted: self.changes.deleted.len(),
            moved: self.relocations.moved.len(),
            renamed: self.relocations.renamed.len(),
        }
    }

    /// Nothing changed
    pub fn is_unchanged(&self) -> bool {
        self.changes.is_empty() && self.relocations.is_empty()
    }

    /// Changes as events, keeping only the operations in `ops`
    pub fn events(&self, ops: OpSet) -> Vec<Event> {
        let mut events = Vec::new();

        for entry in self.changes.created.values() {
            events.push(Event::new(Op::Create, entry));
        }
        for entry in self.changes.updated.values() {
            events.push(Event::new(Op::Write, entry));
        }
        for entry in self.changes.deleted.values() {
            events.push(Event::new(Op::Remove, entry));
        }
        for (old_path, entry) in self.relocations.renamed.iter() {
            events.push(Event::relocated(Op::Rename, old_path, entry));
        }
        for (old_path, entry) in self.relocations.moved.iter() {
            events.push(Event::relocated(Op::Move, old_path, entry));
        }

        events.retain(|event| ops.contains(event.op));
        events
    }
}

/// Owns the snapshot of one root between loads and saves
#[derive(Debug, Clone)]
pub struct RootCoordinator {
    root: PathBuf,
    files: FileCollection,
    setting: Option<RootSetting>,
}

impl RootCoordinator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: FileCollection::new(),
            setting: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshot the next scan is compared against
    pub fn files(&self) -> &FileCollection {
        &self.files
    }

    /// Metadata of the last load or save
    pub fn setting(&self) -> Option<&RootSetting> {
        self.setting.as_ref()
    }

    /// Take the persisted snapshot as prior state
    ///
    /// On failure the prior state is empty, so the next scan reports every
    /// entry as created.
    pub fn load<S: SnapshotStore + ?Sized>(&mut self, store: &S) -> Result<(), StoreError> {
        match store.load(&self.root) {
            Ok(snapshot) => {
                self.files = snapshot.entries;
                self.setting = snapshot.setting;
                Ok(())
            }
            Err(e) => {
                self.files = FileCollection::new();
                self.setting = None;
                Err(e)
            }
        }
    }

    /// Classify `current` against the prior state and persist it if it differs
    ///
    /// A failed save keeps the prior state, so the same changes are reported
    /// and saved again on the next scan. When the saved digests come from
    /// another algorithm, every file is hashed again and the snapshot saved.
    pub fn scan<S: SnapshotStore + ?Sized>(
        &mut self,
        mut current: FileCollection,
        hasher: &ContentHasher,
        store: &S,
    ) -> ScanReport {
        let rehash = self.drop_foreign_hashes(hasher.algorithm());

        debug!("Comparing {}", self.root.display());
        let mut changes = compare_changes(&self.files, &mut current);

        let mut pending = changes.needs_hashing();
        if rehash {
            let stale: FileCollection = current
                .values()
                .filter(|e| !e.is_dir() && !e.has_hash())
                .cloned()
                .collect();
            pending.append(&stale);
        }
        hasher.hash_and_cache(&self.root, &mut pending);
        changes.apply_hashes(&pending);
        current.copy_hashes_from(&pending);

        let relocations = resolve_identity(&mut changes.deleted, &mut changes.created);

        let mut report = ScanReport {
            root: self.root.clone(),
            changes,
            relocations,
            stats: current.stats(),
            ..ScanReport::default()
        };

        let summary = report.summary();
        info!(
            "created: {}, updated: {}, deleted: {}, moved: {}, renamed: {} of {:?}",
            summary.created,
            summary.updated,
            summary.deleted,
            summary.moved,
            summary.renamed,
            self.root.display().to_string()
        );

        if report.is_unchanged() && !rehash {
            self.files = current;
            return report;
        }

        let setting = RootSetting::new(self.root.to_string_lossy(), hasher.algorithm(), &current);
        match store.save(&self.root, &setting, &current) {
            Ok(()) => {
                self.files = current;
                self.setting = Some(setting);
                report.saved = true;
            }
            Err(e) => {
                error!("Failed to save snapshot of {}: {}", self.root.display(), e);
                report.error = Some(e.to_string());
            }
        }

        report
    }

    /// Clear digests saved with an algorithm other than `algorithm`
    fn drop_foreign_hashes(&mut self, algorithm: HashAlgorithm) -> bool {
        let Some(saved) = self.setting.as_ref().map(|s| s.hash_algorithm.as_str()) else {
            return false;
        };
        if saved == algorithm.name() {
            return false;
        }
        info!(
            "Hash algorithm of {} changed from {} to {}, rehashing",
            self.root.display(),
            saved,
            algorithm
        );
        for entry in self.files.values_mut() {
            entry.hash_sum.clear();
        }
        true
    }
}
