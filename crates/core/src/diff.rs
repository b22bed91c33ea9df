//! Snapshot comparison
//!
//! Classifies the paths of a fresh listing against the previous snapshot of
//! the same root. Only size and modification time are compared here; content
//! is looked at later, by the identity resolver.

use crate::collection::FileCollection;
use crate::entry::FileEntry;

/// Paths that differ between two snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// In the current snapshot only
    pub created: FileCollection,
    /// In both, with a different size or modification time
    pub updated: FileCollection,
    /// In the previous snapshot only
    pub deleted: FileCollection,
}

impl ChangeSet {
    /// No path changed
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Entries whose content may have changed and therefore need a digest
    pub fn needs_hashing(&self) -> FileCollection {
        FileCollection::merge([&self.created, &self.updated])
    }

    /// Take freshly computed digests back into `created` and `updated`
    pub fn apply_hashes(&mut self, hashed: &FileCollection) {
        self.created.copy_hashes_from(hashed);
        self.updated.copy_hashes_from(hashed);
    }
}

/// Whether an entry present in both snapshots counts as modified
pub fn is_modified(previous: &FileEntry, current: &FileEntry) -> bool {
    previous.mod_time != current.mod_time || previous.size != current.size
}

/// Compare a fresh listing against the previous snapshot
///
/// Unchanged entries in `current` inherit the previous hash sum, so they are
/// never read again. Nothing else in either collection is touched.
pub fn compare_changes(previous: &FileCollection, current: &mut FileCollection) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for (path, entry) in current.iter_mut() {
        match previous.get(path) {
            None => {
                changes.created.put(path, entry.clone());
            }
            Some(old) if is_modified(old, entry) => {
                changes.updated.put(path, entry.clone());
            }
            Some(old) => {
                entry.hash_sum = old.hash_sum.clone();
            }
        }
    }

    for (path, old) in previous.iter() {
        if !current.contains(path) {
            changes.deleted.put(path, old.clone());
        }
    }

    changes
}
