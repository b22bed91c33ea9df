//! Path-keyed collection of file entries for one root

use crate::entry::{FileEntry, FileStats};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Normalize a path key
///
/// Trailing separators are dropped so that `/a/b/` and `/a/b` name the same
/// entry. The filesystem root itself is left alone.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches(|c| c == '/' || c == std::path::MAIN_SEPARATOR);
    if trimmed.is_empty() && !path.is_empty() {
        return path[..1].to_string();
    }
    trimmed.to_string()
}

/// Mapping from normalized path to [`FileEntry`]
///
/// Ordered by path so that iteration, chunked persistence and the identity
/// resolver's tie-break are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCollection {
    entries: BTreeMap<String, FileEntry>,
}

impl FileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(&normalize_path(path))
    }

    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.entries.get(&normalize_path(path))
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut FileEntry> {
        self.entries.get_mut(&normalize_path(path))
    }

    /// Insert under an explicit key, returning any entry it replaced
    pub fn put(&mut self, path: &str, entry: FileEntry) -> Option<FileEntry> {
        self.entries.insert(normalize_path(path), entry)
    }

    /// Insert keyed by the entry's own path
    pub fn insert(&mut self, entry: FileEntry) -> Option<FileEntry> {
        let key = normalize_path(&entry.path);
        self.entries.insert(key, entry)
    }

    pub fn remove(&mut self, path: &str) -> Option<FileEntry> {
        self.entries.remove(&normalize_path(path))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut FileEntry> {
        self.entries.values_mut()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FileEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, String, FileEntry> {
        self.entries.iter_mut()
    }

    /// Copy every entry of `other` into this collection; `other` wins on
    /// conflicting keys
    pub fn append(&mut self, other: &FileCollection) -> &mut Self {
        for (path, entry) in other.iter() {
            self.entries.insert(path.clone(), entry.clone());
        }
        self
    }

    /// Union of several collections, later ones winning on conflicts
    pub fn merge<'a>(collections: impl IntoIterator<Item = &'a FileCollection>) -> Self {
        let mut merged = Self::new();
        for collection in collections {
            merged.append(collection);
        }
        merged
    }

    /// Aggregate counts over every entry
    pub fn stats(&self) -> FileStats {
        let mut stats = FileStats::default();
        for entry in self.entries.values() {
            stats.record(entry);
        }
        stats
    }

    /// Take hash sums from `source` for every shared key where `source`
    /// carries one
    pub fn copy_hashes_from(&mut self, source: &FileCollection) {
        for (path, entry) in self.entries.iter_mut() {
            if let Some(hashed) = source.entries.get(path) {
                if hashed.has_hash() {
                    entry.hash_sum = hashed.hash_sum.clone();
                }
            }
        }
    }
}

impl FromIterator<FileEntry> for FileCollection {
    fn from_iter<I: IntoIterator<Item = FileEntry>>(iter: I) -> Self {
        let mut collection = Self::new();
        for entry in iter {
            collection.insert(entry);
        }
        collection
    }
}

impl IntoIterator for FileCollection {
    type Item = (String, FileEntry);
    type IntoIter = btree_map::IntoIter<String, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a FileCollection {
    type Item = (&'a String, &'a FileEntry);
    type IntoIter = btree_map::Iter<'a, String, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::mode;
    use std::time::SystemTime;

    fn file(path: &str, size: i64) -> FileEntry {
        FileEntry::new(path, size, mode::REGULAR | 0o644, SystemTime::UNIX_EPOCH)
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a/b/"), "/a/b");
        assert_eq!(normalize_path("/a/b"), "/a/b");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn test_put_normalizes_key() {
        let mut files = FileCollection::new();
        files.put("/r/dir/", file("/r/dir", 0));

        assert!(files.contains("/r/dir"));
        assert!(files.contains("/r/dir/"));
        assert_eq!(files.keys().collect::<Vec<_>>(), vec!["/r/dir"]);
    }

    #[test]
    fn test_remove_and_len() {
        let mut files: FileCollection = [file("/r/a", 1), file("/r/b", 2)].into_iter().collect();
        assert_eq!(files.len(), 2);

        assert!(files.remove("/r/a").is_some());
        assert!(files.remove("/r/a").is_none());
        assert_eq!(files.len(), 1);
        assert!(!files.is_empty());
    }

    #[test]
    fn test_merge_later_wins() {
        let first: FileCollection = [file("/r/a", 1), file("/r/b", 2)].into_iter().collect();
        let second: FileCollection = [file("/r/b", 20), file("/r/c", 3)].into_iter().collect();

        let merged = FileCollection::merge([&first, &second]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get("/r/b").map(|e| e.size), Some(20));
    }

    #[test]
    fn test_iteration_is_sorted() {
        let files: FileCollection = [file("/r/c", 1), file("/r/a", 1), file("/r/b", 1)]
            .into_iter()
            .collect();
        let keys: Vec<_> = files.keys().collect();
        assert_eq!(keys, vec!["/r/a", "/r/b", "/r/c"]);
    }

    #[test]
    fn test_copy_hashes_from() {
        let mut current: FileCollection = [file("/r/a", 1), file("/r/b", 2)].into_iter().collect();
        let hashed: FileCollection = [file("/r/a", 1).with_hash(vec![1, 2]), file("/r/b", 2)]
            .into_iter()
            .collect();

        current.copy_hashes_from(&hashed);
        assert_eq!(current.get("/r/a").unwrap().hash_sum, vec![1, 2]);
        assert!(current.get("/r/b").unwrap().hash_sum.is_empty());
    }
}
