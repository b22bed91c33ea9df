//! Move and rename detection
//!
//! Pairs deleted entries with created entries that are the same underlying
//! object, either by OS identity or by content. Every deleted entry is tested
//! against every created entry; the change sets this runs over are small
//! compared to the tree, so the quadratic scan stays cheap in practice.

use crate::collection::FileCollection;
use crate::entry::FileEntry;
use std::path::Path;

/// Outcome of comparing two entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SameFile {
    /// Both carry OS identity and it matches
    pub identity: bool,
    /// Content (files) or metadata (directories) matches
    pub content: bool,
}

impl SameFile {
    /// Either signal is enough to pair two entries
    pub fn any(self) -> bool {
        self.identity || self.content
    }
}

/// Compare two entries for identity and content equivalence
pub fn same_file(a: &FileEntry, b: &FileEntry) -> SameFile {
    let identity = a.has_identity_metadata() && b.has_identity_metadata() && a.identity == b.identity;

    let content = if a.is_dir() != b.is_dir() {
        false
    } else if !a.is_dir() {
        a.size == b.size && a.has_hash() && b.has_hash() && a.hash_sum == b.hash_sum
    } else {
        a.mod_time == b.mod_time && a.size == b.size && a.mode == b.mode
    };

    SameFile { identity, content }
}

/// Entries that changed location
///
/// Both maps are keyed by the old path; values are the entries at their new
/// location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relocations {
    /// Now under a different parent directory
    pub moved: FileCollection,
    /// Same parent directory, different name
    pub renamed: FileCollection,
}

impl Relocations {
    pub fn is_empty(&self) -> bool {
        self.moved.is_empty() && self.renamed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.moved.len() + self.renamed.len()
    }
}

/// Pair deleted and created entries that are the same object
///
/// Paired entries are removed from both inputs, so afterwards `deleted` and
/// `created` hold true deletions and creations only. Deleted entries are
/// visited in path order and each takes the first matching created entry in
/// path order.
pub fn resolve_identity(deleted: &mut FileCollection, created: &mut FileCollection) -> Relocations {
    let mut relocations = Relocations::default();
    let deleted_paths: Vec<String> = deleted.keys().map(str::to_string).collect();

    for deleted_path in deleted_paths {
        let Some(old) = deleted.get(&deleted_path) else {
            continue;
        };

        let matched = created
            .iter()
            .find(|(_, candidate)| same_file(old, candidate).any())
            .map(|(path, _)| path.clone());

        let Some(created_path) = matched else {
            continue;
        };

        deleted.remove(&deleted_path);
        let Some(new) = created.remove(&created_path) else {
            continue;
        };

        if Path::new(&deleted_path).parent() == Path::new(&created_path).parent() {
            relocations.renamed.put(&deleted_path, new);
        } else {
            relocations.moved.put(&deleted_path, new);
        }
    }

    relocations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{mode, FileIdentity};
    use std::time::{Duration, SystemTime};

    fn file(path: &str, size: i64, hash: &[u8]) -> FileEntry {
        FileEntry::new(path, size, mode::REGULAR | 0o644, SystemTime::UNIX_EPOCH).with_hash(hash)
    }

    fn dir(path: &str, secs: u64) -> FileEntry {
        FileEntry::new(
            path,
            4096,
            mode::DIR | 0o755,
            SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
        )
    }

    fn collect(entries: Vec<FileEntry>) -> FileCollection {
        entries.into_iter().collect()
    }

    #[test]
    fn test_same_parent_is_rename() {
        let mut deleted = collect(vec![file("/r/a.txt", 10, b"H1")]);
        let mut created = collect(vec![file("/r/c.txt", 10, b"H1")]);

        let relocations = resolve_identity(&mut deleted, &mut created);

        assert_eq!(relocations.renamed.len(), 1);
        assert_eq!(relocations.renamed.get("/r/a.txt").unwrap().path, "/r/c.txt");
        assert!(relocations.moved.is_empty());
        assert!(deleted.is_empty());
        assert!(created.is_empty());
    }

    #[test]
    fn test_different_parent_is_move() {
        let mut deleted = collect(vec![file("/r/docs/a.txt", 10, b"H1")]);
        let mut created = collect(vec![file("/r/archive/a.txt", 10, b"H1")]);

        let relocations = resolve_identity(&mut deleted, &mut created);

        assert_eq!(relocations.moved.len(), 1);
        assert_eq!(
            relocations.moved.get("/r/docs/a.txt").unwrap().path,
            "/r/archive/a.txt"
        );
        assert!(relocations.renamed.is_empty());
    }

    #[test]
    fn test_size_mismatch_blocks_content_match() {
        let mut deleted = collect(vec![file("/r/a", 10, b"H1")]);
        let mut created = collect(vec![file("/r/b", 11, b"H1")]);

        let relocations = resolve_identity(&mut deleted, &mut created);
        assert!(relocations.is_empty());
        assert_eq!(deleted.len(), 1);
        assert_eq!(created.len(), 1);
    }

    #[test]
    fn test_missing_hash_never_matches_on_content() {
        let mut deleted = collect(vec![file("/r/a", 10, b"")]);
        let mut created = collect(vec![file("/r/b", 10, b"")]);

        assert!(resolve_identity(&mut deleted, &mut created).is_empty());
    }

    #[test]
    fn test_identity_alone_pairs_entries() {
        let id = FileIdentity { device: 3, inode: 77 };
        let mut deleted = collect(vec![file("/r/a", 10, b"old").with_identity(id)]);
        let mut created = collect(vec![file("/r/sub/b", 99, b"new").with_identity(id)]);

        let relocations = resolve_identity(&mut deleted, &mut created);
        assert_eq!(relocations.moved.len(), 1);
        assert!(deleted.is_empty() && created.is_empty());
    }

    #[test]
    fn test_identity_on_one_side_only_is_no_signal() {
        let id = FileIdentity { device: 3, inode: 77 };
        let with = file("/r/a", 10, b"old").with_identity(id);
        let without = file("/r/b", 10, b"new");

        assert!(with.has_identity_metadata());
        assert!(!without.has_identity_metadata());
        assert_eq!(same_file(&with, &without), SameFile::default());
    }

    #[test]
    fn test_directories_match_on_metadata() {
        let mut deleted = collect(vec![dir("/r/old", 5)]);
        let mut created = collect(vec![dir("/r/new", 5), dir("/r/other", 6)]);

        let relocations = resolve_identity(&mut deleted, &mut created);
        assert_eq!(relocations.renamed.get("/r/old").unwrap().path, "/r/new");
        assert_eq!(created.keys().collect::<Vec<_>>(), vec!["/r/other"]);
    }

    #[test]
    fn test_file_never_matches_directory() {
        let a = file("/r/a", 4096, b"H");
        let d = dir("/r/d", 0);
        assert!(!same_file(&a, &d).content);
    }

    #[test]
    fn test_each_entry_paired_once() {
        // Two identical deletions, two identical creations: two pairs, in path order
        let mut deleted = collect(vec![file("/r/a1", 1, b"X"), file("/r/a2", 1, b"X")]);
        let mut created = collect(vec![file("/r/b1", 1, b"X"), file("/r/b2", 1, b"X")]);

        let relocations = resolve_identity(&mut deleted, &mut created);
        assert_eq!(relocations.renamed.len(), 2);
        assert_eq!(relocations.renamed.get("/r/a1").unwrap().path, "/r/b1");
        assert_eq!(relocations.renamed.get("/r/a2").unwrap().path, "/r/b2");
        assert!(deleted.is_empty() && created.is_empty());
    }

    #[test]
    fn test_outputs_disjoint_from_leftovers() {
        let mut deleted = collect(vec![
            file("/r/a", 1, b"A"),
            file("/r/gone", 2, b"G"),
            file("/r/x/m", 3, b"M"),
        ]);
        let mut created = collect(vec![
            file("/r/a2", 1, b"A"),
            file("/r/fresh", 9, b"F"),
            file("/r/y/m", 3, b"M"),
        ]);

        let relocations = resolve_identity(&mut deleted, &mut created);

        for (from, to) in relocations.moved.iter().chain(relocations.renamed.iter()) {
            assert!(!deleted.contains(from));
            assert!(!created.contains(&to.path));
        }
        assert_eq!(deleted.keys().collect::<Vec<_>>(), vec!["/r/gone"]);
        assert_eq!(created.keys().collect::<Vec<_>>(), vec!["/r/fresh"]);
    }
}
