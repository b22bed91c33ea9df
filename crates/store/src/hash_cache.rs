//! Process-wide cache of content digests
//!
//! One sled database shared by every root, with one tree per root and
//! algorithm. Each record is the [`FileEntry`] as it was when hashed, so callers can check
//! the metadata fingerprint before trusting the digest. The cache is purely
//! opportunistic and safe to delete.

use crate::db::open_db;
use crate::error::StoreError;
use crate::snapshot::root_key;
use ahash::AHashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sw_core::{FileCollection, FileEntry, HashAlgorithm};
use tracing::{debug, warn};

/// Open handle on the hash cache, for digests of one algorithm
pub struct HashCache {
    db: sled::Db,
    path: PathBuf,
    algorithm: HashAlgorithm,
}

impl HashCache {
    /// Open (or create) the cache at `path`
    pub fn open(path: &Path, algorithm: HashAlgorithm, lock_timeout: Duration) -> Result<Self, StoreError> {
        let db = open_db(path, lock_timeout)?;
        Ok(Self {
            db,
            path: path.to_path_buf(),
            algorithm,
        })
    }

    /// `data/hashing.db` next to the running executable
    pub fn default_path() -> Option<PathBuf> {
        let exe = std::env::current_exe().ok()?;
        Some(exe.parent()?.join("data").join("hashing.db"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tree(&self, root: &Path) -> Result<sled::Tree, StoreError> {
        let mut name = format!("{}:", self.algorithm.name()).into_bytes();
        name.extend_from_slice(&root_key(root));
        Ok(self.db.open_tree(name)?)
    }

    /// Cached records for `paths` under `root`; unknown paths are absent
    pub fn read<'a, I>(&self, root: &Path, paths: I) -> Result<AHashMap<String, FileEntry>, StoreError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tree = self.tree(root)?;
        let mut found = AHashMap::new();

        for path in paths {
            let Some(bytes) = tree.get(path.as_bytes())? else {
                continue;
            };
            match bincode::deserialize::<FileEntry>(&bytes) {
                Ok(entry) => {
                    found.insert(path.to_string(), entry);
                }
                Err(e) => warn!("Ignoring unreadable cache record {}: {}", path, e),
            }
        }

        debug!("Hash cache hits: {}", found.len());
        Ok(found)
    }

    /// Store the digests of `entries` under `root` in one batch
    ///
    /// Entries without a digest are left out, and records of other paths are
    /// kept. Returns the number of records written.
    pub fn write(&self, root: &Path, entries: &FileCollection) -> Result<usize, StoreError> {
        let tree = self.tree(root)?;
        let mut batch = sled::Batch::default();
        let mut count = 0usize;

        for (path, entry) in entries.iter().filter(|(_, e)| e.has_hash()) {
            match bincode::serialize(entry) {
                Ok(bytes) => {
                    batch.insert(path.as_bytes(), bytes);
                    count += 1;
                }
                Err(e) => warn!("Skipping cache record {}: {}", path, e),
            }
        }

        if count > 0 {
            tree.apply_batch(batch)?;
        }
        Ok(count)
    }

    /// Make every write so far durable
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}
