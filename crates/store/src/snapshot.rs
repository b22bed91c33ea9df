//! Per-root snapshot persistence using sled
//!
//! Each watched root gets its own database inside the root directory with
//! two namespaces:
//! - `setting`: one [`RootSetting`] keyed by the root path
//! - a tree named after the root path: one [`FileEntry`] per path
//!
//! Saving is a full replace of the entry tree, written in ordered chunks so a
//! single transaction never has to hold the whole snapshot.

use crate::db::{open_db, DEFAULT_LOCK_TIMEOUT};
use crate::error::{ErrorSink, StoreError};
use crate::setting::RootSetting;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sw_core::{FileCollection, FileEntry};
use tracing::{debug, info, warn};

/// Directory name of the per-root database
pub const STORE_DIR_NAME: &str = ".snapwatch.db";

/// Entries written per atomic batch
pub const CHUNK_SIZE: usize = 1000;

const SETTING_TREE: &[u8] = b"setting";

/// Prior state of a root
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Metadata of the last save, if there was one
    pub setting: Option<RootSetting>,
    /// Entries of the last save
    pub entries: FileCollection,
}

/// Durable storage of the last snapshot of each root
pub trait SnapshotStore: Send + Sync {
    /// Read the last saved snapshot; a root never saved yields an empty one
    fn load(&self, root: &Path) -> Result<Snapshot, StoreError>;

    /// Replace the saved snapshot of `root`
    fn save(&self, root: &Path, setting: &RootSetting, entries: &FileCollection) -> Result<(), StoreError>;
}

/// [`SnapshotStore`] keeping one sled database inside each root
#[derive(Debug, Clone)]
pub struct SledSnapshotStore {
    lock_timeout: Duration,
}

impl Default for SledSnapshotStore {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl SledSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override how long to wait for a store held by another process
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Location of the database for `root`
    pub fn db_path(root: &Path) -> PathBuf {
        root.join(STORE_DIR_NAME)
    }
}

/// Namespace of `root` inside a store
pub(crate) fn root_key(root: &Path) -> Vec<u8> {
    sw_core::normalize_path(&root.to_string_lossy()).into_bytes()
}

impl SnapshotStore for SledSnapshotStore {
    fn load(&self, root: &Path) -> Result<Snapshot, StoreError> {
        let db_path = Self::db_path(root);
        if !db_path.exists() {
            debug!("No snapshot store at {}", db_path.display());
            return Ok(Snapshot::default());
        }

        let db = open_db(&db_path, self.lock_timeout)?;
        let key = root_key(root);

        let setting = match db.open_tree(SETTING_TREE)?.get(&key)? {
            Some(bytes) => match bincode::deserialize::<RootSetting>(&bytes) {
                Ok(setting) => Some(setting),
                Err(e) => {
                    warn!("Ignoring unreadable setting record in {}: {}", db_path.display(), e);
                    None
                }
            },
            None => None,
        };

        let mut entries = FileCollection::new();
        if db.tree_names().iter().any(|name| name.as_ref() == key.as_slice()) {
            for item in db.open_tree(&key)?.iter() {
                let (path, bytes) = item?;
                let path = String::from_utf8_lossy(&path);
                match bincode::deserialize::<FileEntry>(&bytes) {
                    Ok(entry) => {
                        entries.put(&path, entry);
                    }
                    Err(e) => warn!("Skipping unreadable record {}: {}", path, e),
                }
            }
        }

        info!("Loaded {} entries from {}", entries.len(), db_path.display());
        Ok(Snapshot { setting, entries })
    }

    fn save(&self, root: &Path, setting: &RootSetting, entries: &FileCollection) -> Result<(), StoreError> {
        let db_path = Self::db_path(root);
        let db = open_db(&db_path, self.lock_timeout)?;
        let key = root_key(root);
        let mut sink = ErrorSink::new();

        sink.attempt(put_setting(&db, &key, setting));

        // Full replace: the previous entry tree goes first
        sink.attempt(db.drop_tree(&key).map_err(StoreError::from));
        let tree = db.open_tree(&key)?;

        let records: Vec<(&String, &FileEntry)> = entries.iter().collect();
        let mut written = 0usize;
        for (index, chunk) in records.chunks(CHUNK_SIZE).enumerate() {
            let mut batch = sled::Batch::default();
            let mut in_batch = 0usize;
            for (path, entry) in chunk {
                match bincode::serialize(entry) {
                    Ok(bytes) => {
                        batch.insert(path.as_bytes(), bytes);
                        in_batch += 1;
                    }
                    Err(e) => warn!("Skipping {}: {}", path, e),
                }
            }

            let applied = tree
                .apply_batch(batch)
                .map_err(|source| StoreError::Chunk { index, source });
            if sink.attempt(applied).is_some() {
                written += in_batch;
            }
            debug!("Saved {}/{} entries to {}", written, entries.len(), db_path.display());
        }

        sink.attempt(db.flush().map(|_| ()).map_err(StoreError::from));

        if sink.failed() == 0 {
            info!("Saved {} entries to {}", written, db_path.display());
        }
        sink.finish()
    }
}

fn put_setting(db: &sled::Db, key: &[u8], setting: &RootSetting) -> Result<(), StoreError> {
    let bytes = bincode::serialize(setting).map_err(|source| StoreError::Encode {
        key: String::from_utf8_lossy(key).into_owned(),
        source,
    })?;
    db.open_tree(SETTING_TREE)?.insert(key, bytes)?;
    Ok(())
}
