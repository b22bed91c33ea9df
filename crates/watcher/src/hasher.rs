//! Content hashing with cache reuse
//!
//! Digests are only computed for entries that lack one. A record in the hash
//! cache is trusted when its mode, modification time and size all match the
//! entry, in which case the file is not read at all. Newly computed digests
//! go back to the cache every [`FLUSH_EVERY`] files and once at the end.

use crate::progress::{HashProgress, LogProgress};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use store::{HashCache, DEFAULT_LOCK_TIMEOUT};
use sw_core::hash::{hash_file, hash_symlink, to_hex};
use sw_core::{FileCollection, FileEntry, HashAlgorithm};
use tracing::{debug, trace, warn};

/// Newly computed digests buffered before a cache write
pub const FLUSH_EVERY: usize = 100;

/// Computes digests for one process, with one algorithm
pub struct ContentHasher {
    algorithm: HashAlgorithm,
    cache_path: Option<PathBuf>,
    lock_timeout: Duration,
    progress: Arc<dyn HashProgress>,
    files_read: AtomicU64,
}

impl ContentHasher {
    /// Hasher without a cache, logging its progress
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            cache_path: None,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            progress: Arc::new(LogProgress::new()),
            files_read: AtomicU64::new(0),
        }
    }

    /// Reuse and record digests in the cache at `path`
    pub fn with_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn HashProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    /// Files actually opened for hashing since this hasher was created
    pub fn files_read(&self) -> u64 {
        self.files_read.load(Ordering::Relaxed)
    }

    /// Fill in `hash_sum` for every non-directory entry that has none
    ///
    /// Failures on single files are logged and leave the digest empty.
    /// Returns how many digests were computed by reading files.
    pub fn hash_and_cache(&self, root: &Path, entries: &mut FileCollection) -> usize {
        let pending: Vec<String> = entries
            .iter()
            .filter(|(_, e)| !e.is_dir() && !e.has_hash())
            .map(|(path, _)| path.clone())
            .collect();
        if pending.is_empty() {
            return 0;
        }

        let total_bytes: u64 = entries
            .values()
            .filter(|e| !e.is_dir())
            .map(|e| e.size.max(0) as u64)
            .sum();

        let cache = self.open_cache();
        let cached = match &cache {
            Some(cache) => match cache.read(root, pending.iter().map(String::as_str)) {
                Ok(found) => found,
                Err(e) => {
                    warn!("Failed to read hash cache: {}", e);
                    Default::default()
                }
            },
            None => Default::default(),
        };

        // Entries that already had a digest count as done
        self.progress.start(root, total_bytes);
        self.progress.advance(total_bytes.saturating_sub(
            pending
                .iter()
                .filter_map(|p| entries.get(p))
                .map(|e| e.size.max(0) as u64)
                .sum(),
        ));

        let mut fresh = FileCollection::new();
        let mut computed = 0usize;
        let mut reused = 0usize;

        for path in &pending {
            let Some(entry) = entries.get_mut(path) else {
                continue;
            };
            let size = entry.size.max(0) as u64;

            if let Some(hit) = cached.get(path) {
                if is_reusable(hit, entry) {
                    entry.hash_sum = hit.hash_sum.clone();
                    reused += 1;
                    self.progress.advance(size);
                    continue;
                }
            }

            match self.digest(entry) {
                Ok(sum) => {
                    trace!("{} {}", to_hex(&sum), path);
                    entry.hash_sum = sum;
                    fresh.insert(entry.clone());
                    computed += 1;
                }
                Err(e) => warn!("Failed to hash {}: {:#}", path, e),
            }
            self.progress.advance(size);

            if fresh.len() >= FLUSH_EVERY {
                self.flush(cache.as_ref(), root, &mut fresh);
            }
        }

        self.flush(cache.as_ref(), root, &mut fresh);
        if let Some(cache) = &cache {
            if let Err(e) = cache.flush() {
                warn!("Failed to flush hash cache {}: {}", cache.path().display(), e);
            }
        }
        self.progress.finish();

        debug!(
            "Hashed {} files under {} ({} from cache)",
            computed,
            root.display(),
            reused
        );
        computed
    }

    fn open_cache(&self) -> Option<HashCache> {
        let path = self.cache_path.as_deref()?;
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Hash cache unavailable at {}: {}", path.display(), e);
                return None;
            }
        }
        match HashCache::open(path, self.algorithm, self.lock_timeout) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!("Hash cache unavailable, hashing everything: {}", e);
                None
            }
        }
    }

    fn digest(&self, entry: &FileEntry) -> anyhow::Result<Vec<u8>> {
        self.files_read.fetch_add(1, Ordering::Relaxed);
        let path = Path::new(&entry.path);
        if entry.is_symlink() {
            hash_symlink(self.algorithm, path)
        } else {
            hash_file(self.algorithm, path)
        }
    }

    fn flush(&self, cache: Option<&HashCache>, root: &Path, fresh: &mut FileCollection) {
        if fresh.is_empty() {
            return;
        }
        if let Some(cache) = cache {
            match cache.write(root, fresh) {
                Ok(written) => debug!("Cached {} digests", written),
                Err(e) => warn!("Failed to write hash cache: {}", e),
            }
        }
        *fresh = FileCollection::new();
    }
}

/// A cached digest is trusted only if the metadata fingerprint is unchanged
fn is_reusable(cached: &FileEntry, entry: &FileEntry) -> bool {
    cached.has_hash()
        && cached.mode == entry.mode
        && cached.mod_time == entry.mod_time
        && cached.size == entry.size
}
