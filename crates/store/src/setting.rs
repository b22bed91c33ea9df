//! Per-root metadata record

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use sw_core::{FileCollection, FileStats, HashAlgorithm};

/// Metadata written alongside every saved snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootSetting {
    /// Watched root
    pub root_path: String,
    /// When the snapshot was saved
    pub saved_at: SystemTime,
    /// Name of the digest algorithm used for the snapshot's hash sums
    pub hash_algorithm: String,
    /// Counts at save time
    pub stats: FileStats,
}

impl RootSetting {
    /// Describe `entries` as saved now
    pub fn new(root_path: impl Into<String>, algorithm: HashAlgorithm, entries: &FileCollection) -> Self {
        Self {
            root_path: root_path.into(),
            saved_at: SystemTime::now(),
            hash_algorithm: algorithm.name().to_string(),
            stats: entries.stats(),
        }
    }
}
