//! Snapwatch Core - snapshot model and comparison engine
//!
//! This crate provides:
//! - File entries, collections and aggregate stats
//! - Pluggable content digests (BLAKE3, SHA-1/256/512, CRC-32, XXH3)
//! - Snapshot diffing (created / updated / deleted)
//! - Move and rename resolution

pub mod collection;
pub mod diff;
pub mod entry;
pub mod hash;
pub mod identity;

// Re-export main types for convenience
pub use collection::{normalize_path, FileCollection};
pub use diff::{compare_changes, ChangeSet};
pub use entry::{byte_count_iec, FileEntry, FileIdentity, FileStats};
pub use hash::{HashAlgorithm, StreamHasher};
pub use identity::{resolve_identity, same_file, Relocations};

/// Common result type used throughout snapwatch-core
pub type Result<T> = anyhow::Result<T>;
