//! Snapwatch Store - durable state for watched roots
//!
//! This crate provides:
//! - Per-root snapshot persistence (full replace, chunked batch writes)
//! - A process-wide content hash cache
//! - Bounded waits on locked databases
//! - Aggregation of partial write failures

pub mod db;
pub mod error;
pub mod hash_cache;
pub mod setting;
pub mod snapshot;

pub use db::{open_db, DEFAULT_LOCK_TIMEOUT};
pub use error::{ErrorSink, StoreError};
pub use hash_cache::HashCache;
pub use setting::RootSetting;
pub use snapshot::{SledSnapshotStore, Snapshot, SnapshotStore, CHUNK_SIZE, STORE_DIR_NAME};
