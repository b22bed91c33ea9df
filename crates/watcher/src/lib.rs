//! Polling change detection for Snapwatch
//!
//! This crate provides:
//! - Directory listing with hidden-entry and gitignore-style filtering
//! - Content hashing backed by a shared hash cache
//! - Per-root comparison, move/rename resolution and persistence
//! - A multi-root registry with a periodic scan loop
//! - Change events filtered per root

pub mod coordinator;
pub mod error;
pub mod event;
pub mod hasher;
pub mod ignore;
pub mod options;
pub mod progress;
pub mod walk;
pub mod watcher;

pub use coordinator::{RootCoordinator, ScanReport, ScanSummary};
pub use error::WatchError;
pub use event::{Event, Op, OpSet};
pub use hasher::{ContentHasher, FLUSH_EVERY};
pub use ignore::{IgnoreMatcher, IgnoreRules};
pub use options::WatchOptions;
pub use progress::{HashProgress, LogProgress, NoProgress};
pub use walk::list_files;
pub use watcher::{run, Watcher};
