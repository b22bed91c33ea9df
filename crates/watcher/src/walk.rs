//! Listing the contents of a watched root

use crate::error::WatchError;
use crate::ignore::IgnoreMatcher;
use crate::options::WatchOptions;
use std::path::Path;
use sw_core::{FileCollection, FileEntry};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// List every entry under `root`
///
/// Links are recorded, never followed. Hidden and ignored directories are
/// pruned rather than descended. The root itself is not part of the result.
pub fn list_files<M>(root: &Path, options: &WatchOptions, ignore: &M) -> Result<FileCollection, WatchError>
where
    M: IgnoreMatcher + ?Sized,
{
    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(root)
        .follow_links(false)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !should_skip(root, entry, options, ignore));

    let mut files = FileCollection::new();
    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(WatchError::Walk {
                    path: root.to_path_buf(),
                    source,
                })
            }
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        if entry.depth() == 0 {
            continue;
        }

        match entry.metadata() {
            Ok(metadata) => {
                files.insert(FileEntry::from_metadata(entry.path(), &metadata));
            }
            Err(e) => warn!("Failed to stat {}: {}", entry.path().display(), e),
        }
    }

    debug!("Listed {} entries under {}", files.len(), root.display());
    Ok(files)
}

fn should_skip<M>(root: &Path, entry: &DirEntry, options: &WatchOptions, ignore: &M) -> bool
where
    M: IgnoreMatcher + ?Sized,
{
    if !options.include_hidden && is_hidden(entry) {
        return true;
    }

    let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
    ignore.matches(relative, entry.file_type().is_dir())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}
