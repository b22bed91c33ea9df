//! Opening sled databases with a bounded wait for the file lock

use crate::error::StoreError;
use std::path::Path;
use std::thread::sleep;
use std::time::{Duration, Instant};

/// Default wait for a store held by another process
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) a sled database
///
/// sled takes an exclusive lock on open. While another process holds it the
/// open is retried with exponential backoff until `timeout` has elapsed.
pub fn open_db(path: &Path, timeout: Duration) -> Result<sled::Db, StoreError> {
    let started = Instant::now();
    let mut backoff = Duration::from_millis(50);

    loop {
        match sled::open(path) {
            Ok(db) => return Ok(db),
            Err(e) if is_lock_contention(&e) => {
                let waited = started.elapsed();
                if waited >= timeout {
                    return Err(StoreError::Locked {
                        path: path.to_path_buf(),
                        waited,
                    });
                }
                tracing::debug!("Store {} is locked, retrying in {:?}", path.display(), backoff);
                sleep(backoff.min(timeout.saturating_sub(waited)));
                backoff = (backoff * 2).min(Duration::from_millis(500));
            }
            Err(source) => {
                return Err(StoreError::Open {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }
}

/// Whether an open failed because another handle holds the lock
///
/// sled 0.34 wraps the failed `try_lock_exclusive` in an `Other` I/O error
/// reading "could not acquire lock on ...", so the kind alone is not enough.
fn is_lock_contention(error: &sled::Error) -> bool {
    match error {
        sled::Error::Io(io) => {
            io.kind() == std::io::ErrorKind::WouldBlock
                || io.to_string().contains("could not acquire")
        }
        _ => false,
    }
}
