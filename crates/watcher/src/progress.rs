//! Hashing progress reporting

use parking_lot::Mutex;
use std::path::Path;
use sw_core::byte_count_iec;
use tracing::info;

/// Receives progress while a root is hashed
pub trait HashProgress: Send + Sync {
    /// A batch of `total_bytes` is about to be hashed
    fn start(&self, root: &Path, total_bytes: u64);

    /// `bytes` more have been processed (read or taken from cache)
    fn advance(&self, bytes: u64);

    /// The batch is done
    fn finish(&self);
}

/// Reports nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl HashProgress for NoProgress {
    fn start(&self, _root: &Path, _total_bytes: u64) {}
    fn advance(&self, _bytes: u64) {}
    fn finish(&self) {}
}

#[derive(Debug, Default)]
struct LogState {
    total: u64,
    done: u64,
    last_step: u64,
}

/// Logs a line at every tenth of the batch
#[derive(Debug, Default)]
pub struct LogProgress {
    state: Mutex<LogState>,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Percentage of `done` in `total`, 100 for an empty batch
pub fn percent(done: u64, total: u64) -> u64 {
    if total == 0 {
        100
    } else {
        (done.min(total) * 100) / total
    }
}

fn iec(bytes: u64) -> String {
    byte_count_iec(i64::try_from(bytes).unwrap_or(i64::MAX))
}

impl HashProgress for LogProgress {
    fn start(&self, root: &Path, total_bytes: u64) {
        *self.state.lock() = LogState {
            total: total_bytes,
            ..LogState::default()
        };
        info!("Hashing {} under {}", iec(total_bytes), root.display());
    }

    fn advance(&self, bytes: u64) {
        let mut state = self.state.lock();
        state.done = state.done.saturating_add(bytes);
        let step = percent(state.done, state.total) / 10;
        if step > state.last_step {
            state.last_step = step;
            info!(
                "hashing: {}% ({} of {})",
                percent(state.done, state.total),
                iec(state.done),
                iec(state.total)
            );
        }
    }

    fn finish(&self) {
        let state = self.state.lock();
        info!("Hashing done: {}", iec(state.done));
    }
}
