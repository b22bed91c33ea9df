use std::path::PathBuf;
use store::StoreError;

/// Errors surfaced by the watcher
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// A root could not be registered because it does not exist
    #[error("path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("invalid ignore pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: ignore::Error,
    },

    #[error("unknown action {0:?}")]
    UnknownAction(String),

    #[error("failed to list {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
