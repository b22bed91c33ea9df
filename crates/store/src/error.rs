//! Store errors and partial-failure aggregation

use std::path::PathBuf;
use std::time::Duration;

/// Errors raised by the snapshot store and hash cache
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be opened
    #[error("failed to open store {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: sled::Error,
    },

    /// Another writer held the store for the whole wait
    #[error("store {} is locked by another process (waited {waited:?})", path.display())]
    Locked { path: PathBuf, waited: Duration },

    /// Any other storage-engine failure
    #[error("storage error: {0}")]
    Db(#[from] sled::Error),

    /// A record could not be encoded
    #[error("failed to encode record {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: bincode::Error,
    },

    /// One chunk of a batched write failed
    #[error("failed to write chunk {index}: {source}")]
    Chunk {
        index: usize,
        #[source]
        source: sled::Error,
    },

    /// Several independent operations ran and some of them failed
    #[error(
        "{} of {} store operations failed: {}",
        .errors.len(),
        .attempted,
        join_errors(.errors)
    )]
    Partial {
        attempted: usize,
        errors: Vec<StoreError>,
    },
}

fn join_errors(errors: &[StoreError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Collects the outcome of independent operations
///
/// Every operation is attempted regardless of earlier failures; the
/// collected errors are reported together by [`ErrorSink::finish`].
#[derive(Debug, Default)]
pub struct ErrorSink {
    attempted: usize,
    errors: Vec<StoreError>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one operation's result, yielding its value on success
    pub fn attempt<T>(&mut self, result: Result<T, StoreError>) -> Option<T> {
        self.attempted += 1;
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }

    /// Operations recorded so far
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    /// Operations that failed so far
    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    /// Ok if nothing failed, otherwise every error at once
    pub fn finish(self) -> Result<(), StoreError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Partial {
                attempted: self.attempted,
                errors: self.errors,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_error(index: usize) -> StoreError {
        StoreError::Chunk {
            index,
            source: sled::Error::Unsupported(format!("chunk {}", index)),
        }
    }

    #[test]
    fn test_sink_without_errors_is_ok() {
        let mut sink = ErrorSink::new();
        assert_eq!(sink.attempt(Ok::<_, StoreError>(3)), Some(3));
        assert_eq!(sink.attempted(), 1);
        assert!(sink.finish().is_ok());
    }

    #[test]
    fn test_sink_keeps_going_after_failure() {
        let mut sink = ErrorSink::new();
        let mut reached = Vec::new();

        for index in 0..4 {
            let result = if index % 2 == 0 { Err(chunk_error(index)) } else { Ok(index) };
            if let Some(done) = sink.attempt(result) {
                reached.push(done);
            }
        }

        assert_eq!(reached, vec![1, 3]);
        assert_eq!(sink.failed(), 2);

        match sink.finish() {
            Err(StoreError::Partial { attempted, errors }) => {
                assert_eq!(attempted, 4);
                assert_eq!(errors.len(), 2);
            }
            other => panic!("expected partial failure, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_message_lists_every_error() {
        let mut sink = ErrorSink::new();
        sink.attempt::<()>(Err(chunk_error(0)));
        sink.attempt::<()>(Err(chunk_error(2)));
        let message = sink.finish().unwrap_err().to_string();

        assert!(message.starts_with("2 of 2 store operations failed"));
        assert!(message.contains("chunk 0"));
        assert!(message.contains("chunk 2"));
    }
}
