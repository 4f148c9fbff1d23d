//! Error types for loading event logs and laying them out

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading an event log
#[derive(Debug, Error)]
pub enum LoadError {
    /// The log file could not be read
    #[error("failed to read event log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON
    #[error("event log is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but has no event array
    #[error("event log has no `events` array")]
    MissingEvents,
}

/// Consistency violations found while traversing a forest for layout
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutFault {
    /// Traversal popped an index that does not follow the previous one
    #[error("layout visited event {found} but expected event {expected}")]
    OutOfOrder { expected: usize, found: usize },

    /// Some nodes were never reached from the first root
    #[error("layout reached {visited} of {total} events")]
    Unreachable { visited: usize, total: usize },
}

pub type LoadResult<T> = Result<T, LoadError>;
