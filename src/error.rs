use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The allocator could not hand out the requested region.
///
/// Whatever the node or allocator held before the failing call is still valid.
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("allocator needs {requested} bytes but its limit is {limit} bytes")]
    LimitExceeded { requested: usize, limit: usize },

    #[error("node of {requested} bytes exceeds the maximum node size of {max} bytes")]
    NodeTooLarge { requested: usize, max: usize },

    #[error("backing storage could not grow to {requested} bytes")]
    Storage {
        requested: usize,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum BlobError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid allocator metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("corrupt node header: {0}")]
    CorruptHeader(String),

    #[error("no allocator storage found at {}", .0.display())]
    MissingStorage(PathBuf),
}

impl BlobError {
    pub fn corrupt_header(message: impl Into<String>) -> Self {
        Self::CorruptHeader(message.into())
    }
}

pub type Result<T, E = BlobError> = std::result::Result<T, E>;
