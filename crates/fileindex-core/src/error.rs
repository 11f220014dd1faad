/// Error taxonomy for indexing runs.
///
/// Traversal and store errors are always fatal. Hashing failures are
/// collected per worker and surface once, after every worker has been
/// joined, as [`IndexError::PartialFailure`].
use crate::hashing::{DigestBuffer, HashFailure};
use std::collections::TryReserveError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Convenience alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Top-level error for the indexing pipeline.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The source root exists but is not a directory.
    #[error("not a directory: '{}'", path.display())]
    NotADirectory { path: PathBuf },

    #[error("access denied: '{}'", path.display())]
    AccessDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not found: '{}'", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any other I/O failure on a specific path.
    #[error("I/O error on '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A path reached or exceeded [`crate::model::MAX_PATH_LEN`] bytes.
    #[error("path too long ({len} bytes, limit {limit}): '{}'", path.display())]
    PathTooLong {
        path: PathBuf,
        len: usize,
        limit: usize,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    /// One or more files could not be hashed. The digest buffer is still
    /// returned so callers can emit manifests with missing digests.
    #[error("{0}")]
    PartialFailure(Box<PartialFailure>),

    #[error("failed to spawn hashing worker {worker}")]
    WorkerSpawn {
        worker: usize,
        #[source]
        source: io::Error,
    },

    #[error("hashing worker {worker} panicked")]
    WorkerPanicked { worker: usize },

    /// A worker could not reserve its read buffer.
    #[error("cannot allocate a {bytes}-byte read buffer")]
    AllocationFailure {
        bytes: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("unable to create manifest '{}'", path.display())]
    ManifestCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to write manifest '{}'", path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to spawn indexer thread")]
    Spawn(#[source] io::Error),

    #[error("indexer thread panicked")]
    Panicked,
}

impl IndexError {
    /// Map an I/O error on `path` to the matching taxonomy variant.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            io::ErrorKind::PermissionDenied => Self::AccessDenied { path, source },
            io::ErrorKind::NotFound => Self::NotFound { path, source },
            io::ErrorKind::NotADirectory => Self::NotADirectory { path },
            _ => Self::Io { path, source },
        }
    }

    /// `true` for errors raised while the record stores were filling up.
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::CapacityExceeded(_) | StoreError::AllocationFailure { .. })
        )
    }
}

/// Record store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store capacity exceeded: {0}")]
    CapacityExceeded(CapacityLimit),

    #[error("cannot allocate a {bytes}-byte record block")]
    AllocationFailure {
        bytes: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("record store has been released")]
    Released,
}

/// Which limit a [`StoreError::CapacityExceeded`] ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CapacityLimit {
    #[error("all {max_blocks} blocks are in use")]
    Blocks { max_blocks: usize },

    #[error("a {record_len}-byte record does not fit a {block_size}-byte block")]
    RecordSize {
        record_len: usize,
        block_size: usize,
    },
}

/// Settings file and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Outcome of a hashing run in which at least one file failed.
#[derive(Debug)]
pub struct PartialFailure {
    /// Digests for every file; failed slots are `None`.
    pub digests: DigestBuffer,
    /// Every failure, ordered by file index.
    pub failures: Vec<HashFailure>,
}

impl PartialFailure {
    pub fn first_failing_path(&self) -> Option<&Path> {
        self.failures.first().map(|f| f.path.as_path())
    }
}

impl std::fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.failures.first() {
            Some(first) => write!(
                f,
                "cannot access all files: {} failed (e.g. '{}': {})",
                self.failures.len(),
                first.path.display(),
                first.message
            ),
            None => write!(f, "cannot access all files"),
        }
    }
}
