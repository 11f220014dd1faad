/// Progress reporting: lightweight messages sent from the indexing thread
/// (and the hashing workers) to whoever drives the run.
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Traversal,
    Directories,
    Symlinks,
    Hashing,
    Files,
}

impl Phase {
    /// Human-readable label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Traversal => "Indexing files",
            Self::Directories => "Listing directories",
            Self::Symlinks => "Listing links",
            Self::Hashing => "Calculating checksums",
            Self::Files => "Listing files",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Progress updates. None of these carry record data; the stores stay on
/// the indexing thread.
#[derive(Debug, Clone)]
pub enum IndexProgress {
    PhaseStarted(Phase),
    PhaseFinished { phase: Phase, duration: Duration },
    /// Periodic traversal counters.
    Update {
        dirs_found: u64,
        files_found: u64,
        links_found: u64,
        total_size: u64,
        current_path: PathBuf,
    },
    /// The scheduler assigned a contiguous range to a worker.
    PartitionAssigned {
        worker: usize,
        files: usize,
        bytes: u64,
    },
    /// A worker finished its whole range.
    WorkerFinished {
        worker: usize,
        hashed: usize,
        failed: usize,
        bytes: u64,
        duration: Duration,
    },
    /// A file could not be hashed. Non-fatal for the worker.
    HashError { path: PathBuf, message: String },
}
