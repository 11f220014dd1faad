/// Parallel content hashing over a fixed pool of scoped worker threads.
///
/// # Ownership model
///
/// The digest buffer is allocated once, before any worker starts, and cut
/// with `split_at_mut` into one disjoint `&mut` slice per partition. Each
/// slice moves into exactly one worker thread, so slot *i* can only ever be
/// written by the worker that owns file *i*, and no locking is needed. The
/// File Store is shared read-only. The buffer is handed back to the caller
/// only after `std::thread::scope` has joined every worker.
///
/// # Failure policy
///
/// A file that cannot be opened or read is recorded and skipped; its slot
/// stays `None` and the worker moves on. Workers are never cancelled, so
/// every file gets its attempt. Failures from all workers are merged after
/// the join and reported as one [`IndexError::PartialFailure`].
use super::digest::{Digest, DigestAlgorithm, DigestBuffer};
use super::partition::{partition_by_size, Partition};
use crate::error::{IndexError, PartialFailure, Result};
use crate::model::RecordStore;
use crate::scanner::IndexProgress;
use crossbeam_channel::Sender;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Where in a file's processing a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Open,
    Read,
}

/// Coarse classification of a per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    AccessDenied,
    NotFound,
    Io,
}

impl From<io::ErrorKind> for FailureKind {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::PermissionDenied => Self::AccessDenied,
            io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::Io,
        }
    }
}

/// One file that could not be hashed.
#[derive(Debug, Clone)]
pub struct HashFailure {
    /// Index of the file in File Store order (= digest slot).
    pub index: usize,
    pub path: PathBuf,
    pub stage: FailureStage,
    pub kind: FailureKind,
    pub message: String,
}

/// What a single worker did with its range.
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub worker: usize,
    pub hashed: usize,
    pub bytes: u64,
    pub failures: Vec<HashFailure>,
    pub duration: Duration,
}

/// Hash every file in `files`, returning one digest per file in store
/// order.
///
/// `worker_count` is clamped to the number of files; `read_buffer_size`
/// is the per-worker read buffer in bytes and `algorithm` the content hash. Returns
/// [`IndexError::PartialFailure`] (carrying the digest buffer) if any file
/// failed.
pub fn compute_digests(
    files: &RecordStore,
    worker_count: usize,
    read_buffer_size: usize,
    algorithm: DigestAlgorithm,
    progress_tx: &Sender<IndexProgress>,
) -> Result<DigestBuffer> {
    let start = Instant::now();
    let partitions = partition_by_size(files, worker_count);
    let mut digests = DigestBuffer::with_len(files.len());

    info!(
        files = files.len(),
        workers = partitions.len(),
        %algorithm,
        "hashing {} bytes",
        files.total_size()
    );
    for part in &partitions {
        debug!(
            worker = part.worker,
            files = part.len,
            bytes = part.bytes,
            "partition assigned"
        );
        let _ = progress_tx.send(IndexProgress::PartitionAssigned {
            worker: part.worker,
            files: part.len,
            bytes: part.bytes,
        });
    }

    let reports = run_workers(
        files,
        &partitions,
        &mut digests,
        read_buffer_size,
        algorithm,
        progress_tx,
    )?;

    let mut failures: Vec<HashFailure> = reports.into_iter().flat_map(|r| r.failures).collect();
    failures.sort_by_key(|f| f.index);

    debug!(
        "Hashing complete: {} of {} files in {:?}",
        digests.filled(),
        digests.len(),
        start.elapsed()
    );

    if failures.is_empty() {
        Ok(digests)
    } else {
        Err(IndexError::PartialFailure(Box::new(PartialFailure {
            digests,
            failures,
        })))
    }
}

/// Spawn one scoped thread per partition and join them all.
fn run_workers(
    files: &RecordStore,
    partitions: &[Partition],
    digests: &mut DigestBuffer,
    read_buffer_size: usize,
    algorithm: DigestAlgorithm,
    progress_tx: &Sender<IndexProgress>,
) -> Result<Vec<WorkerReport>> {
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(partitions.len());
        let mut rest = digests.slots_mut();

        for part in partitions {
            let (slots, tail) = std::mem::take(&mut rest).split_at_mut(part.len);
            rest = tail;
            let tx = progress_tx.clone();

            let handle = thread::Builder::new()
                .name(format!("fileindex-hash-{}", part.worker))
                .spawn_scoped(scope, move || {
                    hash_partition(files, part, slots, read_buffer_size, algorithm, &tx)
                })
                .map_err(|source| IndexError::WorkerSpawn {
                    worker: part.worker,
                    source,
                })?;
            handles.push((part.worker, handle));
        }

        // Join every worker before looking at any result, so one bad
        // worker never leaves another running unobserved.
        let joined: Vec<_> = handles
            .into_iter()
            .map(|(worker, handle)| (worker, handle.join()))
            .collect();

        let mut reports = Vec::with_capacity(joined.len());
        for (worker, outcome) in joined {
            match outcome {
                Ok(report) => reports.push(report?),
                Err(_) => return Err(IndexError::WorkerPanicked { worker }),
            }
        }
        Ok(reports)
    })
}

/// Hash one contiguous range, writing into the worker's own slots.
fn hash_partition(
    files: &RecordStore,
    part: &Partition,
    slots: &mut [Option<Digest>],
    read_buffer_size: usize,
    algorithm: DigestAlgorithm,
    progress_tx: &Sender<IndexProgress>,
) -> Result<WorkerReport> {
    let start = Instant::now();
    let mut buf = read_buffer(read_buffer_size)?;
    let mut report = WorkerReport {
        worker: part.worker,
        hashed: 0,
        bytes: 0,
        failures: Vec::new(),
        duration: Duration::ZERO,
    };

    let records = files.iter_from(part.start_pos);
    for (offset, (slot, record)) in slots.iter_mut().zip(records).enumerate() {
        let path = record.path();
        let result = match File::open(path) {
            Ok(file) => algorithm.hash_reader(file, &mut buf).map_err(|e| (FailureStage::Read, e)),
            Err(e) => Err((FailureStage::Open, e)),
        };

        match result {
            Ok(digest) => {
                *slot = Some(digest);
                report.hashed += 1;
                report.bytes += record.meta.size_or_time;
            }
            Err((stage, err)) => {
                warn!(path = %path.display(), ?stage, "cannot hash file: {err}");
                let _ = progress_tx.send(IndexProgress::HashError {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                });
                report.failures.push(HashFailure {
                    index: part.start + offset,
                    path: path.to_path_buf(),
                    stage,
                    kind: err.kind().into(),
                    message: err.to_string(),
                });
            }
        }
    }

    report.duration = start.elapsed();
    let _ = progress_tx.send(IndexProgress::WorkerFinished {
        worker: report.worker,
        hashed: report.hashed,
        failed: report.failures.len(),
        bytes: report.bytes,
        duration: report.duration,
    });
    Ok(report)
}

/// Reserve a zeroed read buffer without aborting on allocation failure.
fn read_buffer(bytes: usize) -> Result<Vec<u8>> {
    let bytes = bytes.max(1);
    let mut buf = Vec::new();
    buf.try_reserve_exact(bytes)
        .map_err(|source| IndexError::AllocationFailure { bytes, source })?;
    buf.resize(bytes, 0);
    Ok(buf)
}
