/// End-to-end indexing pipeline.
///
/// Traversal → directory manifest → symlink manifest → hashing → file
/// manifest. [`run_index`] runs it on the calling thread; [`start_index`]
/// runs it on a background thread and hands back an [`IndexHandle`] whose
/// channel carries [`IndexProgress`] messages while the run is in flight.
///
/// The record stores live entirely inside one run and are released on
/// every exit path, successful or not.
use crate::config::{IndexConfig, IndexSettings};
use crate::error::{IndexError, PartialFailure, Result};
use crate::hashing::{compute_digests, DigestBuffer, HashFailure};
use crate::manifest::{emit_directories, emit_files, emit_symlinks, ManifestPaths};
use crate::scanner::{walk, IndexProgress, IndexStores, Phase, WalkStats};
use crossbeam_channel::{Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Maximum number of progress messages that may queue up in the channel
/// returned by [`start_index`].
///
/// When the consumer falls behind, the indexer blocks on `send` rather
/// than growing the queue without bound.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct IndexSummary {
    pub walk: WalkStats,
    pub dirs_listed: usize,
    pub links_listed: usize,
    pub files_listed: usize,
    pub hashed: usize,
    pub manifests: ManifestPaths,
    pub duration: Duration,
}

/// Handle to an indexing run on a background thread.
pub struct IndexHandle {
    /// Progress messages. Disconnects once the run has finished.
    pub progress_rx: Receiver<IndexProgress>,
    thread: thread::JoinHandle<Result<IndexSummary>>,
}

impl IndexHandle {
    /// Wait for the run to finish and return its result.
    ///
    /// Drain `progress_rx` first (or concurrently): the indexer blocks
    /// once [`PROGRESS_CHANNEL_CAPACITY`] messages are pending.
    pub fn join(self) -> Result<IndexSummary> {
        self.thread.join().map_err(|_| IndexError::Panicked)?
    }
}

/// Start a run on a background thread.
pub fn start_index(config: IndexConfig) -> Result<IndexHandle> {
    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<IndexProgress>(PROGRESS_CHANNEL_CAPACITY);

    let thread = thread::Builder::new()
        .name("fileindex-indexer".into())
        .spawn(move || {
            info!("Starting index of {}", config.source.display());
            run_index(&config, &progress_tx)
        })
        .map_err(IndexError::Spawn)?;

    Ok(IndexHandle {
        progress_rx,
        thread,
    })
}

/// Run the whole pipeline on the calling thread.
///
/// On hashing failures the file manifest is still written (failed digests
/// left empty) unless `settings.strict` is set; either way the run ends
/// with [`IndexError::PartialFailure`].
pub fn run_index(config: &IndexConfig, progress_tx: &Sender<IndexProgress>) -> Result<IndexSummary> {
    config.settings.validate()?;

    let settings = &config.settings;
    let mut stores = IndexStores::with_attributes(
        settings.store_layout(),
        settings.dir_attribute,
        settings.link_attribute,
    );
    let result = run_phases(config, &mut stores, progress_tx);
    stores.release();

    if let Err(err) = &result {
        if err.is_capacity() {
            warn!("Index aborted: record stores exhausted ({err})");
        }
    }
    result
}

fn run_phases(
    config: &IndexConfig,
    stores: &mut IndexStores,
    progress_tx: &Sender<IndexProgress>,
) -> Result<IndexSummary> {
    let start = Instant::now();
    let settings = &config.settings;
    let manifests = settings.manifest_paths();

    let walk_stats = in_phase(Phase::Traversal, progress_tx, || {
        walk(&config.source, &config.exclusions, stores, progress_tx)
    })?;
    info!(
        dirs = walk_stats.dirs,
        files = walk_stats.files,
        links = walk_stats.links,
        excluded = walk_stats.excluded,
        "traversal complete"
    );

    let dirs_listed = in_phase(Phase::Directories, progress_tx, || {
        emit_directories(&manifests.dirs, &stores.dirs)
    })?;

    let links_listed = in_phase(Phase::Symlinks, progress_tx, || {
        emit_symlinks(&manifests.links, &stores.links)
    })?;

    let (digests, failures) = in_phase(Phase::Hashing, progress_tx, || {
        hash_files(stores, settings, progress_tx)
    })?;

    if !failures.is_empty() && settings.strict {
        warn!(
            failed = failures.len(),
            "strict mode: file manifest not written"
        );
        return Err(partial_failure(digests, failures));
    }

    let files_listed = in_phase(Phase::Files, progress_tx, || {
        emit_files(&manifests.files, &stores.files, &digests)
    })?;

    if !failures.is_empty() {
        return Err(partial_failure(digests, failures));
    }

    let summary = IndexSummary {
        walk: walk_stats,
        dirs_listed,
        links_listed,
        files_listed,
        hashed: digests.filled(),
        manifests,
        duration: start.elapsed(),
    };
    info!("Index complete in {:?}", summary.duration);
    Ok(summary)
}

/// Hashing with partial failures turned back into data, so the pipeline
/// can still emit the file manifest.
fn hash_files(
    stores: &IndexStores,
    settings: &IndexSettings,
    progress_tx: &Sender<IndexProgress>,
) -> Result<(DigestBuffer, Vec<HashFailure>)> {
    let digests = compute_digests(
        &stores.files,
        settings.worker_count,
        settings.read_buffer_size,
        settings.digest,
        progress_tx,
    );
    match digests {
        Ok(digests) => Ok((digests, Vec::new())),
        Err(IndexError::PartialFailure(partial)) => {
            let PartialFailure { digests, failures } = *partial;
            Ok((digests, failures))
        }
        Err(err) => Err(err),
    }
}

fn partial_failure(digests: DigestBuffer, failures: Vec<HashFailure>) -> IndexError {
    IndexError::PartialFailure(Box::new(PartialFailure { digests, failures }))
}

/// Bracket `f` with phase-started / phase-finished progress messages.
fn in_phase<T>(
    phase: Phase,
    progress_tx: &Sender<IndexProgress>,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let start = Instant::now();
    info!("{phase}...");
    let _ = progress_tx.send(IndexProgress::PhaseStarted(phase));

    let value = f()?;

    let duration = start.elapsed();
    let _ = progress_tx.send(IndexProgress::PhaseFinished { phase, duration });
    Ok(value)
}
