/// Single-threaded tree walker that classifies every entry into one of
/// the three record stores.
///
/// Built on `walkdir`, which yields entries depth-first in directory
/// enumeration order: a subdirectory is entered as soon as it has been
/// recorded, before its later siblings are visited.
///
/// Any failure aborts the walk. Partially filled stores are left for the
/// caller to release.
use super::exclusion::ExclusionSet;
use super::progress::IndexProgress;
use super::IndexStores;
use crate::error::{IndexError, Result};
use crate::model::MAX_PATH_LEN;
use crate::platform::{path_bytes, record_meta};
use crossbeam_channel::Sender;
use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;
use walkdir::WalkDir;

/// Entries between two `IndexProgress::Update` messages.
const UPDATE_INTERVAL: u64 = 5_000;

/// Counters for one completed walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub dirs: u64,
    pub files: u64,
    pub links: u64,
    /// Directories recorded but not descended into.
    pub excluded: u64,
    /// Sum of file sizes.
    pub bytes: u64,
    pub duration: Duration,
}

impl WalkStats {
    pub fn entries(&self) -> u64 {
        self.dirs + self.files + self.links
    }
}

/// Walk `root`, appending every entry below it to `stores`.
///
/// The root itself is never recorded. Symbolic links are recorded and not
/// followed; directories listed in `exclusions` are recorded but not
/// entered. Everything that is neither a link nor a directory is a file.
pub fn walk(
    root: &Path,
    exclusions: &ExclusionSet,
    stores: &mut IndexStores,
    progress_tx: &Sender<IndexProgress>,
) -> Result<WalkStats> {
    let start = Instant::now();
    let mut stats = WalkStats::default();

    // The root is opened like `opendir` would: following symlinks.
    let root_meta = fs::metadata(root).map_err(|e| IndexError::from_io(root, e))?;
    if !root_meta.is_dir() {
        return Err(IndexError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut it = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter();

    while let Some(entry) = it.next() {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        check_path_len(entry.path())?;
        // Without link following this is `lstat`.
        let lstat = entry.metadata().map_err(|e| walk_error(root, e))?;
        let path = entry.into_path();

        let file_type = lstat.file_type();
        if file_type.is_symlink() {
            let meta = record_meta(&lstat, stores.links.attribute());
            stores.links.append(path_bytes(&path), meta)?;
            stats.links += 1;
        } else if file_type.is_dir() {
            let meta = record_meta(&lstat, stores.dirs.attribute());
            stores.dirs.append(path_bytes(&path), meta)?;
            stats.dirs += 1;
            if exclusions.contains(&path) {
                debug!(path = %path.display(), "excluded directory recorded, not entered");
                stats.excluded += 1;
                it.skip_current_dir();
            }
        } else {
            let meta = record_meta(&lstat, stores.files.attribute());
            stores.files.append(path_bytes(&path), meta)?;
            stats.files += 1;
            stats.bytes += lstat.len();
        }

        if stats.entries() % UPDATE_INTERVAL == 0 {
            let _ = progress_tx.send(IndexProgress::Update {
                dirs_found: stats.dirs,
                files_found: stats.files,
                links_found: stats.links,
                total_size: stats.bytes,
                current_path: path,
            });
        }
    }

    stats.duration = start.elapsed();
    debug!(
        "Walk complete: {} dirs, {} files, {} links in {:?}",
        stats.dirs, stats.files, stats.links, stats.duration
    );
    Ok(stats)
}

/// Map a `walkdir` failure onto the taxonomy, keeping the path it names.
fn walk_error(root: &Path, err: walkdir::Error) -> IndexError {
    let path = err.path().unwrap_or(root).to_path_buf();
    match err.into_io_error() {
        Some(source) => IndexError::from_io(&path, source),
        // Only link loops carry no I/O error, and links are never followed.
        None => IndexError::Io {
            path,
            source: io::Error::other("filesystem loop"),
        },
    }
}

/// Reject paths that reach the platform path limit.
pub fn check_path_len(path: &Path) -> Result<()> {
    let len = path_bytes(path).len();
    if len >= MAX_PATH_LEN {
        return Err(IndexError::PathTooLong {
            path: path.to_path_buf(),
            len,
            limit: MAX_PATH_LEN,
        });
    }
    Ok(())
}
