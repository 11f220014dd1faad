/// Manifest emission: the three line-oriented output files of a run.
///
/// The writers in [`writer`] work on any `io::Write`; the functions here
/// bind them to files at well-known locations and map failures onto
/// [`IndexError`].
pub mod writer;

pub use writer::{write_directories, write_files, write_symlinks};

use crate::error::{IndexError, Result};
use crate::hashing::DigestBuffer;
use crate::model::RecordStore;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DIRS_MANIFEST: &str = "fileindex_dirs";
pub const LINKS_MANIFEST: &str = "fileindex_links";
pub const FILES_MANIFEST: &str = "fileindex_files";

/// Output locations for the three manifests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPaths {
    pub dirs: PathBuf,
    pub links: PathBuf,
    pub files: PathBuf,
}

impl ManifestPaths {
    /// The well-known file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            dirs: dir.join(DIRS_MANIFEST),
            links: dir.join(LINKS_MANIFEST),
            files: dir.join(FILES_MANIFEST),
        }
    }
}

impl Default for ManifestPaths {
    /// Manifests in the system temporary directory.
    fn default() -> Self {
        Self::in_dir(&std::env::temp_dir())
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|source| IndexError::ManifestCreate {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufWriter::new(file))
}

fn written(path: &Path, result: csv::Result<usize>) -> Result<usize> {
    let lines = result.map_err(|source| IndexError::ManifestWrite {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), lines, "manifest written");
    Ok(lines)
}

pub fn emit_directories(path: &Path, dirs: &RecordStore) -> Result<usize> {
    written(path, write_directories(create(path)?, dirs))
}

pub fn emit_symlinks(path: &Path, links: &RecordStore) -> Result<usize> {
    written(path, write_symlinks(create(path)?, links))
}

pub fn emit_files(path: &Path, files: &RecordStore, digests: &DigestBuffer) -> Result<usize> {
    written(path, write_files(create(path)?, files, digests))
}
