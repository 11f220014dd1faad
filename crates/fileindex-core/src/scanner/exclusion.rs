/// Directories that are recorded but never descended into.
///
/// Matching is exact path equality on the raw bytes of the joined child
/// path. There is no prefix, glob or normalisation step: `/data/tmp`
/// excludes exactly that directory, not `/data/tmp2` and not `/data/tmp/`.
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Immutable set of excluded directory paths.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    paths: HashSet<OsString>,
}

impl ExclusionSet {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths
                .into_iter()
                .map(|p| p.into().into_os_string())
                .collect(),
        }
    }

    #[inline]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path.as_os_str())
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
