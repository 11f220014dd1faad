/// Runtime configuration.
///
/// [`IndexSettings`] holds the tunables and can be loaded from a JSON file;
/// [`IndexConfig`] adds the per-run inputs (source root and exclusions).
/// Callers such as the CLI layer their own overrides on top of a loaded or
/// default `IndexSettings` and then call [`IndexSettings::validate`].
use crate::error::ConfigError;
use crate::hashing::DigestAlgorithm;
use crate::manifest::ManifestPaths;
use crate::model::{
    AttributeKind, StoreLayout, DEFAULT_BLOCK_SIZE, DEFAULT_MAX_BLOCKS, MAX_PATH_LEN,
};
use crate::scanner::ExclusionSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default per-worker read buffer: 8 MiB.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 << 20;

/// Tunables for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexSettings {
    /// Hashing threads. Clamped to the file count at run time.
    pub worker_count: usize,
    /// Bytes read per `read` call in each worker.
    pub read_buffer_size: usize,
    /// Record store block size in bytes.
    pub block_size: usize,
    /// Block limit per record store.
    pub max_blocks: usize,
    /// Directory the three manifests are written to.
    pub output_dir: PathBuf,
    /// Skip the file manifest entirely when any file fails to hash.
    pub strict: bool,
    /// Content hash written to the file manifest.
    pub digest: DigestAlgorithm,
    /// What `size_or_time` holds for directory records.
    pub dir_attribute: AttributeKind,
    /// What `size_or_time` holds for symlink records.
    pub link_attribute: AttributeKind,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            block_size: DEFAULT_BLOCK_SIZE,
            max_blocks: DEFAULT_MAX_BLOCKS,
            output_dir: std::env::temp_dir(),
            strict: false,
            digest: DigestAlgorithm::default(),
            dir_attribute: AttributeKind::Size,
            link_attribute: AttributeKind::Size,
        }
    }
}

impl IndexSettings {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(invalid("worker_count", "must be at least 1"));
        }
        if self.read_buffer_size == 0 {
            return Err(invalid("read_buffer_size", "must be at least 1 byte"));
        }
        // Any path the walker accepts must fit in one block.
        let min_block = StoreLayout::min_block_size(MAX_PATH_LEN);
        if self.block_size < min_block {
            return Err(invalid(
                "block_size",
                format!("must be at least {min_block} bytes"),
            ));
        }
        // Record positions and path lengths are stored as u32.
        if u32::try_from(self.block_size).is_err() {
            return Err(invalid(
                "block_size",
                format!("must be at most {} bytes", u32::MAX),
            ));
        }
        if self.max_blocks == 0 {
            return Err(invalid("max_blocks", "must be at least 1"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(invalid("output_dir", "must not be empty"));
        }
        Ok(())
    }

    pub fn store_layout(&self) -> StoreLayout {
        StoreLayout {
            block_size: self.block_size,
            max_blocks: self.max_blocks,
            ..StoreLayout::default()
        }
    }

    pub fn manifest_paths(&self) -> ManifestPaths {
        ManifestPaths::in_dir(&self.output_dir)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Everything one indexing run needs.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Root of the tree to index.
    pub source: PathBuf,
    pub exclusions: ExclusionSet,
    pub settings: IndexSettings,
}

impl IndexConfig {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            exclusions: ExclusionSet::default(),
            settings: IndexSettings::default(),
        }
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn with_settings(mut self, settings: IndexSettings) -> Self {
        self.settings = settings;
        self
    }
}
