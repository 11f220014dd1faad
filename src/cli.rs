//! Command-line arguments and their translation into an [`IndexConfig`].

use anyhow::Context;
use clap::Parser;
use fileindex_core::hashing::DigestAlgorithm;
use fileindex_core::scanner::ExclusionSet;
use fileindex_core::{IndexConfig, IndexSettings};
use std::path::PathBuf;

/// Index a directory tree into directory, symlink and file manifests
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fileindex",
    version,
    about = "Index a directory tree into directory, symlink and file manifests",
    long_about = "Walks SOURCE_PATH once, recording every directory, symbolic link and file.\n\n\
                  Writes fileindex_dirs, fileindex_links and fileindex_files to the output\n\
                  directory. File contents are hashed in parallel by workers that each\n\
                  receive a contiguous, size-balanced share of the files.",
    after_help = "EXAMPLES:\n    \
        fileindex /srv/data\n    \
        fileindex /srv/data /srv/data/cache /srv/data/tmp -w 8\n    \
        fileindex /home -o /var/lib/fileindex --strict"
)]
pub struct CliArgs {
    /// Root of the tree to index
    #[arg(value_name = "SOURCE_PATH")]
    pub source: PathBuf,

    /// Directories to record but not descend into (exact path match)
    #[arg(value_name = "EXCLUDE_PATH")]
    pub exclude: Vec<PathBuf>,

    /// JSON settings file; flags below override its values
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of hashing workers [default: number of CPUs]
    #[arg(short, long, value_name = "NUM")]
    pub workers: Option<usize>,

    /// Bytes read per call by each hashing worker
    #[arg(long, value_name = "BYTES")]
    pub read_buffer: Option<usize>,

    /// Directory the manifests are written to [default: system temp dir]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Content hash for the file manifest: md5 or blake3 [default: md5]
    #[arg(short, long, value_name = "ALGORITHM")]
    pub digest: Option<DigestAlgorithm>,

    /// Do not write the file manifest if any file fails to hash
    #[arg(long)]
    pub strict: bool,

    /// Verbose logging (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl CliArgs {
    /// Log level selected by `-v`/`-q`.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    /// Settings from `--config` (or defaults) with flag overrides applied.
    pub fn settings(&self) -> anyhow::Result<IndexSettings> {
        let mut settings = match &self.config {
            Some(path) => IndexSettings::load(path)
                .with_context(|| format!("loading settings from '{}'", path.display()))?,
            None => IndexSettings::default(),
        };

        if let Some(workers) = self.workers {
            settings.worker_count = workers;
        }
        if let Some(read_buffer) = self.read_buffer {
            settings.read_buffer_size = read_buffer;
        }
        if let Some(digest) = self.digest {
            settings.digest = digest;
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        settings.strict |= self.strict;

        settings.validate().context("invalid settings")?;
        Ok(settings)
    }

    pub fn into_config(self) -> anyhow::Result<IndexConfig> {
        let settings = self.settings()?;
        Ok(IndexConfig::new(self.source)
            .with_exclusions(ExclusionSet::new(self.exclude))
            .with_settings(settings))
    }
}
