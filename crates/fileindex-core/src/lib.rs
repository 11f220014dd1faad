/// fileindex core: traversal, record storage, parallel hashing and
/// manifest emission.
///
/// This crate contains all indexing logic with no CLI dependencies.
///
/// # Modules
///
/// - [`model`]: records and the block-backed, append-only record store.
/// - [`scanner`]: single-threaded tree walk into the three record stores.
/// - [`hashing`]: size-balanced partitioning and the scoped worker pool.
/// - [`manifest`]: tab-separated manifest writers.
/// - [`indexer`]: the end-to-end pipeline and its background-thread handle.
/// - [`platform`]: Unix metadata extraction.
/// - [`config`]: tunables, JSON loading and validation.
/// - [`error`]: the error taxonomy.
pub mod config;
pub mod error;
pub mod hashing;
pub mod indexer;
pub mod manifest;
pub mod model;
pub mod platform;
pub mod scanner;

pub use config::{IndexConfig, IndexSettings};
pub use error::{IndexError, PartialFailure, Result};
pub use indexer::{run_index, start_index, IndexHandle, IndexSummary, PROGRESS_CHANNEL_CAPACITY};
