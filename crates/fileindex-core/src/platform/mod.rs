/// Platform-specific functionality: Unix `lstat` metadata extraction and
/// path/byte conversion for the record store.
pub mod metadata;

pub use metadata::{path_bytes, record_meta, PERMISSION_MASK};
