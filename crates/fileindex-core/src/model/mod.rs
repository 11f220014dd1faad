/// Data model: records, the block-backed record store, and byte-size
/// formatting for progress output.
pub mod record;
pub mod record_store;
pub mod size;

pub use record::{AttributeKind, RecordMeta, RecordPos, RecordRef, MAX_PATH_LEN};
pub use record_store::{RecordStore, Records, StoreLayout, DEFAULT_BLOCK_SIZE, DEFAULT_MAX_BLOCKS};
