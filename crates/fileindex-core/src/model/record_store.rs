/// Append-only, block-backed record store.
///
/// Records are packed back to back into fixed-size byte blocks: a 24-byte
/// header followed by the path bytes, with no per-record heap allocation.
/// Running out of room in the current block costs one new block; earlier
/// blocks are never reallocated, so a record never moves once written and
/// never spans two blocks.
///
/// Each block is a `Vec<u8>` reserved once at `block_size` bytes. Its
/// `len()` is the write offset, so iteration knows where a block ends
/// without a terminator.
use super::record::{AttributeKind, RecordMeta, RecordPos, RecordRef, HEADER_LEN};
use crate::error::{CapacityLimit, StoreError};
use tracing::debug;

/// Default block size: 1 MiB.
pub const DEFAULT_BLOCK_SIZE: usize = 1 << 20;

/// Default upper bound on the number of blocks per store.
pub const DEFAULT_MAX_BLOCKS: usize = 65_536;

/// Block geometry and attribute meaning for one store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreLayout {
    pub block_size: usize,
    pub max_blocks: usize,
    pub attribute: AttributeKind,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            max_blocks: DEFAULT_MAX_BLOCKS,
            attribute: AttributeKind::Size,
        }
    }
}

impl StoreLayout {
    pub fn with_attribute(mut self, attribute: AttributeKind) -> Self {
        self.attribute = attribute;
        self
    }

    /// Smallest block that can hold a record with a `path_len`-byte path.
    pub const fn min_block_size(path_len: usize) -> usize {
        HEADER_LEN + path_len
    }
}

/// Ordered, append-only sequence of records.
#[derive(Debug)]
pub struct RecordStore {
    blocks: Vec<Vec<u8>>,
    layout: StoreLayout,
    len: usize,
    total_size: u64,
    released: bool,
}

/// Positions, offsets and path lengths are encoded as `u32`.
const MAX_ADDRESSABLE: usize = u32::MAX as usize;

impl RecordStore {
    /// Create an empty store. No block is allocated until the first append.
    ///
    /// Block size and block count are capped at `u32::MAX` so every
    /// [`RecordPos`] stays exact.
    pub fn new(mut layout: StoreLayout) -> Self {
        layout.block_size = layout.block_size.min(MAX_ADDRESSABLE);
        layout.max_blocks = layout.max_blocks.min(MAX_ADDRESSABLE);
        Self {
            blocks: Vec::new(),
            layout,
            len: 0,
            total_size: 0,
            released: false,
        }
    }

    /// Append a record and return its position.
    ///
    /// Fails with `CapacityExceeded` when the record cannot fit a single
    /// block or every block is in use, and with `AllocationFailure` when a
    /// new block cannot be reserved. A failed append leaves the store as it
    /// was.
    pub fn append(&mut self, path: &[u8], meta: RecordMeta) -> Result<RecordPos, StoreError> {
        if self.released {
            return Err(StoreError::Released);
        }

        let record_len = HEADER_LEN + path.len();
        if record_len > self.layout.block_size {
            return Err(StoreError::CapacityExceeded(CapacityLimit::RecordSize {
                record_len,
                block_size: self.layout.block_size,
            }));
        }

        let needs_block = match self.blocks.last() {
            Some(block) => block.len() + record_len > self.layout.block_size,
            None => true,
        };
        if needs_block {
            self.push_block()?;
        }

        let block_idx = self.blocks.len() - 1;
        let block = &mut self.blocks[block_idx];
        let offset = block.len();
        // Never grows past the reserved capacity, so this cannot reallocate.
        block.extend_from_slice(&meta.encode(path.len() as u32));
        block.extend_from_slice(path);

        self.len += 1;
        if self.layout.attribute == AttributeKind::Size {
            self.total_size += meta.size_or_time;
        }

        Ok(RecordPos {
            block: block_idx as u32,
            offset: offset as u32,
        })
    }

    fn push_block(&mut self) -> Result<(), StoreError> {
        if self.blocks.len() >= self.layout.max_blocks {
            return Err(StoreError::CapacityExceeded(CapacityLimit::Blocks {
                max_blocks: self.layout.max_blocks,
            }));
        }

        let bytes = self.layout.block_size;
        let mut block = Vec::new();
        block
            .try_reserve_exact(bytes)
            .map_err(|source| StoreError::AllocationFailure { bytes, source })?;
        self.blocks
            .try_reserve(1)
            .map_err(|source| StoreError::AllocationFailure { bytes, source })?;
        self.blocks.push(block);
        debug!(blocks = self.blocks.len(), "record store grew");
        Ok(())
    }

    /// Iterate every record in append order. Each call starts a fresh cursor.
    pub fn iter(&self) -> Records<'_> {
        Records {
            store: self,
            block: 0,
            offset: 0,
        }
    }

    /// Iterate from `pos` (inclusive) to the end of the store.
    pub fn iter_from(&self, pos: RecordPos) -> Records<'_> {
        Records {
            store: self,
            block: pos.block as usize,
            offset: pos.offset as usize,
        }
    }

    /// Free every block. The store stays empty and rejects appends.
    /// Calling this more than once is harmless.
    pub fn release(&mut self) {
        if !self.released {
            debug!(blocks = self.blocks.len(), records = self.len, "releasing record store");
        }
        self.blocks = Vec::new();
        self.len = 0;
        self.total_size = 0;
        self.released = true;
    }

    /// Number of records appended.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sum of `size_or_time` over all records; always 0 for
    /// [`AttributeKind::ModifiedTime`] stores.
    #[inline]
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Effective block geometry after capping.
    #[inline]
    pub fn layout(&self) -> StoreLayout {
        self.layout
    }

    #[inline]
    pub fn attribute(&self) -> AttributeKind {
        self.layout.attribute
    }

    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for RecordStore {
    fn drop(&mut self) {
        self.release();
    }
}

/// Forward cursor over a [`RecordStore`].
pub struct Records<'a> {
    store: &'a RecordStore,
    block: usize,
    offset: usize,
}

impl<'a> Iterator for Records<'a> {
    type Item = RecordRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let data = self.store.blocks.get(self.block)?;
            if self.offset + HEADER_LEN > data.len() {
                self.block += 1;
                self.offset = 0;
                continue;
            }

            let start = self.offset;
            let (meta, path_len) = RecordMeta::decode(&data[start..start + HEADER_LEN]);
            let path_start = start + HEADER_LEN;
            let path = &data[path_start..path_start + path_len];
            self.offset = path_start + path_len;

            let pos = RecordPos {
                block: self.block as u32,
                offset: start as u32,
            };
            return Some(RecordRef::new(pos, path, meta));
        }
    }
}
