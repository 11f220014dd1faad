/// A single indexed filesystem entry and the small fixed header stored
/// in front of its path bytes.
///
/// Records never own their path. A [`RecordRef`] borrows the path bytes
/// straight out of the store block they were written into.
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Longest path, in bytes, a record may carry. Paths of this length or
/// longer abort traversal with `PathTooLong`.
pub const MAX_PATH_LEN: usize = 4096;

/// Encoded size of [`RecordMeta`] plus the path length field.
pub(crate) const HEADER_LEN: usize = 24;

/// What the numeric `size_or_time` attribute means for a given store.
///
/// Fixed when the store is created, never per record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Byte size. Stores of this kind keep a running total.
    #[default]
    Size,
    /// Last-modification time, seconds since the Unix epoch.
    ModifiedTime,
}

/// Metadata captured from `lstat` at observation time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordMeta {
    /// Permission bits (`st_mode & 0o7777`).
    pub permissions: u32,
    pub owner_id: u32,
    pub group_id: u32,
    /// Byte size or mtime, depending on the store's [`AttributeKind`].
    pub size_or_time: u64,
}

impl RecordMeta {
    pub(crate) fn encode(&self, path_len: u32) -> [u8; HEADER_LEN] {
        let mut header = [0u8; HEADER_LEN];
        header[0..4].copy_from_slice(&path_len.to_le_bytes());
        header[4..8].copy_from_slice(&self.permissions.to_le_bytes());
        header[8..12].copy_from_slice(&self.owner_id.to_le_bytes());
        header[12..16].copy_from_slice(&self.group_id.to_le_bytes());
        header[16..24].copy_from_slice(&self.size_or_time.to_le_bytes());
        header
    }

    /// Decode a header, returning the metadata and the path length.
    pub(crate) fn decode(header: &[u8]) -> (Self, usize) {
        let meta = Self {
            permissions: read_u32(header, 4),
            owner_id: read_u32(header, 8),
            group_id: read_u32(header, 12),
            size_or_time: read_u64(header, 16),
        };
        (meta, read_u32(header, 0) as usize)
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

/// Stable location of a record inside its store.
///
/// Only meaningful to the store that handed it out; it can be passed back
/// to [`crate::model::RecordStore::iter_from`] to resume iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordPos {
    pub(crate) block: u32,
    pub(crate) offset: u32,
}

/// Borrowed view of one record.
#[derive(Clone, Copy, Debug)]
pub struct RecordRef<'a> {
    pos: RecordPos,
    path: &'a [u8],
    /// Metadata copied out of the record header.
    pub meta: RecordMeta,
}

impl<'a> RecordRef<'a> {
    pub(crate) fn new(pos: RecordPos, path: &'a [u8], meta: RecordMeta) -> Self {
        Self { pos, path, meta }
    }

    #[inline]
    pub fn pos(&self) -> RecordPos {
        self.pos
    }

    /// Raw path bytes as observed on disk.
    #[inline]
    pub fn path_bytes(&self) -> &'a [u8] {
        self.path
    }

    #[inline]
    pub fn path(&self) -> &'a Path {
        Path::new(OsStr::from_bytes(self.path))
    }
}
