/// Unix metadata extraction.
///
/// Records carry permission bits, owner and group ids exactly as `lstat`
/// reported them, plus one numeric attribute whose meaning the store
/// decides.
use crate::model::{AttributeKind, RecordMeta};
use std::fs::Metadata;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// Bits of `st_mode` kept as a record's permissions (`ALLPERMS`).
pub const PERMISSION_MASK: u32 = 0o7777;

/// Build record metadata from an `lstat` result.
pub fn record_meta(meta: &Metadata, attribute: AttributeKind) -> RecordMeta {
    let size_or_time = match attribute {
        AttributeKind::Size => meta.len(),
        // Pre-epoch timestamps clamp to zero.
        AttributeKind::ModifiedTime => meta.mtime().max(0) as u64,
    };
    RecordMeta {
        permissions: meta.mode() & PERMISSION_MASK,
        owner_id: meta.uid(),
        group_id: meta.gid(),
        size_or_time,
    }
}

/// Raw bytes of a path, without any lossy conversion.
#[inline]
pub fn path_bytes(path: &Path) -> &[u8] {
    path.as_os_str().as_bytes()
}
