/// Tab-separated manifest writers.
///
/// One line per record, no header, no quoting, `\n` terminated. Paths are
/// written as raw bytes. Permission bits are written in decimal.
use crate::hashing::DigestBuffer;
use crate::model::{RecordRef, RecordStore};
use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use std::fs;
use std::io::Write;
use tracing::warn;

fn tsv_writer<W: Write>(out: W) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(out)
}

/// Numeric fields shared by every manifest line.
struct CommonFields {
    permissions: String,
    owner: String,
    group: String,
}

impl CommonFields {
    fn of(record: &RecordRef<'_>) -> Self {
        if breaks_line(record.path_bytes()) {
            warn!(
                path = %record.path().display(),
                "path contains a tab or newline; its manifest line will be ambiguous"
            );
        }
        Self {
            permissions: record.meta.permissions.to_string(),
            owner: record.meta.owner_id.to_string(),
            group: record.meta.group_id.to_string(),
        }
    }
}

/// Paths are written unquoted, so these bytes split fields or lines.
fn breaks_line(path: &[u8]) -> bool {
    path.iter().any(|&b| b == b'\t' || b == b'\n')
}

/// `path, permission_bits, owner_id, group_id`
pub fn write_directories<W: Write>(out: W, dirs: &RecordStore) -> csv::Result<usize> {
    let mut writer = tsv_writer(out);
    let mut lines = 0;
    for record in dirs.iter() {
        let c = CommonFields::of(&record);
        writer.write_record([
            record.path_bytes(),
            c.permissions.as_bytes(),
            c.owner.as_bytes(),
            c.group.as_bytes(),
        ])?;
        lines += 1;
    }
    writer.flush()?;
    Ok(lines)
}

/// `path, permission_bits, owner_id, group_id, link_target`
///
/// The target is read with `readlink` at emission time. A link that can no
/// longer be read is logged and written with an empty target.
pub fn write_symlinks<W: Write>(out: W, links: &RecordStore) -> csv::Result<usize> {
    use std::os::unix::ffi::OsStrExt;

    let mut writer = tsv_writer(out);
    let mut lines = 0;
    for record in links.iter() {
        let c = CommonFields::of(&record);
        let target = match fs::read_link(record.path()) {
            Ok(target) => target,
            Err(err) => {
                warn!(path = %record.path().display(), "cannot read link target: {err}");
                Default::default()
            }
        };
        writer.write_record([
            record.path_bytes(),
            c.permissions.as_bytes(),
            c.owner.as_bytes(),
            c.group.as_bytes(),
            target.as_os_str().as_bytes(),
        ])?;
        lines += 1;
    }
    writer.flush()?;
    Ok(lines)
}

/// `path, permission_bits, owner_id, group_id, digest_hex`
///
/// Walks the File Store and the digest buffer in lock-step. Files whose
/// digest is missing get an empty digest field.
pub fn write_files<W: Write>(
    out: W,
    files: &RecordStore,
    digests: &DigestBuffer,
) -> csv::Result<usize> {
    let mut writer = tsv_writer(out);
    let mut lines = 0;
    for (record, digest) in files.iter().zip(digests.iter()) {
        let c = CommonFields::of(&record);
        let hex = digest.as_ref().map(|d| d.to_hex()).unwrap_or_default();
        writer.write_record([
            record.path_bytes(),
            c.permissions.as_bytes(),
            c.owner.as_bytes(),
            c.group.as_bytes(),
            hex.as_bytes(),
        ])?;
        lines += 1;
    }
    writer.flush()?;
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::DigestAlgorithm;
    use crate::model::{RecordMeta, StoreLayout};

    fn meta(permissions: u32, owner_id: u32, group_id: u32) -> RecordMeta {
        RecordMeta {
            permissions,
            owner_id,
            group_id,
            size_or_time: 0,
        }
    }

    #[test]
    fn directory_lines_are_tab_separated() {
        let mut dirs = RecordStore::new(StoreLayout::default());
        dirs.append(b"/srv/a", meta(0o755, 1000, 100)).unwrap();
        dirs.append(b"/srv/a b", meta(0o700, 0, 0)).unwrap();

        let mut out = Vec::new();
        let lines = write_directories(&mut out, &dirs).unwrap();
        assert_eq!(lines, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "/srv/a\t493\t1000\t100\n/srv/a b\t448\t0\t0\n"
        );
    }

    #[test]
    fn file_lines_carry_uppercase_digest_or_nothing() {
        let mut files = RecordStore::new(StoreLayout::default());
        files.append(b"/x", meta(0o644, 1, 2)).unwrap();
        files.append(b"/y", meta(0o600, 3, 4)).unwrap();

        let mut digests = DigestBuffer::with_len(2);
        let d = DigestAlgorithm::Md5.hash_bytes(b"hello");
        digests.slots_mut()[0] = Some(d);

        let mut out = Vec::new();
        write_files(&mut out, &files, &digests).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], format!("/x\t420\t1\t2\t{}", d.to_hex()));
        assert_eq!(lines[1], "/y\t384\t3\t4\t");
        assert!(d.to_hex().chars().all(|c| !c.is_ascii_lowercase()));
    }

    #[test]
    fn non_utf8_paths_are_written_verbatim() {
        let mut dirs = RecordStore::new(StoreLayout::default());
        dirs.append(b"/tmp/\xff\xfe", meta(0o755, 0, 0)).unwrap();

        let mut out = Vec::new();
        write_directories(&mut out, &dirs).unwrap();
        assert!(out.starts_with(b"/tmp/\xff\xfe\t"));
    }

    #[test]
    fn unreadable_link_target_is_empty() {
        let mut links = RecordStore::new(StoreLayout::default());
        links
            .append(b"/nonexistent/fileindex-link", meta(0o777, 0, 0))
            .unwrap();

        let mut out = Vec::new();
        write_symlinks(&mut out, &links).unwrap();
        assert_eq!(out, b"/nonexistent/fileindex-link\t511\t0\t0\t\n");
    }

    #[test]
    fn separator_bytes_in_paths_are_detected() {
        assert!(breaks_line(b"/srv/a\tb"));
        assert!(breaks_line(b"/srv/a\nb"));
        assert!(!breaks_line(b"/srv/a b"));

        // Still written, one record per entry.
        let mut dirs = RecordStore::new(StoreLayout::default());
        dirs.append(b"/srv/a\tb", meta(0o755, 0, 0)).unwrap();
        let mut out = Vec::new();
        assert_eq!(write_directories(&mut out, &dirs).unwrap(), 1);
        assert_eq!(out, b"/srv/a\tb\t493\t0\t0\n");
    }

    #[test]
    fn empty_store_writes_nothing() {
        let store = RecordStore::new(StoreLayout::default());
        let mut out = Vec::new();
        assert_eq!(write_directories(&mut out, &store).unwrap(), 0);
        assert!(out.is_empty());
    }
}
