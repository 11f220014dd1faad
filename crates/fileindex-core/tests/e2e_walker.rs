/// End-to-end walker tests.
///
/// These run the real `walk` against a `tempfile` tree and inspect the
/// three record stores it fills: classification, ordering, exclusion and
/// the root-is-not-recorded rule.
use fileindex_core::model::{AttributeKind, RecordStore, StoreLayout, MAX_PATH_LEN};
use fileindex_core::scanner::{walk, ExclusionSet, IndexStores};
use fileindex_core::IndexError;
use std::fs;
use std::os::unix::fs::{symlink, MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

mod common;
use common::build_overlong_tree;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// ```text
/// root/
///   a.txt        (5 bytes)
///   link -> a.txt
///   sub/
///     b.txt      (6 bytes)
///     deep/
///       c.txt    (1 byte)
///   skip/
///     hidden.txt (3 bytes)
/// ```
fn build_tree(root: &Path) {
    fs::write(root.join("a.txt"), b"hello").unwrap();
    symlink("a.txt", root.join("link")).unwrap();
    fs::create_dir_all(root.join("sub/deep")).unwrap();
    fs::write(root.join("sub/b.txt"), b"world!").unwrap();
    fs::write(root.join("sub/deep/c.txt"), b"x").unwrap();
    fs::create_dir(root.join("skip")).unwrap();
    fs::write(root.join("skip/hidden.txt"), b"abc").unwrap();
}

fn walk_tree(root: &Path, exclusions: &ExclusionSet) -> (IndexStores, fileindex_core::scanner::WalkStats) {
    let (tx, _rx) = crossbeam_channel::unbounded();
    let mut stores = IndexStores::new(StoreLayout::default());
    let stats = walk(root, exclusions, &mut stores, &tx).unwrap();
    (stores, stats)
}

fn paths(store: &RecordStore) -> Vec<PathBuf> {
    store.iter().map(|r| r.path().to_path_buf()).collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn every_entry_lands_in_exactly_one_store() {
    let tmp = TempDir::new().unwrap();
    build_tree(tmp.path());

    let (stores, stats) = walk_tree(tmp.path(), &ExclusionSet::default());

    // sub, sub/deep, skip
    assert_eq!(stores.dirs.len(), 3);
    // a.txt, sub/b.txt, sub/deep/c.txt, skip/hidden.txt
    assert_eq!(stores.files.len(), 4);
    assert_eq!(stores.links.len(), 1);
    assert_eq!(stores.entry_count(), 8);
    assert_eq!(stats.entries(), 8);
    assert_eq!(stats.bytes, 5 + 6 + 1 + 3);
    assert_eq!(stores.files.total_size(), stats.bytes);
}

#[test]
fn root_is_not_recorded() {
    let tmp = TempDir::new().unwrap();
    build_tree(tmp.path());

    let (stores, _) = walk_tree(tmp.path(), &ExclusionSet::default());
    let root = tmp.path().to_path_buf();
    assert!(!paths(&stores.dirs).contains(&root));
    for path in paths(&stores.dirs)
        .into_iter()
        .chain(paths(&stores.files))
        .chain(paths(&stores.links))
    {
        assert!(path.starts_with(&root), "{} outside root", path.display());
        assert_ne!(path, root);
    }
}

#[test]
fn symlinks_are_recorded_not_followed() {
    let tmp = TempDir::new().unwrap();
    build_tree(tmp.path());
    // A link to a directory must not be entered.
    symlink(tmp.path().join("sub"), tmp.path().join("sub_link")).unwrap();

    let (stores, _) = walk_tree(tmp.path(), &ExclusionSet::default());

    let links = paths(&stores.links);
    assert_eq!(links.len(), 2);
    assert!(links.contains(&tmp.path().join("link")));
    assert!(links.contains(&tmp.path().join("sub_link")));
    assert!(!paths(&stores.files).iter().any(|p| p.starts_with(tmp.path().join("sub_link"))));
}

#[test]
fn excluded_directory_is_recorded_but_not_entered() {
    let tmp = TempDir::new().unwrap();
    build_tree(tmp.path());
    let skip = tmp.path().join("skip");

    let (stores, stats) = walk_tree(tmp.path(), &ExclusionSet::new([skip.clone()]));

    assert!(paths(&stores.dirs).contains(&skip));
    assert!(!paths(&stores.files).contains(&skip.join("hidden.txt")));
    assert_eq!(stats.excluded, 1);
    assert_eq!(stores.files.len(), 3);
}

#[test]
fn exclusion_is_exact_match() {
    let tmp = TempDir::new().unwrap();
    build_tree(tmp.path());

    // A prefix of a real directory excludes nothing.
    let (stores, stats) = walk_tree(tmp.path(), &ExclusionSet::new([tmp.path().join("sk")]));
    assert_eq!(stats.excluded, 0);
    assert_eq!(stores.files.len(), 4);
}

/// Recursive pre-order over the same `read_dir` order the walker sees:
/// each directory's contents come right after the directory itself.
fn preorder(dir: &Path, out: &mut Vec<PathBuf>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        out.push(path.clone());
        let meta = fs::symlink_metadata(&path).unwrap();
        if meta.is_dir() {
            preorder(&path, out);
        }
    }
}

#[test]
fn subdirectory_is_entered_before_later_siblings() {
    let tmp = TempDir::new().unwrap();
    for i in 0..6 {
        fs::create_dir_all(tmp.path().join(format!("d{i}"))).unwrap();
        fs::write(tmp.path().join(format!("d{i}/inner")), b"x").unwrap();
        fs::write(tmp.path().join(format!("f{i}")), b"y").unwrap();
    }

    let (stores, _) = walk_tree(tmp.path(), &ExclusionSet::default());

    let mut expected = Vec::new();
    preorder(tmp.path(), &mut expected);
    let expected_files: Vec<PathBuf> = expected
        .iter()
        .filter(|p| p.is_file())
        .cloned()
        .collect();
    let expected_dirs: Vec<PathBuf> = expected.into_iter().filter(|p| p.is_dir()).collect();

    assert_eq!(paths(&stores.files), expected_files);
    assert_eq!(paths(&stores.dirs), expected_dirs);
}

#[test]
fn file_store_records_sizes() {
    let tmp = TempDir::new().unwrap();
    build_tree(tmp.path());

    let (stores, _) = walk_tree(tmp.path(), &ExclusionSet::default());
    assert_eq!(stores.files.attribute(), AttributeKind::Size);
    let a = stores
        .files
        .iter()
        .find(|r| r.path() == tmp.path().join("a.txt"))
        .unwrap();
    assert_eq!(a.meta.size_or_time, 5);
}

#[test]
fn empty_root_yields_empty_stores() {
    let tmp = TempDir::new().unwrap();
    let (stores, stats) = walk_tree(tmp.path(), &ExclusionSet::default());
    assert_eq!(stores.entry_count(), 0);
    assert_eq!(stats.entries(), 0);
}

#[test]
fn file_root_is_not_a_directory() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("plain.txt");
    fs::write(&file, b"data").unwrap();

    let (tx, _rx) = crossbeam_channel::unbounded();
    let mut stores = IndexStores::new(StoreLayout::default());
    let err = walk(&file, &ExclusionSet::default(), &mut stores, &tx).unwrap_err();
    assert!(matches!(err, IndexError::NotADirectory { .. }));
}

#[test]
fn missing_root_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let (tx, _rx) = crossbeam_channel::unbounded();
    let mut stores = IndexStores::new(StoreLayout::default());
    let err = walk(
        &tmp.path().join("absent"),
        &ExclusionSet::default(),
        &mut stores,
        &tx,
    )
    .unwrap_err();
    assert!(matches!(err, IndexError::NotFound { .. }));
}

#[test]
fn exhausted_store_aborts_the_walk() {
    let tmp = TempDir::new().unwrap();
    for i in 0..64 {
        fs::write(tmp.path().join(format!("file_{i:02}")), b"").unwrap();
    }

    // One small block per store; 64 records cannot fit.
    let layout = StoreLayout {
        block_size: StoreLayout::min_block_size(tmp.path().as_os_str().len() + 16),
        max_blocks: 1,
        ..StoreLayout::default()
    };
    let (tx, _rx) = crossbeam_channel::unbounded();
    let mut stores = IndexStores::new(layout);
    let err = walk(tmp.path(), &ExclusionSet::default(), &mut stores, &tx).unwrap_err();
    assert!(err.is_capacity(), "unexpected error: {err}");
}

#[test]
fn overlong_path_aborts_the_walk() {
    let tmp = TempDir::new().unwrap();
    build_overlong_tree(tmp.path());

    let (tx, _rx) = crossbeam_channel::unbounded();
    let mut stores = IndexStores::new(StoreLayout::default());
    let err = walk(tmp.path(), &ExclusionSet::default(), &mut stores, &tx).unwrap_err();
    match err {
        IndexError::PathTooLong { len, limit, .. } => {
            assert_eq!(limit, MAX_PATH_LEN);
            assert!(len >= MAX_PATH_LEN);
        }
        other => panic!("expected PathTooLong, got {other}"),
    }
}

#[test]
fn unreadable_subdirectory_is_access_denied() {
    let tmp = TempDir::new().unwrap();
    build_tree(tmp.path());
    let locked = tmp.path().join("sub/deep");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users read through mode bits; nothing to check then.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let (tx, _rx) = crossbeam_channel::unbounded();
    let mut stores = IndexStores::new(StoreLayout::default());
    let result = walk(tmp.path(), &ExclusionSet::default(), &mut stores, &tx);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    match result {
        Err(IndexError::AccessDenied { path, .. }) => assert_eq!(path, locked),
        other => panic!("expected AccessDenied, got {other:?}"),
    }
}

#[test]
fn unreadable_excluded_directory_is_still_recorded() {
    let tmp = TempDir::new().unwrap();
    build_tree(tmp.path());
    let locked = tmp.path().join("sub");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let (stores, stats) = walk_tree(tmp.path(), &ExclusionSet::new([locked.clone()]));
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(paths(&stores.dirs).contains(&locked));
    assert_eq!(stats.excluded, 1);
    assert!(paths(&stores.files).iter().all(|p| !p.starts_with(&locked)));
}

#[test]
fn modified_time_attribute_is_recorded_for_directories() {
    let tmp = TempDir::new().unwrap();
    build_tree(tmp.path());

    let (tx, _rx) = crossbeam_channel::unbounded();
    let mut stores = IndexStores::with_attributes(
        StoreLayout::default(),
        AttributeKind::ModifiedTime,
        AttributeKind::Size,
    );
    walk(tmp.path(), &ExclusionSet::default(), &mut stores, &tx).unwrap();

    let sub = tmp.path().join("sub");
    let mtime = fs::metadata(&sub).unwrap().mtime() as u64;
    let record = stores.dirs.iter().find(|r| r.path() == sub).unwrap();
    assert_eq!(stores.dirs.attribute(), AttributeKind::ModifiedTime);
    assert_eq!(record.meta.size_or_time, mtime);
    assert_eq!(stores.dirs.total_size(), 0);
    assert_eq!(stores.files.attribute(), AttributeKind::Size);
}
