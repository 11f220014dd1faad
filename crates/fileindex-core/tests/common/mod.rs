//! Tree builders shared by the end-to-end tests.

use std::fs;
use std::path::{Path, PathBuf};

/// Builds `root/a/<200-byte dirs...>/<file>` with every path short enough to
/// create, then renames `a` to a 250-byte name so the deepest entries end
/// up at or beyond `MAX_PATH_LEN`.
pub fn build_overlong_tree(root: &Path) -> PathBuf {
    let target = 3_950;
    let mut dir = root.join("a");
    fs::create_dir(&dir).unwrap();
    while dir.as_os_str().len() + 1 + 200 + 1 + 10 <= target {
        dir.push("d".repeat(200));
        fs::create_dir(&dir).unwrap();
    }
    let name_len = target - dir.as_os_str().len() - 1;
    fs::write(dir.join("f".repeat(name_len)), b"deep").unwrap();

    let long = root.join("x".repeat(250));
    fs::rename(root.join("a"), &long).unwrap();
    long
}
