/// Scanner module: traversal of the source tree into the three record
/// stores.
///
/// Traversal is deliberately single-threaded; all parallelism lives in
/// [`crate::hashing`], which only starts once the walk has finished and
/// the stores are read-only.
pub mod exclusion;
pub mod progress;
pub mod walker;

pub use exclusion::ExclusionSet;
pub use progress::{IndexProgress, Phase};
pub use walker::{walk, WalkStats};

use crate::model::{AttributeKind, RecordStore, StoreLayout};

/// The Directory, File and Symlink stores of one run.
#[derive(Debug)]
pub struct IndexStores {
    pub dirs: RecordStore,
    pub files: RecordStore,
    pub links: RecordStore,
}

impl IndexStores {
    /// Create three empty stores sharing one block geometry.
    ///
    /// The File Store always tracks byte sizes, since the hashing scheduler
    /// partitions on them; `layout.attribute` applies to the other two.
    pub fn new(layout: StoreLayout) -> Self {
        Self::with_attributes(layout, layout.attribute, layout.attribute)
    }

    /// Like [`IndexStores::new`], with separate attributes for the
    /// Directory and Symlink stores.
    pub fn with_attributes(layout: StoreLayout, dirs: AttributeKind, links: AttributeKind) -> Self {
        Self {
            dirs: RecordStore::new(layout.with_attribute(dirs)),
            files: RecordStore::new(layout.with_attribute(AttributeKind::Size)),
            links: RecordStore::new(layout.with_attribute(links)),
        }
    }

    /// Total records across all three stores.
    pub fn entry_count(&self) -> usize {
        self.dirs.len() + self.files.len() + self.links.len()
    }

    /// Release every store. Safe to call on any exit path.
    pub fn release(&mut self) {
        self.dirs.release();
        self.files.release();
        self.links.release();
    }
}
