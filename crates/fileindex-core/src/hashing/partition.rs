/// Size-balanced partitioning of the File Store across hashing workers.
///
/// Walks the store once in iteration order and cuts it into contiguous
/// ranges whose byte totals are roughly `total / workers` each. Ranges
/// being contiguous is what lets every worker own a disjoint slice of the
/// digest buffer without any coordination.
use crate::model::{RecordPos, RecordStore};

/// One worker's contiguous range of the File Store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub worker: usize,
    /// Index of the first file in File Store order.
    pub start: usize,
    /// Number of files in the range. Never zero.
    pub len: usize,
    /// Sum of the range's file sizes.
    pub bytes: u64,
    /// Store position of the first file, for resuming iteration.
    pub start_pos: RecordPos,
}

impl Partition {
    fn open(worker: usize, start: usize, start_pos: RecordPos) -> Self {
        Self {
            worker,
            start,
            len: 0,
            bytes: 0,
            start_pos,
        }
    }

    /// Index one past the last file.
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Split `files` into at most `worker_count` contiguous, non-empty ranges.
///
/// `worker_count` is clamped to `1..=files.len()`. Workers `0..n-1` take
/// files until their own byte total reaches `total / n`, or until exactly
/// one file per remaining worker is left; the last worker takes the rest.
/// An empty store yields no partitions.
pub fn partition_by_size(files: &RecordStore, worker_count: usize) -> Vec<Partition> {
    let file_count = files.len();
    if file_count == 0 {
        return Vec::new();
    }

    let workers = worker_count.clamp(1, file_count);
    let target = files.total_size() / workers as u64;
    let mut partitions = Vec::with_capacity(workers);
    let mut current: Option<Partition> = None;

    for (index, record) in files.iter().enumerate() {
        let worker = partitions.len();
        let part = current.get_or_insert_with(|| Partition::open(worker, index, record.pos()));
        part.len += 1;
        part.bytes += record.meta.size_or_time;

        let is_last_worker = worker + 1 == workers;
        let files_left = file_count - index - 1;
        let workers_left = workers - worker - 1;
        if !is_last_worker && (part.bytes >= target || files_left == workers_left) {
            partitions.extend(current.take());
        }
    }
    partitions.extend(current.take());

    debug_assert_eq!(partitions.len(), workers);
    partitions
}
