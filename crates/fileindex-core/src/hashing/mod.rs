/// Hashing module: size-balanced partitioning of the File Store and the
/// fixed worker pool that fills the digest buffer.
pub mod digest;
pub mod partition;
pub mod scheduler;

pub use digest::{Digest, DigestAlgorithm, DigestBuffer, MAX_DIGEST_LEN};
pub use partition::{partition_by_size, Partition};
pub use scheduler::{compute_digests, FailureKind, FailureStage, HashFailure, WorkerReport};
