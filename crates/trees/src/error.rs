use canopy_crypto::Digest;
use canopy_storage::StoreError;
use thiserror::Error;

/// Errors surfaced by tree operations.
///
/// Proof verification never errors; it reports mismatches as `false`.
#[derive(Debug, Error)]
pub enum Error {
    /// The storage backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The queried event digest was never added to the hyper tree.
    #[error("event digest {0:?} is not present in the index")]
    EventNotIndexed(Digest),
}
