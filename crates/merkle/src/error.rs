use mmv_codec::CodecError;
use thiserror::Error;

/// Errors from mountain ranges, views and proofs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    /// Indexed a layer, range or view past its current size.
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Index asked for.
        index: u64,
        /// Size at the time.
        len: u64,
    },

    /// Work or stake would no longer fit in its 128 bit half.
    #[error("power value overflowed its 128 bit half")]
    PowerOverflow,

    /// Proof stream had an unknown tag or was short.
    #[error("corrupt proof stream: {0}")]
    CorruptProofStream(#[from] CodecError),

    /// A sibling in a branch was identical to the digest it combines with.
    #[error("non-canonical proof at step {0}")]
    NonCanonicalProof(usize),

    /// Branch length doesn't match the path shape for its index and size.
    #[error("branch has {found} hashes, path needs {expected}")]
    BranchShapeMismatch {
        /// Hashes the path needs.
        expected: usize,
        /// Hashes the branch has.
        found: usize,
    },

    /// Concatenated branch index no longer fits in 64 bits.
    #[error("branch too long to index")]
    BranchTooLong,

    /// Asked to split a proof into zero-byte chunks.
    #[error("chunk size must be nonzero")]
    InvalidChunkSize,

    /// Expected a proof that only carries a single multi-part branch.
    #[error("proof is not a multi-part chunk")]
    NotMultiPart,
}
