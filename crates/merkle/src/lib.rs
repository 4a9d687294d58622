//! Merkle mountain range accumulator and chained proofs.
//!
//! # Mountain ranges
//!
//! [`MountainRange`] is an append-only, truncatable forest of perfect binary
//! trees over some [`MmrNode`] type.  A [`MountainView`] looks at the range as
//! it stood at any earlier size and computes the root and inclusion proofs for
//! that size, which never change as more leaves are added.
//!
//! ```rust,ignore
//! use mmv_merkle::{Blake2bHasher, MountainRange, PlainNode, Proof};
//!
//! let hasher = Blake2bHasher::default();
//! let mut range = MountainRange::<PlainNode, _>::new(hasher);
//! for i in 0u32..5 {
//!     range.add(PlainNode::from_data(&hasher, &i.to_le_bytes()))?;
//! }
//!
//! let view = range.view();
//! let proof = Proof::from(view.get_proof(2)?);
//! assert_eq!(proof.check_proof(view.leaf_hash(2)?), view.root()?);
//! ```
//!
//! # Proofs
//!
//! A [`Proof`] chains [`Branch`]es, each proving the previous one's output
//! into some larger structure.  Branches that fail to check produce the zero
//! digest rather than an error, so a failed proof never matches a real root.
//!
//! # Modules
//!
//! - `hasher`: digest type and hash algorithm adapters
//! - `node`: plain and power node types
//! - `layer`: chunked and overlay storage for one height of a range
//! - `range`: [`MountainRange`]
//! - `view`: [`MountainView`] and proof shapes
//! - `branch`: the tagged branch variants
//! - `proof`: [`Proof`] and [`ProofVerifier`]
//! - `tree`: binary merkle tree for legacy branches

// stupid linter issue
#[cfg(test)]
use criterion as _;
#[cfg(test)]
use proptest as _;
#[cfg(test)]
use serde_json as _;

pub mod branch;
pub mod error;
pub mod hasher;
pub mod layer;
pub mod node;
pub mod proof;
pub mod range;
pub mod tree;
pub mod view;

// Common re-exports for ergonomic access at the crate root.
pub use branch::{
    AccountBranch, AccountProofVerifier, Branch, BranchType, LegacyBranch, MmrBranch,
    MultiPartBranch, RlpProof,
};
pub use error::MerkleError;
pub use hasher::{
    Blake2bHasher, DigestHasher, Hash256, Keccak256Hasher, NodeHasher, Sha256Hasher,
    Sha256dHasher, ZERO_HASH,
};
pub use layer::{ChunkedLayer, LeafSource, NodeLayer, OverlayLayer};
pub use node::{MmrNode, NodePower, PlainNode, PowerNode};
pub use proof::{Proof, ProofVerifier};
pub use range::MountainRange;
pub use tree::LegacyMerkleTree;
pub use view::{MountainView, mmr_proof_index, proof_bits};
