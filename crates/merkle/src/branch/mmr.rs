use mmv_codec::{Codec, CodecError, Decoder, Encoder, VarInt};
#[cfg(feature = "borsh")]
use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::*;

use crate::error::MerkleError;
use crate::hasher::{Hash256, NodeHasher, ZERO_HASH, eq_ct};
use crate::view::proof_bits;

/// Inclusion proof of a leaf in a mountain range view.
///
/// The side each hash goes on isn't stored, it's recomputed from the leaf
/// index and view size, so a branch can only ever be read one way.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "borsh", derive(BorshSerialize, BorshDeserialize))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MmrBranch {
    index: u64,
    size: u64,
    branch: Vec<Hash256>,
}

impl MmrBranch {
    /// Constructs a new instance.
    pub fn new(index: u64, size: u64, branch: Vec<Hash256>) -> Self {
        Self {
            index,
            size,
            branch,
        }
    }

    /// Index of the proven leaf.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Size of the view the branch was built against.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Hashes, leaf side first.
    pub fn branch(&self) -> &[Hash256] {
        &self.branch
    }

    /// Replays the branch from `hash` for nodes with `extra_hashes` extra
    /// values per step, failing on anything a canonical branch can't contain.
    ///
    /// A sibling equal to the running digest is refused on either side, so a
    /// leaf sitting next to an identical leaf has no valid proof.
    pub fn try_check<H: NodeHasher>(
        &self,
        hash: Hash256,
        hasher: &H,
        extra_hashes: usize,
    ) -> Result<Hash256, MerkleError> {
        if self.index >= self.size {
            return Err(MerkleError::IndexOutOfRange {
                index: self.index,
                len: self.size,
            });
        }

        let bits = proof_bits(self.index, self.size, extra_hashes);
        if bits.len() != self.branch.len() {
            return Err(MerkleError::BranchShapeMismatch {
                expected: bits.len(),
                found: self.branch.len(),
            });
        }

        let mut cur = hash;
        for (i, (sibling, &left)) in self.branch.iter().zip(&bits).enumerate() {
            if eq_ct(sibling, &cur) {
                return Err(MerkleError::NonCanonicalProof(i));
            }

            cur = if left {
                hasher.hash_two(sibling, &cur)
            } else {
                hasher.hash_two(&cur, sibling)
            };
        }

        Ok(cur)
    }

    /// Like [`MmrBranch::try_check`], but any failure is the zero digest.
    pub fn safe_check<H: NodeHasher>(
        &self,
        hash: Hash256,
        hasher: &H,
        extra_hashes: usize,
    ) -> Hash256 {
        match self.try_check(hash, hasher, extra_hashes) {
            Ok(h) => h,
            Err(e) => {
                warn!(%e, index = %self.index, size = %self.size, "mmr: rejected branch");
                ZERO_HASH
            }
        }
    }
}

impl Codec for MmrBranch {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        let index = VarInt::decode(dec)?.inner();
        let size = VarInt::decode(dec)?.inner();
        let branch = Vec::<Hash256>::decode(dec)?;
        Ok(Self {
            index,
            size,
            branch,
        })
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        VarInt::new(self.index).encode(enc)?;
        VarInt::new(self.size).encode(enc)?;
        self.branch.encode(enc)
    }
}
