use mmv_codec::{Codec, CodecError, Decoder, Encoder, VarInt};
#[cfg(feature = "borsh")]
use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::*;

use crate::error::MerkleError;
use crate::hasher::{Hash256, NodeHasher, ZERO_HASH, eq_ct};

/// Binary merkle branch as used for Bitcoin style transaction trees, where
/// bit `i` of the index says whether the `i`th hash goes on the left.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "borsh", derive(BorshSerialize, BorshDeserialize))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LegacyBranch {
    index: u64,
    branch: Vec<Hash256>,
}

impl LegacyBranch {
    /// Constructs a new instance.
    pub fn new(index: u64, branch: Vec<Hash256>) -> Self {
        Self { index, branch }
    }

    /// Index of the proven leaf.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Hashes, leaf side first.
    pub fn branch(&self) -> &[Hash256] {
        &self.branch
    }

    /// Extends this branch with one proving our root into some larger tree,
    /// so the result proves the original leaf into that tree's root.
    pub fn append(&mut self, other: &LegacyBranch) -> Result<(), MerkleError> {
        let shift = self.branch.len();
        if shift + other.branch.len() > u64::BITS as usize {
            return Err(MerkleError::BranchTooLong);
        }

        if shift < u64::BITS as usize {
            self.index |= other.index << shift;
        }
        self.branch.extend_from_slice(&other.branch);
        Ok(())
    }

    /// Replays the branch from `hash`.
    ///
    /// Only a left sibling equal to the running digest is rejected.  Trees
    /// with an odd number of nodes at some level duplicate the last one, so a
    /// right sibling equal to the running digest is legitimate there.
    pub fn try_check<H: NodeHasher>(
        &self,
        hash: Hash256,
        hasher: &H,
    ) -> Result<Hash256, MerkleError> {
        if self.branch.len() > u64::BITS as usize {
            return Err(MerkleError::BranchTooLong);
        }

        let mut index = self.index;
        let mut cur = hash;
        for (i, sibling) in self.branch.iter().enumerate() {
            if index & 1 == 1 {
                if eq_ct(sibling, &cur) {
                    return Err(MerkleError::NonCanonicalProof(i));
                }
                cur = hasher.hash_two(sibling, &cur);
            } else {
                cur = hasher.hash_two(&cur, sibling);
            }
            index >>= 1;
        }

        Ok(cur)
    }

    /// Like [`LegacyBranch::try_check`], but any failure is the zero digest.
    pub fn safe_check<H: NodeHasher>(&self, hash: Hash256, hasher: &H) -> Hash256 {
        match self.try_check(hash, hasher) {
            Ok(h) => h,
            Err(e) => {
                warn!(%e, index = %self.index, "mmr: rejected legacy branch");
                ZERO_HASH
            }
        }
    }
}

impl Codec for LegacyBranch {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        let index = VarInt::decode(dec)?.inner();
        let branch = Vec::<Hash256>::decode(dec)?;
        Ok(Self { index, branch })
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        VarInt::new(self.index).encode(enc)?;
        self.branch.encode(enc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Sha256dHasher;
    use crate::tree::LegacyMerkleTree;

    fn leaves(n: u8) -> Vec<Hash256> {
        (0..n).map(|i| Sha256dHasher.hash_one(&[i])).collect()
    }

    #[test]
    fn test_check_against_tree() {
        let tree = LegacyMerkleTree::from_leaves(Sha256dHasher, leaves(6));
        for (i, leaf) in leaves(6).into_iter().enumerate() {
            let b = tree.branch(i).unwrap();
            assert_eq!(b.safe_check(leaf, &Sha256dHasher), tree.root());
        }
    }

    #[test]
    fn test_duplicated_tail_accepted() {
        // Leaf 4 of 5 pairs with a copy of itself.
        let tree = LegacyMerkleTree::from_leaves(Sha256dHasher, leaves(5));
        let b = tree.branch(4).unwrap();
        assert_eq!(b.branch()[0], leaves(5)[4]);
        assert_eq!(b.safe_check(leaves(5)[4], &Sha256dHasher), tree.root());
    }

    #[test]
    fn test_equal_left_sibling_rejected() {
        let leaf = [9; 32];
        let b = LegacyBranch::new(1, vec![leaf]);
        assert_eq!(
            b.try_check(leaf, &Sha256dHasher),
            Err(MerkleError::NonCanonicalProof(0))
        );
        assert_eq!(b.safe_check(leaf, &Sha256dHasher), ZERO_HASH);
    }

    #[test]
    fn test_append() {
        let inner = LegacyMerkleTree::from_leaves(Sha256dHasher, leaves(4));
        let outer_leaves = vec![[1; 32], [2; 32], inner.root(), [3; 32]];
        let outer = LegacyMerkleTree::from_leaves(Sha256dHasher, outer_leaves);

        let mut b = inner.branch(3).unwrap();
        b.append(&outer.branch(2).unwrap()).unwrap();
        assert_eq!(b.index(), 3 | (2 << 2));
        assert_eq!(b.safe_check(leaves(4)[3], &Sha256dHasher), outer.root());
    }

    #[test]
    fn test_append_too_long() {
        let mut b = LegacyBranch::new(0, vec![[1; 32]; 40]);
        let other = LegacyBranch::new(1, vec![[2; 32]; 30]);
        assert_eq!(b.append(&other), Err(MerkleError::BranchTooLong));
        assert_eq!(b.branch().len(), 40);
    }
}
