//! Node types a mountain range can be built from.

use std::fmt::Debug;

#[cfg(feature = "borsh")]
use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::branch::{Branch, MmrBranch};
use crate::error::MerkleError;
use crate::hasher::{Hash256, NodeHasher, ZERO_HASH};

/// Behaviour a node needs to live in a mountain range and be proven.
pub trait MmrNode: Clone + Debug + Default + Eq {
    /// How many hashes beyond the sibling each proof step carries.  This is
    /// also the length of [`MmrNode::leaf_extra`].
    const EXTRA_HASHES: usize;

    /// The node's digest.
    fn hash(&self) -> &Hash256;

    /// Combines `self` as the left child with `right` into their parent.
    fn combine<H: NodeHasher>(&self, right: &Self, hasher: &H) -> Result<Self, MerkleError>;

    /// Proof material a leaf contributes before the first sibling.
    fn leaf_extra(&self) -> Vec<Hash256>;

    /// Hashes `self` contributes to a proof as the sibling of `proving`.
    fn proof_hashes_against(&self, proving: &Self) -> Result<Vec<Hash256>, MerkleError>;

    /// Wraps an MMR branch built over this node type in the matching tagged
    /// variant.
    fn wrap_branch(branch: MmrBranch) -> Branch;
}

/// Node carrying only a digest.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "borsh", derive(BorshSerialize, BorshDeserialize))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlainNode {
    hash: Hash256,
}

impl PlainNode {
    /// Wraps a digest.
    pub fn new(hash: Hash256) -> Self {
        Self { hash }
    }

    /// Hashes arbitrary leaf data into a node.
    pub fn from_data<H: NodeHasher>(hasher: &H, data: &[u8]) -> Self {
        Self::new(hasher.hash_one(data))
    }
}

impl MmrNode for PlainNode {
    const EXTRA_HASHES: usize = 0;

    fn hash(&self) -> &Hash256 {
        &self.hash
    }

    fn combine<H: NodeHasher>(&self, right: &Self, hasher: &H) -> Result<Self, MerkleError> {
        Ok(Self::new(hasher.hash_two(&self.hash, &right.hash)))
    }

    fn leaf_extra(&self) -> Vec<Hash256> {
        Vec::new()
    }

    fn proof_hashes_against(&self, _proving: &Self) -> Result<Vec<Hash256>, MerkleError> {
        Ok(vec![self.hash])
    }

    fn wrap_branch(branch: MmrBranch) -> Branch {
        Branch::Mmr(branch)
    }
}

/// Aggregate chain power, work in the low half and stake in the high half of
/// a 256 bit value.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "borsh", derive(BorshSerialize, BorshDeserialize))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodePower {
    work: u128,
    stake: u128,
}

impl NodePower {
    /// Constructs a new instance.
    pub fn new(work: u128, stake: u128) -> Self {
        Self { work, stake }
    }

    /// Accumulated work.
    pub fn work(&self) -> u128 {
        self.work
    }

    /// Accumulated stake.
    pub fn stake(&self) -> u128 {
        self.stake
    }

    /// Adds the halves separately, neither may carry into the other.
    pub fn checked_add(&self, other: &Self) -> Result<Self, MerkleError> {
        let work = self
            .work
            .checked_add(other.work)
            .ok_or(MerkleError::PowerOverflow)?;
        let stake = self
            .stake
            .checked_add(other.stake)
            .ok_or(MerkleError::PowerOverflow)?;
        Ok(Self { work, stake })
    }

    /// Little-endian 256 bit encoding, `stake << 128 | work`.
    pub fn to_bytes(&self) -> Hash256 {
        let mut buf = ZERO_HASH;
        buf[..16].copy_from_slice(&self.work.to_le_bytes());
        buf[16..].copy_from_slice(&self.stake.to_le_bytes());
        buf
    }

    /// Inverse of [`NodePower::to_bytes`].
    pub fn from_bytes(buf: &Hash256) -> Self {
        let mut work = [0; 16];
        let mut stake = [0; 16];
        work.copy_from_slice(&buf[..16]);
        stake.copy_from_slice(&buf[16..]);
        Self {
            work: u128::from_le_bytes(work),
            stake: u128::from_le_bytes(stake),
        }
    }
}

/// Node that also accumulates the power of everything under it, so a root
/// commits to the total work and stake of the range.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "borsh", derive(BorshSerialize, BorshDeserialize))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PowerNode {
    hash: Hash256,
    power: NodePower,
}

impl PowerNode {
    /// Wraps an already finished digest and its power.
    pub fn new(hash: Hash256, power: NodePower) -> Self {
        Self { hash, power }
    }

    /// Builds a leaf from the hash of the underlying element.  The power is
    /// folded into the leaf digest, which is what the leading extra hash of a
    /// power proof undoes.
    pub fn leaf<H: NodeHasher>(hasher: &H, pre_hash: &Hash256, power: NodePower) -> Self {
        let hash = hasher.hash_two(pre_hash, &power.to_bytes());
        Self { hash, power }
    }

    /// Power accumulated under this node.
    pub fn power(&self) -> &NodePower {
        &self.power
    }
}

impl MmrNode for PowerNode {
    const EXTRA_HASHES: usize = 1;

    fn hash(&self) -> &Hash256 {
        &self.hash
    }

    fn combine<H: NodeHasher>(&self, right: &Self, hasher: &H) -> Result<Self, MerkleError> {
        let power = self.power.checked_add(&right.power)?;
        let children = hasher.hash_two(&self.hash, &right.hash);
        let hash = hasher.hash_two(&children, &power.to_bytes());
        Ok(Self { hash, power })
    }

    fn leaf_extra(&self) -> Vec<Hash256> {
        vec![self.power.to_bytes()]
    }

    fn proof_hashes_against(&self, proving: &Self) -> Result<Vec<Hash256>, MerkleError> {
        let parent = self.power.checked_add(&proving.power)?;
        Ok(vec![self.hash, parent.to_bytes()])
    }

    fn wrap_branch(branch: MmrBranch) -> Branch {
        Branch::PowerMmr(branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Blake2bHasher;

    #[test]
    fn test_plain_combine_is_ordered() {
        let h = Blake2bHasher::default();
        let a = PlainNode::from_data(&h, b"a");
        let b = PlainNode::from_data(&h, b"b");

        let ab = a.combine(&b, &h).unwrap();
        let ba = b.combine(&a, &h).unwrap();
        assert_ne!(ab, ba);
        assert_eq!(*ab.hash(), h.hash_two(a.hash(), b.hash()));
        assert!(a.leaf_extra().is_empty());
        assert_eq!(a.proof_hashes_against(&b).unwrap(), vec![*a.hash()]);
    }

    #[test]
    fn test_power_bytes_layout() {
        let p = NodePower::new(1, 2);
        let buf = p.to_bytes();
        assert_eq!(buf[0], 1);
        assert_eq!(buf[16], 2);
        assert_eq!(NodePower::from_bytes(&buf), p);
    }

    #[test]
    fn test_power_combine() {
        let h = Blake2bHasher::default();
        let a = PowerNode::leaf(&h, &[1; 32], NodePower::new(10, 1));
        let b = PowerNode::leaf(&h, &[2; 32], NodePower::new(5, 3));

        let parent = a.combine(&b, &h).unwrap();
        assert_eq!(*parent.power(), NodePower::new(15, 4));

        let children = h.hash_two(a.hash(), b.hash());
        let expected = h.hash_two(&children, &NodePower::new(15, 4).to_bytes());
        assert_eq!(*parent.hash(), expected);

        let hashes = a.proof_hashes_against(&b).unwrap();
        assert_eq!(hashes, vec![*a.hash(), NodePower::new(15, 4).to_bytes()]);
    }

    #[test]
    fn test_power_leaf_extra_restores_leaf() {
        let h = Blake2bHasher::default();
        let pre = [9; 32];
        let leaf = PowerNode::leaf(&h, &pre, NodePower::new(7, 0));
        let extra = leaf.leaf_extra();
        assert_eq!(extra.len(), PowerNode::EXTRA_HASHES);
        assert_eq!(h.hash_two(&pre, &extra[0]), *leaf.hash());
    }

    #[test]
    fn test_power_overflow() {
        let h = Blake2bHasher::default();
        let a = PowerNode::new([1; 32], NodePower::new(u128::MAX, 0));
        let b = PowerNode::new([2; 32], NodePower::new(1, 0));
        assert_eq!(a.combine(&b, &h), Err(MerkleError::PowerOverflow));

        // Stake overflowing doesn't spill into work or vice versa.
        let a = PowerNode::new([1; 32], NodePower::new(0, u128::MAX));
        let b = PowerNode::new([2; 32], NodePower::new(0, 1));
        assert_eq!(
            a.proof_hashes_against(&b),
            Err(MerkleError::PowerOverflow)
        );
    }
}
