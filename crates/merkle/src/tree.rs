//! Binary merkle tree builder for legacy branches.
//!
//! This is the Bitcoin construction: a level with an odd number of nodes
//! pairs its last node with itself.  It exists so callers can produce
//! [`LegacyBranch`]es for data that's committed to that way, such as the
//! transactions in a block.
use crate::branch::LegacyBranch;
use crate::hasher::{Hash256, NodeHasher, ZERO_HASH};

/// Binary merkle tree keeping every level, leaves first.
#[derive(Clone, Debug)]
pub struct LegacyMerkleTree<H> {
    hasher: H,

    /// `levels[0]` is the leaves, the last level is just the root.
    levels: Vec<Vec<Hash256>>,
}

impl<H: NodeHasher> LegacyMerkleTree<H> {
    /// Builds a tree from leaf hashes.  Any number of leaves is accepted, an
    /// empty tree has the zero root.
    pub fn from_leaves(hasher: H, leaves: impl Into<Vec<Hash256>>) -> Self {
        let mut levels = vec![leaves.into()];

        loop {
            let cur = &levels[levels.len() - 1];
            if cur.len() <= 1 {
                break;
            }

            let next = cur
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hasher.hash_two(left, right),
                    _ => hasher.hash_two(&pair[0], &pair[0]),
                })
                .collect();
            levels.push(next);
        }

        Self { hasher, levels }
    }

    /// Returns the number of leaves in the tree.
    pub fn num_leaves(&self) -> usize {
        self.levels[0].len()
    }

    /// Returns a slice of the leaves.
    pub fn leaves(&self) -> &[Hash256] {
        &self.levels[0]
    }

    /// Returns the tree root, zero if there are no leaves.
    pub fn root(&self) -> Hash256 {
        self.levels
            .last()
            .and_then(|l| l.first())
            .copied()
            .unwrap_or(ZERO_HASH)
    }

    /// Generates the branch for `index` if it exists.
    pub fn branch(&self, index: usize) -> Option<LegacyBranch> {
        if index >= self.num_leaves() {
            return None;
        }

        let mut path = Vec::with_capacity(self.levels.len() - 1);
        let mut i = index;
        for level in &self.levels[..self.levels.len() - 1] {
            // Missing right sibling means this node was paired with itself.
            let sibling = level.get(i ^ 1).unwrap_or(&level[i]);
            path.push(*sibling);
            i >>= 1;
        }

        Some(LegacyBranch::new(index as u64, path))
    }

    /// Checks a branch for `leaf` against this tree's root.
    pub fn verify(&self, branch: &LegacyBranch, leaf: Hash256) -> bool {
        let root = self.root();
        branch.safe_check(leaf, &self.hasher) == root && root != ZERO_HASH
    }
}
