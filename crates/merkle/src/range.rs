//! Append-only, truncatable Merkle mountain range.

use std::marker::PhantomData;

use tracing::*;

use crate::error::MerkleError;
use crate::hasher::NodeHasher;
use crate::layer::{ChunkedLayer, NodeLayer};
use crate::node::MmrNode;
use crate::view::MountainView;

/// Merkle mountain range over some node type.
///
/// Leaves live in `L`, which is a [`ChunkedLayer`] unless the range is built
/// over an external source, every parent layer is chunked.  A parent is added
/// to height `h` whenever an odd-indexed node lands at height `h - 1`, so the
/// layer lengths always follow the binary representation of the leaf count.
#[derive(Clone, Debug)]
pub struct MountainRange<N, H, L = ChunkedLayer<N>> {
    hasher: H,
    leaves: L,
    upper: Vec<ChunkedLayer<N>>,
    _pd: PhantomData<N>,
}

impl<N: MmrNode, H> MountainRange<N, H> {
    /// Constructs a new empty range.
    pub fn new(hasher: H) -> Self {
        Self::from_parts(hasher, ChunkedLayer::new())
    }
}

impl<N, H, L> MountainRange<N, H, L> {
    fn from_parts(hasher: H, leaves: L) -> Self {
        Self {
            hasher,
            leaves,
            upper: Vec::new(),
            _pd: PhantomData,
        }
    }

    /// Returns the hasher every node in the range is combined with.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Returns the leaf layer.
    pub fn leaf_layer(&self) -> &L {
        &self.leaves
    }
}

impl<N: MmrNode, H: NodeHasher, L: NodeLayer<N>> MountainRange<N, H, L> {
    /// Builds a range over an existing leaf layer, computing every parent the
    /// layer's current contents imply.
    pub fn with_leaf_layer(hasher: H, leaves: L) -> Result<Self, MerkleError> {
        let mut range = Self::from_parts(hasher, leaves);
        range.rebuild_upper()?;
        Ok(range)
    }

    fn rebuild_upper(&mut self) -> Result<(), MerkleError> {
        self.upper.clear();

        let mut below: Vec<N> = Vec::new();
        let n = self.leaves.len();
        for i in 1..n {
            if i & 1 == 1 {
                let parent = self
                    .leaves
                    .get(i - 1)?
                    .combine(&self.leaves.get(i)?, &self.hasher)?;
                below.push(parent);
            }
        }

        while !below.is_empty() {
            let mut layer = ChunkedLayer::new();
            let mut next = Vec::with_capacity(below.len() / 2);
            for (i, node) in below.iter().enumerate() {
                if i & 1 == 1 {
                    next.push(below[i - 1].combine(node, &self.hasher)?);
                }
                layer.push(node.clone());
            }
            self.upper.push(layer);
            below = next;
        }

        Ok(())
    }

    /// Number of leaves.
    pub fn size(&self) -> u64 {
        self.leaves.len()
    }

    /// Returns if there are no leaves.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Number of layers, 0 when empty.
    pub fn height(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.upper.len() + 1
        }
    }

    /// Appends a leaf and every parent it completes, returning its index.
    ///
    /// If a parent can't be combined the range is restored to its prior size.
    pub fn add(&mut self, leaf: N) -> Result<u64, MerkleError> {
        let index = self.size();
        self.leaves.push(leaf);

        if let Err(e) = self.add_parents(index) {
            self.truncate(index);
            return Err(e);
        }

        trace!(%index, height = self.height(), "mmr: added leaf");
        Ok(index)
    }

    /// Appends a default leaf.
    pub fn add_default(&mut self) -> Result<u64, MerkleError> {
        self.add(N::default())
    }

    fn add_parents(&mut self, leaf_index: u64) -> Result<(), MerkleError> {
        let mut index = leaf_index;
        let mut node = self.leaves.get(index)?;
        let mut height = 0;

        while index & 1 == 1 {
            let left = self.layer_node(height, index - 1)?;
            let parent = left.combine(&node, &self.hasher)?;

            if self.upper.len() == height {
                self.upper.push(ChunkedLayer::new());
            }
            self.upper[height].push(parent.clone());

            node = parent;
            index >>= 1;
            height += 1;
        }

        Ok(())
    }

    fn layer_node(&self, height: usize, index: u64) -> Result<N, MerkleError> {
        if height == 0 {
            self.leaves.get(index)
        } else {
            match self.upper.get(height - 1) {
                Some(layer) => layer.get(index),
                None => Err(MerkleError::IndexOutOfRange { index, len: 0 }),
            }
        }
    }

    /// Gets a leaf.
    pub fn leaf(&self, index: u64) -> Result<N, MerkleError> {
        self.leaves.get(index)
    }

    /// Gets the node at some height and index, or a default node if there
    /// isn't one there.
    pub fn node(&self, height: usize, index: u64) -> N {
        self.layer_node(height, index).unwrap_or_default()
    }

    /// Drops every leaf from `new_size` on, along with every parent that
    /// covered them.  Does nothing if the range is already that small.
    pub fn truncate(&mut self, new_size: u64) {
        let old_size = self.size();
        if new_size >= old_size {
            return;
        }

        self.leaves.resize(new_size);

        let mut len = new_size >> 1;
        let mut keep = 0;
        for layer in &mut self.upper {
            if len == 0 {
                break;
            }
            layer.resize(len);
            len >>= 1;
            keep += 1;
        }
        self.upper.truncate(keep);

        debug!(%old_size, %new_size, "mmr: truncated range");
    }

    /// Returns a view of the whole range as it stands.
    pub fn view(&self) -> MountainView<'_, N, H, L> {
        MountainView::new(self, self.size())
    }

    /// Returns a view of the range as it stood at some earlier size.  Sizes
    /// past the current size are clamped.
    pub fn view_at(&self, size: u64) -> MountainView<'_, N, H, L> {
        MountainView::new(self, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::{Blake2bHasher, Hash256};
    use crate::layer::OverlayLayer;
    use crate::node::{NodePower, PlainNode, PowerNode};

    type Range = MountainRange<PlainNode, Blake2bHasher>;

    fn make_leaves(n: u64) -> Vec<PlainNode> {
        let h = Blake2bHasher::default();
        (0..n)
            .map(|i| PlainNode::from_data(&h, &i.to_le_bytes()))
            .collect()
    }

    fn make_range(n: u64) -> Range {
        let mut range = Range::new(Blake2bHasher::default());
        for leaf in make_leaves(n) {
            range.add(leaf).unwrap();
        }
        range
    }

    fn bit_length(n: u64) -> usize {
        (u64::BITS - n.leading_zeros()) as usize
    }

    #[test]
    fn test_size_and_height() {
        let mut range = Range::new(Blake2bHasher::default());
        assert_eq!(range.height(), 0);
        assert!(range.is_empty());

        for (i, leaf) in make_leaves(40).into_iter().enumerate() {
            assert_eq!(range.add(leaf).unwrap(), i as u64);
            assert_eq!(range.size(), i as u64 + 1);
            assert_eq!(range.height(), bit_length(i as u64 + 1));
        }
    }

    #[test]
    fn test_parents() {
        let h = Blake2bHasher::default();
        let leaves = make_leaves(4);
        let range = make_range(4);

        let n01 = leaves[0].combine(&leaves[1], &h).unwrap();
        let n23 = leaves[2].combine(&leaves[3], &h).unwrap();
        let top = n01.combine(&n23, &h).unwrap();

        assert_eq!(range.node(1, 0), n01);
        assert_eq!(range.node(1, 1), n23);
        assert_eq!(range.node(2, 0), top);
    }

    #[test]
    fn test_node_out_of_range_is_default() {
        let range = make_range(5);
        assert_eq!(range.node(0, 5), PlainNode::default());
        assert_eq!(range.node(1, 2), PlainNode::default());
        assert_eq!(range.node(9, 0), PlainNode::default());
    }

    #[test]
    fn test_leaf_out_of_range() {
        let range = make_range(3);
        assert_eq!(
            range.leaf(3),
            Err(MerkleError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(range.leaf(2).unwrap(), make_leaves(3)[2]);
    }

    #[test]
    fn test_truncate() {
        let mut range = make_range(10);
        range.truncate(12);
        assert_eq!(range.size(), 10);

        range.truncate(5);
        assert_eq!(range.size(), 5);
        assert_eq!(range.height(), 3);

        let fresh = make_range(5);
        for h in 0..3 {
            for i in 0..5 {
                assert_eq!(range.node(h, i), fresh.node(h, i), "node ({h}, {i})");
            }
        }

        range.truncate(0);
        assert!(range.is_empty());
        assert_eq!(range.height(), 0);
    }

    #[test]
    fn test_truncate_then_regrow() {
        let mut range = make_range(10);
        range.truncate(3);
        for leaf in make_leaves(10).into_iter().skip(3) {
            range.add(leaf).unwrap();
        }

        let fresh = make_range(10);
        assert_eq!(range.height(), fresh.height());
        for h in 0..range.height() {
            for i in 0..10 {
                assert_eq!(range.node(h, i), fresh.node(h, i));
            }
        }
    }

    #[test]
    fn test_add_default() {
        let mut range = Range::new(Blake2bHasher::default());
        assert_eq!(range.add_default().unwrap(), 0);
        assert_eq!(range.leaf(0).unwrap(), PlainNode::default());
    }

    #[test]
    fn test_power_overflow_rolls_back() {
        let h = Blake2bHasher::default();
        let mut range = MountainRange::<PowerNode, _>::new(h);
        range
            .add(PowerNode::leaf(&h, &[1; 32], NodePower::new(u128::MAX, 0)))
            .unwrap();

        let res = range.add(PowerNode::leaf(&h, &[2; 32], NodePower::new(1, 0)));
        assert_eq!(res, Err(MerkleError::PowerOverflow));
        assert_eq!(range.size(), 1);
        assert_eq!(range.height(), 1);
    }

    #[test]
    fn test_overlay_matches_chunked() {
        let leaves = make_leaves(13);
        let chunked = make_range(13);

        let overlay = OverlayLayer::with_len(&leaves, 13);
        let range =
            MountainRange::<PlainNode, _, _>::with_leaf_layer(Blake2bHasher::default(), overlay)
                .unwrap();
        assert_eq!(range.size(), 13);
        assert_eq!(range.height(), chunked.height());
        assert_eq!(range.view().root(), chunked.view().root());

        // Growing through the overlay reads leaves back out of the source.
        let mut grown = MountainRange::<PlainNode, _, _>::with_leaf_layer(
            Blake2bHasher::default(),
            OverlayLayer::new(&leaves),
        )
        .unwrap();
        for _ in 0..13 {
            grown.add_default().unwrap();
        }
        assert_eq!(grown.view().root(), chunked.view().root());
    }

    #[test]
    fn test_hasher_is_shared() {
        let personal = *b"AnotherChainName";
        let h = Blake2bHasher::with_personalization(personal);
        let mut range = MountainRange::<PlainNode, _>::new(h);
        let a: Hash256 = [1; 32];
        let b: Hash256 = [2; 32];
        range.add(PlainNode::new(a)).unwrap();
        range.add(PlainNode::new(b)).unwrap();
        assert_eq!(*range.node(1, 0).hash(), h.hash_two(&a, &b));
    }
}
