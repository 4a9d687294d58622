//! Historical views of a mountain range.
//!
//! A view fixes a size and derives everything from the nodes of the range
//! that existed at that size, so later appends never change what it reports.
//! The peaks of a view are reduced into a single root by pairing them up
//! highest first, with an unpaired peak passing through untouched to the next
//! round:
//!
//! ```txt
//!            root
//!           /    \
//!         p0p1    \
//!        /    \    \
//!      p0     p1    p2
//! ```

use std::cell::OnceCell;

use tracing::*;

use crate::branch::{Branch, MmrBranch};
use crate::error::MerkleError;
use crate::hasher::{Hash256, NodeHasher, ZERO_HASH};
use crate::layer::{ChunkedLayer, NodeLayer};
use crate::node::MmrNode;
use crate::range::MountainRange;

/// Read-only projection of a [`MountainRange`] at some size.
#[derive(Debug)]
pub struct MountainView<'r, N, H, L = ChunkedLayer<N>> {
    range: &'r MountainRange<N, H, L>,

    /// Node count per height, `sizes[0]` is the view size.
    sizes: Vec<u64>,

    /// Peak nodes, highest first.
    peaks: OnceCell<Vec<N>>,

    /// Every round of the peak reduction after the peaks themselves, the last
    /// one holding just the root.
    peak_layers: OnceCell<Result<Vec<Vec<N>>, MerkleError>>,
}

impl<'r, N: MmrNode, H: NodeHasher, L: NodeLayer<N>> MountainView<'r, N, H, L> {
    /// Constructs a view of `range` at `size`, clamped to the range's size.
    pub fn new(range: &'r MountainRange<N, H, L>, size: u64) -> Self {
        let size = size.min(range.size());
        Self {
            range,
            sizes: layer_sizes(size),
            peaks: OnceCell::new(),
            peak_layers: OnceCell::new(),
        }
    }

    /// Number of leaves the view covers.
    pub fn size(&self) -> u64 {
        self.sizes.first().copied().unwrap_or(0)
    }

    /// Returns if the view covers no leaves.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Node count at each height of the view.
    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    /// Re-targets the view at another size, dropping anything cached.
    pub fn resize(&mut self, size: u64) {
        let size = size.min(self.range.size());
        debug!(old_size = %self.size(), new_size = %size, "mmr: resized view");
        self.sizes = layer_sizes(size);
        self.peaks = OnceCell::new();
        self.peak_layers = OnceCell::new();
    }

    /// Peak nodes, highest first.
    pub fn peaks(&self) -> &[N] {
        self.peaks.get_or_init(|| self.calc_peaks())
    }

    fn calc_peaks(&self) -> Vec<N> {
        let mut peaks = Vec::new();
        for (height, &len) in self.sizes.iter().enumerate().rev() {
            if is_peak_height(&self.sizes, height) {
                peaks.push(self.range.node(height, len - 1));
            }
        }
        peaks
    }

    fn peak_layers(&self) -> Result<&[Vec<N>], MerkleError> {
        self.peak_layers
            .get_or_init(|| self.calc_peak_layers())
            .as_ref()
            .map(Vec::as_slice)
            .map_err(Clone::clone)
    }

    fn calc_peak_layers(&self) -> Result<Vec<Vec<N>>, MerkleError> {
        let hasher = self.range.hasher();
        let mut layers: Vec<Vec<N>> = Vec::new();
        let mut cur = self.peaks();

        while cur.len() > 1 {
            let mut next = Vec::with_capacity(cur.len().div_ceil(2));
            for pair in cur.chunks(2) {
                match pair {
                    [left, right] => next.push(left.combine(right, hasher)?),
                    _ => next.push(pair[0].clone()),
                }
            }
            layers.push(next);
            cur = layers.last().map(Vec::as_slice).unwrap_or_default();
        }

        Ok(layers)
    }

    /// Root node of the view, the default node if the view is empty.
    pub fn root_node(&self) -> Result<N, MerkleError> {
        let layers = self.peak_layers()?;
        let top = match layers.last() {
            Some(top) => top.first(),
            None => self.peaks().first(),
        };
        Ok(top.cloned().unwrap_or_default())
    }

    /// Root digest of the view, all zero if the view is empty.
    pub fn root(&self) -> Result<Hash256, MerkleError> {
        if self.is_empty() {
            return Ok(ZERO_HASH);
        }
        Ok(*self.root_node()?.hash())
    }

    /// Digest of a leaf inside the view.
    pub fn leaf_hash(&self, index: u64) -> Result<Hash256, MerkleError> {
        if index >= self.size() {
            return Err(MerkleError::IndexOutOfRange {
                index,
                len: self.size(),
            });
        }
        Ok(*self.range.leaf(index)?.hash())
    }

    /// Builds the inclusion proof of a leaf against [`MountainView::root`].
    pub fn get_proof(&self, pos: u64) -> Result<Branch, MerkleError> {
        let size = self.size();
        if pos >= size {
            return Err(MerkleError::IndexOutOfRange { index: pos, len: size });
        }

        let mut hashes = self.range.leaf(pos)?.leaf_extra();

        // Climb the mountain the leaf is in until we reach its peak.
        let mut index = pos;
        let mut peak_height = 0;
        for (height, &len) in self.sizes.iter().enumerate() {
            let node = self.range.node(height, index);
            if index & 1 == 1 {
                let sibling = self.range.node(height, index - 1);
                hashes.extend(sibling.proof_hashes_against(&node)?);
            } else if index + 1 < len {
                let sibling = self.range.node(height, index + 1);
                hashes.extend(sibling.proof_hashes_against(&node)?);
            } else {
                peak_height = height;
                break;
            }
            index >>= 1;
        }

        // Then across the peak reduction up to the root.
        let mut index = peak_index(&self.sizes, peak_height);
        let mut level = self.peaks();
        for next in self.peak_layers()? {
            if index & 1 == 1 {
                hashes.extend(level[index - 1].proof_hashes_against(&level[index])?);
            } else if index + 1 < level.len() {
                hashes.extend(level[index + 1].proof_hashes_against(&level[index])?);
            }
            index >>= 1;
            level = next.as_slice();
        }

        trace!(%pos, %size, hashes = hashes.len(), "mmr: built proof");
        Ok(N::wrap_branch(MmrBranch::new(pos, size, hashes)))
    }

    /// Shape of the proof for `pos` in a view of `view_size`, see
    /// [`proof_bits`].
    pub fn proof_bits(pos: u64, view_size: u64) -> Vec<bool> {
        proof_bits(pos, view_size, N::EXTRA_HASHES)
    }
}

/// Node count per height for a view of some size.
fn layer_sizes(size: u64) -> Vec<u64> {
    let mut sizes = Vec::new();
    let mut s = size;
    while s > 0 {
        sizes.push(s);
        s >>= 1;
    }
    sizes
}

/// A height holds a peak if it's the top one or its last node is unpaired.
fn is_peak_height(sizes: &[u64], height: usize) -> bool {
    match sizes.get(height + 1) {
        None => true,
        Some(&above) => above < sizes[height].div_ceil(2),
    }
}

/// Position of the peak at `height` in the highest-first peak list.
fn peak_index(sizes: &[u64], height: usize) -> usize {
    (height + 1..sizes.len())
        .filter(|&h| is_peak_height(sizes, h))
        .count()
}

/// Returns the shape of the proof for leaf `pos` in a view of `view_size`
/// without needing a range: one entry per hash in the branch, `true` where
/// that hash goes on the left of the running digest.
///
/// Nodes carrying `extra_hashes` extra values per step get that many leading
/// `false` entries for the leaf, and that many more after every sibling.
/// Returns an empty shape if `pos` isn't inside the view.
pub fn proof_bits(pos: u64, view_size: u64, extra_hashes: usize) -> Vec<bool> {
    let mut bits = Vec::new();
    if pos >= view_size {
        return bits;
    }

    let sizes = layer_sizes(view_size);
    let push_step = |bits: &mut Vec<bool>, left: bool| {
        bits.push(left);
        bits.extend(std::iter::repeat_n(false, extra_hashes));
    };

    bits.extend(std::iter::repeat_n(false, extra_hashes));

    let mut index = pos;
    let mut peak_height = 0;
    for (height, &len) in sizes.iter().enumerate() {
        if index & 1 == 1 {
            push_step(&mut bits, true);
        } else if index + 1 < len {
            push_step(&mut bits, false);
        } else {
            peak_height = height;
            break;
        }
        index >>= 1;
    }

    let npeaks = (0..sizes.len())
        .filter(|&h| is_peak_height(&sizes, h))
        .count();
    let mut index = peak_index(&sizes, peak_height);
    let mut width = npeaks;
    while width > 1 {
        if index & 1 == 1 {
            push_step(&mut bits, true);
        } else if index + 1 < width {
            push_step(&mut bits, false);
        }
        index >>= 1;
        width = width.div_ceil(2);
    }

    bits
}

/// Packs [`proof_bits`] into an integer, bit `i` set if entry `i` is `true`.
/// Returns `None` if the shape doesn't fit in 64 bits.
pub fn mmr_proof_index(pos: u64, view_size: u64, extra_hashes: usize) -> Option<u64> {
    let bits = proof_bits(pos, view_size, extra_hashes);
    if bits.len() > u64::BITS as usize {
        return None;
    }

    Some(
        bits.iter()
            .enumerate()
            .fold(0, |acc, (i, &b)| acc | (u64::from(b) << i)),
    )
}
