//! Storage for a single height of a mountain range.

use crate::error::MerkleError;

/// Ordered, appendable, truncatable sequence of nodes at one height.
pub trait NodeLayer<N> {
    /// Number of nodes in the layer.
    fn len(&self) -> u64;

    /// Returns if the layer holds no nodes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets the node at some index.
    fn get(&self, index: u64) -> Result<N, MerkleError>;

    /// Appends a node.
    fn push(&mut self, node: N);

    /// Grows with default nodes or truncates to exactly `len` nodes.
    fn resize(&mut self, len: u64);

    /// Drops every node.
    fn clear(&mut self) {
        self.resize(0);
    }
}

/// Layer that owns its nodes in fixed size chunks of `1 << CHUNK_SHIFT`.
///
/// Chunks are never reallocated once full, growth only ever adds a new chunk.
#[derive(Clone, Debug)]
pub struct ChunkedLayer<N, const CHUNK_SHIFT: u32 = 9> {
    len: u64,
    chunks: Vec<Vec<N>>,
}

impl<N, const CHUNK_SHIFT: u32> ChunkedLayer<N, CHUNK_SHIFT> {
    const CHUNK_SIZE: u64 = 1 << CHUNK_SHIFT;
    const CHUNK_MASK: u64 = Self::CHUNK_SIZE - 1;

    /// Constructs a new empty layer.
    pub fn new() -> Self {
        Self {
            len: 0,
            chunks: Vec::new(),
        }
    }

    /// Number of nodes a chunk holds.
    pub fn chunk_size() -> u64 {
        Self::CHUNK_SIZE
    }

    /// Number of chunks currently allocated.
    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    fn new_chunk() -> Vec<N> {
        Vec::with_capacity(Self::CHUNK_SIZE as usize)
    }
}

impl<N, const CHUNK_SHIFT: u32> Default for ChunkedLayer<N, CHUNK_SHIFT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Clone + Default, const CHUNK_SHIFT: u32> NodeLayer<N> for ChunkedLayer<N, CHUNK_SHIFT> {
    fn len(&self) -> u64 {
        self.len
    }

    fn get(&self, index: u64) -> Result<N, MerkleError> {
        if index >= self.len {
            return Err(MerkleError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }

        let chunk = (index >> CHUNK_SHIFT) as usize;
        let off = (index & Self::CHUNK_MASK) as usize;
        Ok(self.chunks[chunk][off].clone())
    }

    fn push(&mut self, node: N) {
        if self.len & Self::CHUNK_MASK == 0 {
            self.chunks.push(Self::new_chunk());
        }

        // Invariant: the last chunk always has room after the check above.
        let last = self.chunks.len() - 1;
        self.chunks[last].push(node);
        self.len += 1;
    }

    fn resize(&mut self, len: u64) {
        if len <= self.len {
            let nchunks = len.div_ceil(Self::CHUNK_SIZE) as usize;
            self.chunks.truncate(nchunks);
            if let Some(tail) = self.chunks.last_mut() {
                let keep = len - (nchunks as u64 - 1) * Self::CHUNK_SIZE;
                tail.truncate(keep as usize);
            }
            self.len = len;
            return;
        }

        while self.len < len {
            self.push(N::default());
        }
    }
}

/// Source of leaf nodes that lives outside the range, such as a chain's block
/// index.  Must return the same node for an index as long as any view built
/// over it is alive.
pub trait LeafSource<N> {
    /// Gets the node for some index.
    fn leaf_node(&self, index: u64) -> N;
}

impl<N: Clone + Default> LeafSource<N> for [N] {
    fn leaf_node(&self, index: u64) -> N {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.get(i))
            .cloned()
            .unwrap_or_default()
    }
}

impl<N: Clone + Default> LeafSource<N> for Vec<N> {
    fn leaf_node(&self, index: u64) -> N {
        self.as_slice().leaf_node(index)
    }
}

impl<N, T: LeafSource<N> + ?Sized> LeafSource<N> for &T {
    fn leaf_node(&self, index: u64) -> N {
        (**self).leaf_node(index)
    }
}

/// Layer that reads its nodes from a [`LeafSource`] and only tracks how many
/// of them are in range.
#[derive(Clone, Debug)]
pub struct OverlayLayer<S> {
    source: S,
    len: u64,
}

impl<S> OverlayLayer<S> {
    /// Overlays an empty layer on a source.
    pub fn new(source: S) -> Self {
        Self { source, len: 0 }
    }

    /// Overlays the first `len` entries of a source.
    pub fn with_len(source: S, len: u64) -> Self {
        Self { source, len }
    }

    /// Returns the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<N, S: LeafSource<N>> NodeLayer<N> for OverlayLayer<S> {
    fn len(&self) -> u64 {
        self.len
    }

    fn get(&self, index: u64) -> Result<N, MerkleError> {
        if index >= self.len {
            return Err(MerkleError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }

        Ok(self.source.leaf_node(index))
    }

    fn push(&mut self, _node: N) {
        self.len += 1;
    }

    fn resize(&mut self, len: u64) {
        self.len = len;
    }
}
