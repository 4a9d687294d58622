//! Hashing collaborators: the 256-bit digest type and the per-algorithm
//! hashers nodes and branches combine through.

use std::fmt::Debug;
use std::marker::PhantomData;

use bitcoin::hashes::{Hash, HashEngine, sha256d};
use blake2::Blake2bMac;
use blake2::digest::Mac;
use blake2::digest::consts::U32;
use digest::Digest;

/// A 256-bit digest.
pub type Hash256 = [u8; 32];

/// The all-zero digest, which is what every failed check returns.
pub const ZERO_HASH: Hash256 = [0; 32];

/// Checks if two hashes are equal, attempting to do it in constant time.
pub fn eq_ct(a: &Hash256, b: &Hash256) -> bool {
    // LLVM is free to short-circuit this anyway, it's only best effort.
    let mut acc: u8 = 0;
    for i in 0..a.len() {
        acc |= a[i] ^ b[i];
    }

    acc == 0
}

/// Returns if a hash is the zero hash.
pub fn is_zero(h: &Hash256) -> bool {
    eq_ct(h, &ZERO_HASH)
}

/// Capability a node type needs from its hash algorithm.
///
/// One instance is shared by every node of a range, so all nodes in a range
/// are guaranteed to agree on the algorithm and its parameters.
pub trait NodeHasher: Clone + Debug {
    /// Hashes a single serialized record.
    fn hash_one(&self, buf: &[u8]) -> Hash256;

    /// Hashes two serialized records, left then right.
    fn hash_two(&self, left: &[u8], right: &[u8]) -> Hash256;
}

/// BLAKE2b-256 with a personalization string.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Blake2bHasher {
    personal: [u8; 16],
}

impl Blake2bHasher {
    /// Personalization used when none is configured.
    pub const DEFAULT_PERSONALIZATION: [u8; 16] = *b"VerusDefaultHash";

    /// Constructs a hasher with some other personalization, which is how
    /// separate chains keep their ranges from colliding.
    pub fn with_personalization(personal: [u8; 16]) -> Self {
        Self { personal }
    }

    /// Returns the configured personalization.
    pub fn personalization(&self) -> &[u8; 16] {
        &self.personal
    }

    fn context(&self) -> Blake2bMac<U32> {
        Blake2bMac::<U32>::new_with_salt_and_personal(&[], &[], &self.personal)
            .expect("blake2b: 16 byte personalization is always in bounds")
    }
}

impl Default for Blake2bHasher {
    fn default() -> Self {
        Self::with_personalization(Self::DEFAULT_PERSONALIZATION)
    }
}

impl NodeHasher for Blake2bHasher {
    fn hash_one(&self, buf: &[u8]) -> Hash256 {
        let mut ctx = self.context();
        Mac::update(&mut ctx, buf);
        ctx.finalize().into_bytes().into()
    }

    fn hash_two(&self, left: &[u8], right: &[u8]) -> Hash256 {
        let mut ctx = self.context();
        Mac::update(&mut ctx, left);
        Mac::update(&mut ctx, right);
        ctx.finalize().into_bytes().into()
    }
}

/// Hasher for an arbitrary [`Digest`] impl with a 32 byte output.  Inputs are
/// fed in directly, without any leaf/node prefixes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DigestHasher<D>(PhantomData<D>);

impl<D> DigestHasher<D> {
    /// Constructs a new instance.
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<D> Default for DigestHasher<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Digest + Clone + Debug> NodeHasher for DigestHasher<D> {
    fn hash_one(&self, buf: &[u8]) -> Hash256 {
        let result = D::digest(buf);
        result
            .as_slice()
            .try_into()
            .expect("digest output length mismatch")
    }

    fn hash_two(&self, left: &[u8], right: &[u8]) -> Hash256 {
        let mut context = D::new();
        context.update(left);
        context.update(right);

        let result = context.finalize();
        result
            .as_slice()
            .try_into()
            .expect("digest output length mismatch")
    }
}

/// Keccak-256, as used by Ethereum-side ranges.
pub type Keccak256Hasher = DigestHasher<sha3::Keccak256>;

/// Single SHA-256.
pub type Sha256Hasher = DigestHasher<sha2::Sha256>;

/// Bitcoin's double SHA-256, which legacy block merkle branches use.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Sha256dHasher;

impl NodeHasher for Sha256dHasher {
    fn hash_one(&self, buf: &[u8]) -> Hash256 {
        sha256d::Hash::hash(buf).to_byte_array()
    }

    fn hash_two(&self, left: &[u8], right: &[u8]) -> Hash256 {
        let mut engine = sha256d::Hash::engine();
        engine.input(left);
        engine.input(right);
        sha256d::Hash::from_engine(engine).to_byte_array()
    }
}
