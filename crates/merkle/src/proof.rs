//! Chained proofs.
//!
//! A proof is a series of branches where each one proves the output of the
//! previous one into something bigger, like a transaction into a block and
//! then the block into a chain's mountain range.

use mmv_codec::{
    BufDecoder, Codec, CodecError, Decoder, Encoder, decode_buf_exact, encode_to_vec,
};
#[cfg(feature = "borsh")]
use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::*;

use crate::branch::{AccountProofVerifier, Branch};
use crate::error::MerkleError;
use crate::hasher::{Blake2bHasher, Hash256, NodeHasher, Sha256dHasher, ZERO_HASH, is_zero};

/// Hashers and collaborators used to check the branches of a proof.
#[derive(Clone, Debug)]
pub struct ProofVerifier<'a, H = Blake2bHasher> {
    mmr_hasher: H,
    legacy_hasher: Sha256dHasher,
    account: Option<&'a dyn AccountProofVerifier>,
}

impl<'a> ProofVerifier<'a> {
    /// Constructs the default configuration, BLAKE2b with the default
    /// personalization for mountain range branches and no account verifier.
    pub fn new() -> Self {
        Self::with_mmr_hasher(Blake2bHasher::default())
    }
}

impl<'a, H: NodeHasher> ProofVerifier<'a, H> {
    /// Constructs a configuration checking mountain range branches with some
    /// other hasher.
    pub fn with_mmr_hasher(mmr_hasher: H) -> Self {
        Self {
            mmr_hasher,
            legacy_hasher: Sha256dHasher,
            account: None,
        }
    }

    /// Sets the verifier account branches are delegated to.
    pub fn with_account_verifier(mut self, account: &'a dyn AccountProofVerifier) -> Self {
        self.account = Some(account);
        self
    }

    /// Hasher for mountain range branches.
    pub fn mmr_hasher(&self) -> &H {
        &self.mmr_hasher
    }

    /// Hasher for legacy branches.
    pub fn legacy_hasher(&self) -> &Sha256dHasher {
        &self.legacy_hasher
    }

    /// Verifier for account branches, if there is one.
    pub fn account_verifier(&self) -> Option<&'a dyn AccountProofVerifier> {
        self.account
    }
}

impl<H: NodeHasher + Default> Default for ProofVerifier<'_, H> {
    fn default() -> Self {
        Self::with_mmr_hasher(H::default())
    }
}

/// Ordered sequence of branches.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "borsh", derive(BorshSerialize, BorshDeserialize))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Proof {
    branches: Vec<Branch>,
}

impl Proof {
    /// Constructs a new empty proof.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a branch on the end.
    pub fn push(&mut self, branch: Branch) {
        self.branches.push(branch);
    }

    /// Returns the branches in order.
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// Consumes the proof, returning its branches.
    pub fn into_branches(self) -> Vec<Branch> {
        self.branches
    }

    /// Number of branches.
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// Returns if there are no branches.
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Returns if this is a single chunk of a larger proof.
    pub fn is_multi_part(&self) -> bool {
        matches!(self.branches(), [Branch::MultiPart(_)])
    }

    /// Checks the proof with the default configuration, see
    /// [`Proof::check_proof_with`].
    pub fn check_proof(&self, hash: Hash256) -> Hash256 {
        self.check_proof_with(hash, &ProofVerifier::new())
    }

    /// Feeds `hash` through every branch in turn and returns the final
    /// digest, which the caller compares against a root it trusts.  The zero
    /// digest comes out if any branch fails, and the branches after it are
    /// never run.
    pub fn check_proof_with<H: NodeHasher>(
        &self,
        hash: Hash256,
        verifier: &ProofVerifier<'_, H>,
    ) -> Hash256 {
        let res = self.branches.iter().enumerate().try_fold(hash, |cur, (i, branch)| {
            let next = branch.safe_check(cur, verifier);
            if is_zero(&next) { Err(i) } else { Ok(next) }
        });

        match res {
            Ok(h) => h,
            Err(i) => {
                debug!(branch = %i, total = %self.branches.len(), "mmr: proof chain failed");
                ZERO_HASH
            }
        }
    }

    /// Parses a proof, failing on any corruption or trailing bytes.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, MerkleError> {
        Ok(decode_buf_exact(buf)?)
    }

    /// Parses a proof off the front of `buf`.  A corrupt stream yields an
    /// empty proof along with the error, never a partial one.
    pub fn from_bytes_lenient(buf: &[u8]) -> (Self, Option<MerkleError>) {
        let mut dec = BufDecoder::new(buf);
        match Self::decode(&mut dec) {
            Ok(proof) => (proof, None),
            Err(e) => {
                warn!(
                    %e,
                    at = %dec.position(),
                    len = %buf.len(),
                    "mmr: discarding corrupt proof"
                );
                (Self::new(), Some(e.into()))
            }
        }
    }

    /// Serializes the proof.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MerkleError> {
        Ok(encode_to_vec(self)?)
    }
}

impl From<Vec<Branch>> for Proof {
    fn from(branches: Vec<Branch>) -> Self {
        Self { branches }
    }
}

impl From<Branch> for Proof {
    fn from(branch: Branch) -> Self {
        Self {
            branches: vec![branch],
        }
    }
}

impl Codec for Proof {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        Ok(Self {
            branches: Vec::<Branch>::decode(dec)?,
        })
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        self.branches.encode(enc)
    }
}
