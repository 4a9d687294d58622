//! Tagged proof branches.
//!
//! Every branch goes on the wire as its [`BranchType`] tag followed by the
//! fields of that variant, so a stream of them can be read back without any
//! other framing.

use mmv_codec::{Codec, CodecError, Decoder, Encoder};
#[cfg(feature = "borsh")]
use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::*;

use crate::hasher::{Hash256, NodeHasher, ZERO_HASH};
use crate::proof::ProofVerifier;

mod account;
mod legacy;
mod mmr;
mod multipart;

pub use account::{AccountBranch, AccountProofVerifier, RlpProof};
pub use legacy::LegacyBranch;
pub use mmr::MmrBranch;
pub use multipart::MultiPartBranch;

/// Wire tag of a branch.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(u8)]
pub enum BranchType {
    /// Never valid on the wire.
    Invalid = 0,

    /// Bitcoin style binary merkle branch.
    Legacy = 1,

    /// MMR branch over plain nodes.
    Mmr = 2,

    /// MMR branch over power nodes.
    PowerMmr = 3,

    /// External chain account and storage proof.
    Account = 4,

    /// Chunk of a serialized proof.
    MultiPart = 5,
}

impl TryFrom<u8> for BranchType {
    type Error = CodecError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Ok(match v {
            1 => Self::Legacy,
            2 => Self::Mmr,
            3 => Self::PowerMmr,
            4 => Self::Account,
            5 => Self::MultiPart,
            _ => return Err(CodecError::UnknownTag(v)),
        })
    }
}

/// One step of a [`crate::Proof`].
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "borsh", derive(BorshSerialize, BorshDeserialize))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Branch {
    /// Binary merkle branch, double SHA-256.
    Legacy(LegacyBranch),

    /// Mountain range branch over plain nodes.
    Mmr(MmrBranch),

    /// Mountain range branch over power nodes.
    PowerMmr(MmrBranch),

    /// External chain account proof.
    Account(AccountBranch),

    /// Piece of a larger serialized proof, never verifies by itself.
    MultiPart(MultiPartBranch),
}

impl Branch {
    /// Returns the wire tag.
    pub fn branch_type(&self) -> BranchType {
        match self {
            Self::Legacy(_) => BranchType::Legacy,
            Self::Mmr(_) => BranchType::Mmr,
            Self::PowerMmr(_) => BranchType::PowerMmr,
            Self::Account(_) => BranchType::Account,
            Self::MultiPart(_) => BranchType::MultiPart,
        }
    }

    /// Replays the branch from `hash`, returning the digest it proves `hash`
    /// into, or the zero digest if the branch doesn't check out.
    pub fn safe_check<H: NodeHasher>(
        &self,
        hash: Hash256,
        verifier: &ProofVerifier<'_, H>,
    ) -> Hash256 {
        match self {
            Self::Legacy(b) => b.safe_check(hash, verifier.legacy_hasher()),
            Self::Mmr(b) => b.safe_check(hash, verifier.mmr_hasher(), 0),
            Self::PowerMmr(b) => b.safe_check(hash, verifier.mmr_hasher(), 1),
            Self::Account(b) => match verifier.account_verifier() {
                Some(v) => v.verify_storage_proof(b, hash),
                None => {
                    warn!("mmr: no verifier configured for account branch");
                    ZERO_HASH
                }
            },
            Self::MultiPart(_) => ZERO_HASH,
        }
    }
}

impl Codec for Branch {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        let tag = BranchType::try_from(u8::decode(dec)?)?;
        Ok(match tag {
            BranchType::Legacy => Self::Legacy(LegacyBranch::decode(dec)?),
            BranchType::Mmr => Self::Mmr(MmrBranch::decode(dec)?),
            BranchType::PowerMmr => Self::PowerMmr(MmrBranch::decode(dec)?),
            BranchType::Account => Self::Account(AccountBranch::decode(dec)?),
            BranchType::MultiPart => Self::MultiPart(MultiPartBranch::decode(dec)?),
            BranchType::Invalid => return Err(CodecError::UnknownTag(tag as u8)),
        })
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        (self.branch_type() as u8).encode(enc)?;
        match self {
            Self::Legacy(b) => b.encode(enc),
            Self::Mmr(b) | Self::PowerMmr(b) => b.encode(enc),
            Self::Account(b) => b.encode(enc),
            Self::MultiPart(b) => b.encode(enc),
        }
    }
}
