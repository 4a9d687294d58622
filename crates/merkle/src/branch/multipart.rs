use mmv_codec::{Codec, CodecError, Decoder, Encoder, decode_buf_exact, encode_to_vec};
#[cfg(feature = "borsh")]
use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::branch::Branch;
use crate::error::MerkleError;
use crate::proof::Proof;

/// Raw bytes of a serialized proof, or a chunk of them.
///
/// Proofs too large to ship in one piece are broken into a series of proofs
/// that each hold a single one of these, then glued back together on the
/// other end before verifying.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "borsh", derive(BorshSerialize, BorshDeserialize))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MultiPartBranch {
    data: Vec<u8>,
}

impl MultiPartBranch {
    /// Constructs a new instance.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Returns the carried bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Serializes a whole proof into one branch.
    pub fn from_proof(proof: &Proof) -> Result<Self, MerkleError> {
        Ok(Self::new(encode_to_vec(proof)?))
    }

    /// Parses the carried bytes back into a proof.
    pub fn to_proof(&self) -> Result<Proof, MerkleError> {
        Ok(decode_buf_exact(&self.data)?)
    }

    /// Adds another chunk's bytes on the end.
    pub fn append(&mut self, other: &MultiPartBranch) {
        self.data.extend_from_slice(&other.data);
    }

    /// Splits the bytes into proofs holding at most `max_size` bytes each.
    pub fn break_to_chunks(&self, max_size: usize) -> Result<Vec<Proof>, MerkleError> {
        if max_size == 0 {
            return Err(MerkleError::InvalidChunkSize);
        }

        Ok(self
            .data
            .chunks(max_size)
            .map(|c| Proof::from(vec![Branch::MultiPart(Self::new(c.to_vec()))]))
            .collect())
    }

    /// Joins chunks made by [`MultiPartBranch::break_to_chunks`] in order.
    pub fn from_chunks(chunks: &[Proof]) -> Result<Self, MerkleError> {
        let mut joined = Self::default();
        for chunk in chunks {
            match chunk.branches() {
                [Branch::MultiPart(part)] => joined.append(part),
                _ => return Err(MerkleError::NotMultiPart),
            }
        }
        Ok(joined)
    }
}

impl Codec for MultiPartBranch {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        Ok(Self::new(Vec::<u8>::decode(dec)?))
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        self.data.encode(enc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::{LegacyBranch, MmrBranch};

    fn make_proof() -> Proof {
        Proof::from(vec![
            Branch::Mmr(MmrBranch::new(3, 9, vec![[1; 32], [2; 32], [3; 32]])),
            Branch::Legacy(LegacyBranch::new(5, vec![[4; 32]; 4])),
        ])
    }

    #[test]
    fn test_chunk_and_reassemble() {
        let proof = make_proof();
        let whole = MultiPartBranch::from_proof(&proof).unwrap();

        let chunks = whole.break_to_chunks(50).unwrap();
        assert_eq!(chunks.len(), whole.data().len().div_ceil(50));
        assert!(chunks.iter().all(Proof::is_multi_part));

        let joined = MultiPartBranch::from_chunks(&chunks).unwrap();
        assert_eq!(joined, whole);
        assert_eq!(joined.to_proof().unwrap(), proof);
    }

    #[test]
    fn test_zero_chunk_size() {
        let whole = MultiPartBranch::from_proof(&make_proof()).unwrap();
        assert_eq!(whole.break_to_chunks(0), Err(MerkleError::InvalidChunkSize));
    }

    #[test]
    fn test_non_chunk_rejected() {
        let whole = MultiPartBranch::from_proof(&make_proof()).unwrap();
        let mut chunks = whole.break_to_chunks(64).unwrap();
        chunks.push(make_proof());
        assert_eq!(
            MultiPartBranch::from_chunks(&chunks),
            Err(MerkleError::NotMultiPart)
        );
    }

    #[test]
    fn test_missing_chunk_is_corrupt() {
        let whole = MultiPartBranch::from_proof(&make_proof()).unwrap();
        let chunks = whole.break_to_chunks(40).unwrap();
        let joined = MultiPartBranch::from_chunks(&chunks[..chunks.len() - 1]).unwrap();
        assert!(matches!(
            joined.to_proof(),
            Err(MerkleError::CorruptProofStream(_))
        ));
    }
}
