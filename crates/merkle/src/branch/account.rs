use std::fmt::Debug;

use mmv_codec::{Codec, CodecError, Decoder, Encoder, MAX_CONTAINER_LEN, VarInt};
#[cfg(feature = "borsh")]
use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::hasher::Hash256;

/// Verifies external chain account branches.  The trie walk is specific to
/// the chain, so it's supplied by the caller.
pub trait AccountProofVerifier: Debug {
    /// Checks `branch` for the storage value `hash`, returning the state root
    /// it proves into or the zero digest.
    fn verify_storage_proof(&self, branch: &AccountBranch, hash: Hash256) -> Hash256;
}

/// Sequence of RLP encoded trie nodes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "borsh", derive(BorshSerialize, BorshDeserialize))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RlpProof {
    nodes: Vec<Vec<u8>>,
}

impl RlpProof {
    /// Constructs a new instance.
    pub fn new(nodes: Vec<Vec<u8>>) -> Self {
        Self { nodes }
    }

    /// Encoded trie nodes, root first.
    pub fn nodes(&self) -> &[Vec<u8>] {
        &self.nodes
    }
}

/// Bounds the node count the same way on both sides of the codec, so anything
/// we write can be read back.
fn check_node_count(len: u64) -> Result<(), CodecError> {
    if len > MAX_CONTAINER_LEN {
        return Err(CodecError::OverflowContainer(len));
    }
    Ok(())
}

// The node count is a varint here rather than a compact size.
impl Codec for RlpProof {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        let len = VarInt::decode(dec)?.inner();
        check_node_count(len)?;

        let mut nodes = Vec::new();
        for _ in 0..len {
            nodes.push(Vec::<u8>::decode(dec)?);
        }

        Ok(Self { nodes })
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        let len = self.nodes.len() as u64;
        check_node_count(len)?;

        VarInt::new(len).encode(enc)?;
        for node in &self.nodes {
            node.encode(enc)?;
        }
        Ok(())
    }
}

/// Account and storage slot proof against an external chain's state root.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "borsh", derive(BorshSerialize, BorshDeserialize))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccountBranch {
    /// Trie nodes from the state root down to the account.
    pub account_proof: RlpProof,

    /// Account address.
    pub address: [u8; 20],

    /// Balance as a little-endian 256 bit integer.
    pub balance: Hash256,

    /// Hash of the account's contract code.
    pub code_hash: Hash256,

    /// Account transaction count.
    pub nonce: u64,

    /// Root of the account's storage trie.
    pub storage_hash: Hash256,

    /// Storage slot being proven.
    pub storage_proof_key: Hash256,

    /// Trie nodes from the storage root down to the slot.
    pub storage_proof: RlpProof,
}

impl AccountBranch {
    /// Balance as minimal big-endian bytes, empty for zero.
    pub fn balance_be_bytes(&self) -> Vec<u8> {
        self.balance
            .iter()
            .rev()
            .skip_while(|&&b| b == 0)
            .copied()
            .collect()
    }
}

impl Codec for AccountBranch {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        Ok(Self {
            account_proof: RlpProof::decode(dec)?,
            address: <[u8; 20]>::decode(dec)?,
            balance: Hash256::decode(dec)?,
            code_hash: Hash256::decode(dec)?,
            nonce: VarInt::decode(dec)?.inner(),
            storage_hash: Hash256::decode(dec)?,
            storage_proof_key: Hash256::decode(dec)?,
            storage_proof: RlpProof::decode(dec)?,
        })
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        self.account_proof.encode(enc)?;
        self.address.encode(enc)?;
        self.balance.encode(enc)?;
        self.code_hash.encode(enc)?;
        VarInt::new(self.nonce).encode(enc)?;
        self.storage_hash.encode(enc)?;
        self.storage_proof_key.encode(enc)?;
        self.storage_proof.encode(enc)
    }
}

#[cfg(test)]
mod tests {
    use mmv_codec::{decode_buf_exact, encode_to_vec};

    use super::*;
    use crate::hasher::{Keccak256Hasher, NodeHasher, ZERO_HASH};
    use crate::{Branch, ProofVerifier};

    /// Stands in for a trie walk: accepts when the storage proof's only node
    /// is the value, and proves it into the storage hash.
    #[derive(Debug)]
    struct FakeVerifier;

    impl AccountProofVerifier for FakeVerifier {
        fn verify_storage_proof(&self, branch: &AccountBranch, hash: Hash256) -> Hash256 {
            match branch.storage_proof.nodes() {
                [node] if node[..] == hash[..] => branch.storage_hash,
                _ => ZERO_HASH,
            }
        }
    }

    fn make_branch() -> AccountBranch {
        let value = Keccak256Hasher::new().hash_one(b"slot value");
        AccountBranch {
            account_proof: RlpProof::new(vec![vec![0xc0], vec![0xc1, 0x80]]),
            address: [0x11; 20],
            balance: {
                let mut b = [0; 32];
                b[0] = 0x34;
                b[1] = 0x12;
                b
            },
            code_hash: [2; 32],
            nonce: 1000,
            storage_hash: [3; 32],
            storage_proof_key: [4; 32],
            storage_proof: RlpProof::new(vec![value.to_vec()]),
        }
    }

    #[test]
    fn test_balance_be_bytes() {
        assert_eq!(make_branch().balance_be_bytes(), vec![0x12, 0x34]);
        assert!(AccountBranch::default().balance_be_bytes().is_empty());
    }

    #[test]
    fn test_codec_field_order() {
        let b = make_branch();
        let buf = encode_to_vec(&b).unwrap();

        // Account proof: varint count, then each node length prefixed.
        assert_eq!(buf[..6], [2, 1, 0xc0, 2, 0xc1, 0x80]);
        assert_eq!(buf[6..26], [0x11; 20]);
        assert_eq!(decode_buf_exact::<AccountBranch>(&buf).unwrap(), b);
    }

    #[test]
    fn test_node_count_bounded() {
        assert_eq!(check_node_count(MAX_CONTAINER_LEN), Ok(()));
        assert_eq!(
            check_node_count(MAX_CONTAINER_LEN + 1),
            Err(CodecError::OverflowContainer(MAX_CONTAINER_LEN + 1))
        );

        // An oversized count on the wire is refused before any node is read.
        let mut buf = encode_to_vec(&VarInt::new(MAX_CONTAINER_LEN + 1)).unwrap();
        buf.push(0);
        assert_eq!(
            decode_buf_exact::<RlpProof>(&buf),
            Err(CodecError::OverflowContainer(MAX_CONTAINER_LEN + 1))
        );
    }

    #[test]
    fn test_delegates_to_verifier() {
        let b = make_branch();
        let value = Keccak256Hasher::new().hash_one(b"slot value");
        let fake = FakeVerifier;
        let verifier = ProofVerifier::new().with_account_verifier(&fake);

        let branch = Branch::Account(b);
        assert_eq!(branch.safe_check(value, &verifier), [3; 32]);
        assert_eq!(branch.safe_check([0; 32], &verifier), ZERO_HASH);
    }
}
