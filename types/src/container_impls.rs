//! Hand-written SSZ implementations for the containers.
//!
//! Fixed-size containers lay their fields out back to back. Variable-size
//! containers store a 4-byte offset in the fixed part for each variable
//! field and append the variable parts in field order; offsets are validated
//! to point exactly past the fixed part when decoding.

use ssz::{
    hash_tree_root_of_chunks, read_offset, subslice, write_offset, ReadError, Size, SszHash,
    SszRead, SszSize, SszWrite, WriteError, BYTES_PER_LENGTH_OFFSET, H256,
};
use typenum::U1;

use crate::containers::{
    Attestation, AttestationData, Block, BlockBody, BlockHeader, BlockWithAttestation, Checkpoint,
    SignedAttestation, SignedBlockWithAttestation, Status, Validator,
};

const U64_SIZE: usize = core::mem::size_of::<u64>();
const ROOT_SIZE: usize = H256::len_bytes();

const CHECKPOINT_SIZE: usize = ROOT_SIZE + U64_SIZE;
const BLOCK_HEADER_SIZE: usize = 2 * U64_SIZE + 3 * ROOT_SIZE;
const ATTESTATION_DATA_SIZE: usize = U64_SIZE + 2 * CHECKPOINT_SIZE;
const ATTESTATION_SIZE: usize = U64_SIZE + ATTESTATION_DATA_SIZE;
const VALIDATOR_SIZE: usize = ROOT_SIZE;
const STATUS_SIZE: usize = 2 * CHECKPOINT_SIZE;

const SIGNED_ATTESTATION_FIXED_SIZE: usize = ATTESTATION_SIZE + BYTES_PER_LENGTH_OFFSET;
const BLOCK_BODY_FIXED_SIZE: usize = BYTES_PER_LENGTH_OFFSET;
const BLOCK_FIXED_SIZE: usize = 2 * U64_SIZE + 2 * ROOT_SIZE + BYTES_PER_LENGTH_OFFSET;
const BLOCK_WITH_ATTESTATION_FIXED_SIZE: usize = BYTES_PER_LENGTH_OFFSET + ATTESTATION_SIZE;
const SIGNED_BLOCK_FIXED_SIZE: usize = 2 * BYTES_PER_LENGTH_OFFSET;

fn check_first_offset(bytes: &[u8], position: usize, expected: usize) -> Result<(), ReadError> {
    let offset = read_offset(bytes, position)?;

    if offset != expected {
        return Err(ReadError::OffsetInvalid {
            offset,
            position,
            length: bytes.len(),
        });
    }

    Ok(())
}

impl Block {
    /// The header committing to this block. Shares its hash tree root with
    /// the block itself.
    #[must_use]
    pub fn header(&self) -> BlockHeader {
        BlockHeader {
            slot: self.slot,
            proposer_index: self.proposer_index,
            parent_root: self.parent_root,
            body_root: self.body.hash_tree_root(),
            state_root: self.state_root,
        }
    }
}

impl SszSize for Checkpoint {
    const SIZE: Size = Size::Fixed {
        size: CHECKPOINT_SIZE,
    };
}

impl SszRead for Checkpoint {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Ok(Self {
            root: H256::from_ssz(subslice(bytes, 0..ROOT_SIZE)?)?,
            slot: u64::from_ssz(subslice(bytes, ROOT_SIZE..CHECKPOINT_SIZE)?)?,
        })
    }
}

impl SszWrite for Checkpoint {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.root.write_fixed(&mut bytes[..ROOT_SIZE]);
        self.slot.write_fixed(&mut bytes[ROOT_SIZE..CHECKPOINT_SIZE]);
    }
}

impl SszHash for Checkpoint {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        hash_tree_root_of_chunks(&[self.root.hash_tree_root(), self.slot.hash_tree_root()])
    }
}

impl SszSize for BlockHeader {
    const SIZE: Size = Size::Fixed {
        size: BLOCK_HEADER_SIZE,
    };
}

impl SszRead for BlockHeader {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Ok(Self {
            slot: u64::from_ssz(subslice(bytes, 0..8)?)?,
            proposer_index: u64::from_ssz(subslice(bytes, 8..16)?)?,
            parent_root: H256::from_ssz(subslice(bytes, 16..48)?)?,
            body_root: H256::from_ssz(subslice(bytes, 48..80)?)?,
            state_root: H256::from_ssz(subslice(bytes, 80..112)?)?,
        })
    }
}

impl SszWrite for BlockHeader {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.slot.write_fixed(&mut bytes[0..8]);
        self.proposer_index.write_fixed(&mut bytes[8..16]);
        self.parent_root.write_fixed(&mut bytes[16..48]);
        self.body_root.write_fixed(&mut bytes[48..80]);
        self.state_root.write_fixed(&mut bytes[80..112]);
    }
}

impl SszHash for BlockHeader {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        hash_tree_root_of_chunks(&[
            self.slot.hash_tree_root(),
            self.proposer_index.hash_tree_root(),
            self.parent_root,
            self.body_root,
            self.state_root,
        ])
    }
}

impl SszSize for AttestationData {
    const SIZE: Size = Size::Fixed {
        size: ATTESTATION_DATA_SIZE,
    };
}

impl SszRead for AttestationData {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Ok(Self {
            slot: u64::from_ssz(subslice(bytes, 0..8)?)?,
            source: Checkpoint::from_ssz(subslice(bytes, 8..48)?)?,
            target: Checkpoint::from_ssz(subslice(bytes, 48..88)?)?,
        })
    }
}

impl SszWrite for AttestationData {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.slot.write_fixed(&mut bytes[0..8]);
        self.source.write_fixed(&mut bytes[8..48]);
        self.target.write_fixed(&mut bytes[48..88]);
    }
}

impl SszHash for AttestationData {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        hash_tree_root_of_chunks(&[
            self.slot.hash_tree_root(),
            self.source.hash_tree_root(),
            self.target.hash_tree_root(),
        ])
    }
}

impl SszSize for Attestation {
    const SIZE: Size = Size::Fixed {
        size: ATTESTATION_SIZE,
    };
}

impl SszRead for Attestation {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Ok(Self {
            validator_id: u64::from_ssz(subslice(bytes, 0..8)?)?,
            data: AttestationData::from_ssz(subslice(bytes, 8..ATTESTATION_SIZE)?)?,
        })
    }
}

impl SszWrite for Attestation {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.validator_id.write_fixed(&mut bytes[0..8]);
        self.data.write_fixed(&mut bytes[8..ATTESTATION_SIZE]);
    }
}

impl SszHash for Attestation {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        hash_tree_root_of_chunks(&[
            self.validator_id.hash_tree_root(),
            self.data.hash_tree_root(),
        ])
    }
}

impl SszSize for SignedAttestation {
    const SIZE: Size = Size::Variable {
        minimum_size: SIGNED_ATTESTATION_FIXED_SIZE,
    };
}

impl SszRead for SignedAttestation {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let message = Attestation::from_ssz(subslice(bytes, 0..ATTESTATION_SIZE)?)?;

        check_first_offset(bytes, ATTESTATION_SIZE, SIGNED_ATTESTATION_FIXED_SIZE)?;

        let signature =
            SszRead::from_ssz(subslice(bytes, SIGNED_ATTESTATION_FIXED_SIZE..bytes.len())?)?;

        Ok(Self { message, signature })
    }
}

impl SszWrite for SignedAttestation {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        let mut fixed = [0; ATTESTATION_SIZE];
        self.message.write_fixed(&mut fixed);

        bytes.extend_from_slice(&fixed);
        write_offset(bytes, SIGNED_ATTESTATION_FIXED_SIZE)?;
        self.signature.write_variable(bytes)
    }
}

impl SszHash for SignedAttestation {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        hash_tree_root_of_chunks(&[
            self.message.hash_tree_root(),
            self.signature.hash_tree_root(),
        ])
    }
}

impl SszSize for Validator {
    const SIZE: Size = Size::Fixed {
        size: VALIDATOR_SIZE,
    };
}

impl SszRead for Validator {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Ok(Self {
            pubkey: H256::from_ssz(subslice(bytes, 0..VALIDATOR_SIZE)?)?,
        })
    }
}

impl SszWrite for Validator {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.pubkey.write_fixed(bytes);
    }
}

impl SszHash for Validator {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        hash_tree_root_of_chunks(&[self.pubkey])
    }
}

impl SszSize for BlockBody {
    const SIZE: Size = Size::Variable {
        minimum_size: BLOCK_BODY_FIXED_SIZE,
    };
}

impl SszRead for BlockBody {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        check_first_offset(bytes, 0, BLOCK_BODY_FIXED_SIZE)?;

        Ok(Self {
            attestations: SszRead::from_ssz(subslice(
                bytes,
                BLOCK_BODY_FIXED_SIZE..bytes.len(),
            )?)?,
        })
    }
}

impl SszWrite for BlockBody {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        write_offset(bytes, BLOCK_BODY_FIXED_SIZE)?;
        self.attestations.write_variable(bytes)
    }
}

impl SszHash for BlockBody {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        hash_tree_root_of_chunks(&[self.attestations.hash_tree_root()])
    }
}

impl SszSize for Block {
    const SIZE: Size = Size::Variable {
        minimum_size: BLOCK_FIXED_SIZE,
    };
}

impl SszRead for Block {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let slot = u64::from_ssz(subslice(bytes, 0..8)?)?;
        let proposer_index = u64::from_ssz(subslice(bytes, 8..16)?)?;
        let parent_root = H256::from_ssz(subslice(bytes, 16..48)?)?;

        check_first_offset(bytes, 48, BLOCK_FIXED_SIZE)?;

        let state_root = H256::from_ssz(subslice(bytes, 52..BLOCK_FIXED_SIZE)?)?;
        let body = BlockBody::from_ssz(subslice(bytes, BLOCK_FIXED_SIZE..bytes.len())?)?;

        Ok(Self {
            slot,
            proposer_index,
            parent_root,
            body,
            state_root,
        })
    }
}

impl SszWrite for Block {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        let mut scalars = [0; 2 * U64_SIZE + ROOT_SIZE];
        self.slot.write_fixed(&mut scalars[0..8]);
        self.proposer_index.write_fixed(&mut scalars[8..16]);
        self.parent_root.write_fixed(&mut scalars[16..48]);

        bytes.extend_from_slice(&scalars);
        write_offset(bytes, BLOCK_FIXED_SIZE)?;
        bytes.extend_from_slice(self.state_root.as_bytes());
        self.body.write_variable(bytes)
    }
}

impl SszHash for Block {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        hash_tree_root_of_chunks(&[
            self.slot.hash_tree_root(),
            self.proposer_index.hash_tree_root(),
            self.parent_root,
            self.body.hash_tree_root(),
            self.state_root,
        ])
    }
}

impl SszSize for BlockWithAttestation {
    const SIZE: Size = Size::Variable {
        minimum_size: BLOCK_WITH_ATTESTATION_FIXED_SIZE,
    };
}

impl SszRead for BlockWithAttestation {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        check_first_offset(bytes, 0, BLOCK_WITH_ATTESTATION_FIXED_SIZE)?;

        let proposer_attestation = Attestation::from_ssz(subslice(
            bytes,
            BYTES_PER_LENGTH_OFFSET..BLOCK_WITH_ATTESTATION_FIXED_SIZE,
        )?)?;

        let block = Block::from_ssz(subslice(
            bytes,
            BLOCK_WITH_ATTESTATION_FIXED_SIZE..bytes.len(),
        )?)?;

        Ok(Self {
            block,
            proposer_attestation,
        })
    }
}

impl SszWrite for BlockWithAttestation {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        write_offset(bytes, BLOCK_WITH_ATTESTATION_FIXED_SIZE)?;

        let mut fixed = [0; ATTESTATION_SIZE];
        self.proposer_attestation.write_fixed(&mut fixed);
        bytes.extend_from_slice(&fixed);

        self.block.write_variable(bytes)
    }
}

impl SszHash for BlockWithAttestation {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        hash_tree_root_of_chunks(&[
            self.block.hash_tree_root(),
            self.proposer_attestation.hash_tree_root(),
        ])
    }
}

impl SszSize for SignedBlockWithAttestation {
    const SIZE: Size = Size::Variable {
        minimum_size: SIGNED_BLOCK_FIXED_SIZE,
    };
}

impl SszRead for SignedBlockWithAttestation {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        check_first_offset(bytes, 0, SIGNED_BLOCK_FIXED_SIZE)?;

        let signatures_offset = read_offset(bytes, BYTES_PER_LENGTH_OFFSET)?;

        if signatures_offset < SIGNED_BLOCK_FIXED_SIZE {
            return Err(ReadError::OffsetsNotIncreasing {
                previous: SIGNED_BLOCK_FIXED_SIZE,
                next: signatures_offset,
            });
        }

        Ok(Self {
            message: BlockWithAttestation::from_ssz(subslice(
                bytes,
                SIGNED_BLOCK_FIXED_SIZE..signatures_offset,
            )?)?,
            signatures: SszRead::from_ssz(subslice(bytes, signatures_offset..bytes.len())?)?,
        })
    }
}

impl SszWrite for SignedBlockWithAttestation {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        let message = self.message.to_ssz()?;
        let signatures = self.signatures.to_ssz()?;

        write_offset(bytes, SIGNED_BLOCK_FIXED_SIZE)?;
        write_offset(bytes, SIGNED_BLOCK_FIXED_SIZE + message.len())?;
        bytes.extend_from_slice(&message);
        bytes.extend_from_slice(&signatures);

        Ok(())
    }
}

impl SszHash for SignedBlockWithAttestation {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        hash_tree_root_of_chunks(&[
            self.message.hash_tree_root(),
            self.signatures.hash_tree_root(),
        ])
    }
}

impl SszSize for Status {
    const SIZE: Size = Size::Fixed { size: STATUS_SIZE };
}

impl SszRead for Status {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Ok(Self {
            head: Checkpoint::from_ssz(subslice(bytes, 0..CHECKPOINT_SIZE)?)?,
            finalized: Checkpoint::from_ssz(subslice(bytes, CHECKPOINT_SIZE..STATUS_SIZE)?)?,
        })
    }
}

impl SszWrite for Status {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.head.write_fixed(&mut bytes[..CHECKPOINT_SIZE]);
        self.finalized
            .write_fixed(&mut bytes[CHECKPOINT_SIZE..STATUS_SIZE]);
    }
}

impl SszHash for Status {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        hash_tree_root_of_chunks(&[self.head.hash_tree_root(), self.finalized.hash_tree_root()])
    }
}

#[cfg(test)]
mod tests {
    use ssz::ContiguousList;

    use crate::containers::SignatureBytes;

    use super::*;

    fn sample_attestation() -> Attestation {
        Attestation {
            validator_id: 7,
            data: AttestationData {
                slot: 5,
                source: Checkpoint {
                    root: H256::repeat_byte(1),
                    slot: 3,
                },
                target: Checkpoint {
                    root: H256::repeat_byte(2),
                    slot: 4,
                },
            },
        }
    }

    fn sample_block() -> Block {
        Block {
            slot: 5,
            proposer_index: 1,
            parent_root: H256::repeat_byte(3),
            body: BlockBody {
                attestations: ContiguousList::new(vec![sample_attestation()])
                    .expect("within limit"),
            },
            state_root: H256::repeat_byte(4),
        }
    }

    #[test]
    fn checkpoint_round_trip() {
        let checkpoint = Checkpoint {
            root: H256::repeat_byte(9),
            slot: 42,
        };

        let encoding = checkpoint.to_ssz().expect("fixed size");

        assert_eq!(encoding.len(), CHECKPOINT_SIZE);
        assert_eq!(Checkpoint::from_ssz(&encoding), Ok(checkpoint));
    }

    #[test]
    fn attestation_round_trip() {
        let attestation = sample_attestation();
        let encoding = attestation.to_ssz().expect("fixed size");

        assert_eq!(encoding.len(), ATTESTATION_SIZE);
        assert_eq!(Attestation::from_ssz(&encoding), Ok(attestation));
    }

    #[test]
    fn signed_attestation_round_trip() {
        let signed = SignedAttestation {
            message: sample_attestation(),
            signature: SignatureBytes::new(vec![0xaa; 17]).expect("within limit"),
        };

        let encoding = signed.to_ssz().expect("offsets fit");

        assert_eq!(SignedAttestation::from_ssz(&encoding), Ok(signed));
    }

    #[test]
    fn block_round_trip() {
        let block = sample_block();
        let encoding = block.to_ssz().expect("offsets fit");

        assert_eq!(Block::from_ssz(&encoding), Ok(block));
    }

    #[test]
    fn empty_body_block_round_trip() {
        let block = Block::default();
        let encoding = block.to_ssz().expect("offsets fit");

        assert_eq!(encoding.len(), BLOCK_FIXED_SIZE + BLOCK_BODY_FIXED_SIZE);
        assert_eq!(Block::from_ssz(&encoding), Ok(block));
    }

    #[test]
    fn signed_block_round_trip() {
        let signed = SignedBlockWithAttestation {
            message: BlockWithAttestation {
                block: sample_block(),
                proposer_attestation: sample_attestation(),
            },
            signatures: ContiguousList::new(vec![
                SignatureBytes::new(vec![1, 2, 3]).expect("within limit"),
                SignatureBytes::default(),
            ])
            .expect("within limit"),
        };

        let encoding = signed.to_ssz().expect("offsets fit");

        assert_eq!(SignedBlockWithAttestation::from_ssz(&encoding), Ok(signed));
    }

    #[test]
    fn status_round_trip() {
        let status = Status {
            head: Checkpoint {
                root: H256::repeat_byte(5),
                slot: 11,
            },
            finalized: Checkpoint {
                root: H256::repeat_byte(6),
                slot: 8,
            },
        };

        let encoding = status.to_ssz().expect("fixed size");

        assert_eq!(encoding.len(), STATUS_SIZE);
        assert_eq!(Status::from_ssz(&encoding), Ok(status));
    }

    // The fork-choice store keys blocks by their root and links them through
    // `parent_root`, which always comes from a header.
    #[test]
    fn block_and_header_share_a_root() {
        let block = sample_block();
        assert_eq!(block.hash_tree_root(), block.header().hash_tree_root());
    }

    #[test]
    fn decoding_rejects_misplaced_body_offset() {
        let block = sample_block();
        let mut encoding = block.to_ssz().expect("offsets fit");

        // Point the body offset one byte past its real position.
        encoding[48] += 1;

        assert!(Block::from_ssz(&encoding).is_err());
    }
}
