use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ssz::{
    hash_tree_root_of_chunks, read_offset, subslice, write_offset, BitList, ContiguousList,
    PushError, ReadError, Size, SszHash, SszRead, SszSize, SszWrite, WriteError,
    BYTES_PER_LENGTH_OFFSET, H256,
};
use typenum::{Unsigned as _, U1};

use crate::{
    consts::{HistoricalRootsLimit, JustificationVotesLimit, ValidatorRegistryLimit},
    containers::{BlockHeader, Checkpoint, Validator},
    primitives::Slot,
};

/// The replicated state all honest nodes agree on.
///
/// `justifications_roots` and `justifications_validators` carry the pending
/// justification tallies between blocks: one row of
/// [`ValidatorRegistryLimit`] bits per tracked target root, flattened in
/// ascending root order. Votes for a target accumulate across blocks, so the
/// tallies have to be part of the state for state roots to match across
/// nodes.
#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct State {
    pub slot: Slot,
    pub latest_block_header: BlockHeader,
    pub validators: ContiguousList<Validator, ValidatorRegistryLimit>,
    pub latest_justified: Checkpoint,
    pub latest_finalized: Checkpoint,
    /// Root of the block at each past slot; zero for empty slots.
    pub historical_block_hashes: ContiguousList<H256, HistoricalRootsLimit>,
    /// Bit `i` is set iff slot `i` is justified. Parallel to
    /// `historical_block_hashes`.
    pub justified_slots: BitList<HistoricalRootsLimit>,
    pub justifications_roots: ContiguousList<H256, HistoricalRootsLimit>,
    pub justifications_validators: BitList<JustificationVotesLimit>,
}

impl State {
    #[must_use]
    pub fn is_justified(&self, slot: Slot) -> bool {
        usize::try_from(slot)
            .ok()
            .and_then(|index| self.justified_slots.get(index))
            .unwrap_or(false)
    }

    /// The root recorded for `slot`, if the slot is within history.
    /// Zero means the slot was empty.
    #[must_use]
    pub fn historical_root(&self, slot: Slot) -> Option<H256> {
        usize::try_from(slot)
            .ok()
            .and_then(|index| self.historical_block_hashes.get(index))
            .copied()
    }

    /// Unpacks the pending justification tallies into a map keyed by target
    /// root. Each row has one bit per possible validator index.
    #[must_use]
    pub fn justifications(&self) -> BTreeMap<H256, Vec<bool>> {
        let row_length = ValidatorRegistryLimit::USIZE;

        self.justifications_roots
            .iter()
            .enumerate()
            .map(|(index, root)| {
                let row = (index * row_length..(index + 1) * row_length)
                    .map(|bit| self.justifications_validators.get(bit).unwrap_or(false))
                    .collect();

                (*root, row)
            })
            .collect()
    }

    /// Flattens the tallies back into the state. Rows are laid out in
    /// ascending root order to keep the encoding canonical.
    pub fn set_justifications(
        &mut self,
        justifications: BTreeMap<H256, Vec<bool>>,
    ) -> Result<(), PushError> {
        let row_length = ValidatorRegistryLimit::USIZE;

        let mut roots = ContiguousList::default();
        let mut bits = BitList::default();

        for (root, row) in justifications {
            debug_assert_eq!(row.len(), row_length);

            roots.push(root)?;

            for bit in row {
                bits.push(bit)?;
            }
        }

        self.justifications_roots = roots;
        self.justifications_validators = bits;

        Ok(())
    }
}

const HEADER_END: usize = 8 + 112;
const VALIDATORS_OFFSET_POSITION: usize = HEADER_END;
const JUSTIFIED_END: usize = VALIDATORS_OFFSET_POSITION + BYTES_PER_LENGTH_OFFSET + 40;
const FINALIZED_END: usize = JUSTIFIED_END + 40;
const STATE_FIXED_SIZE: usize = FINALIZED_END + 4 * BYTES_PER_LENGTH_OFFSET;

impl SszSize for State {
    const SIZE: Size = Size::Variable {
        minimum_size: STATE_FIXED_SIZE,
    };
}

impl SszRead for State {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let slot = u64::from_ssz(subslice(bytes, 0..8)?)?;
        let latest_block_header = BlockHeader::from_ssz(subslice(bytes, 8..HEADER_END)?)?;
        let latest_justified = Checkpoint::from_ssz(subslice(
            bytes,
            VALIDATORS_OFFSET_POSITION + BYTES_PER_LENGTH_OFFSET..JUSTIFIED_END,
        )?)?;
        let latest_finalized = Checkpoint::from_ssz(subslice(bytes, JUSTIFIED_END..FINALIZED_END)?)?;

        let mut offsets = [0; 5];
        let positions = [
            VALIDATORS_OFFSET_POSITION,
            FINALIZED_END,
            FINALIZED_END + BYTES_PER_LENGTH_OFFSET,
            FINALIZED_END + 2 * BYTES_PER_LENGTH_OFFSET,
            FINALIZED_END + 3 * BYTES_PER_LENGTH_OFFSET,
        ];

        for (offset, position) in offsets.iter_mut().zip(positions) {
            *offset = read_offset(bytes, position)?;
        }

        if offsets[0] != STATE_FIXED_SIZE {
            return Err(ReadError::OffsetInvalid {
                offset: offsets[0],
                position: VALIDATORS_OFFSET_POSITION,
                length: bytes.len(),
            });
        }

        for pair in offsets.windows(2) {
            if pair[1] < pair[0] {
                return Err(ReadError::OffsetsNotIncreasing {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }

        Ok(Self {
            slot,
            latest_block_header,
            validators: SszRead::from_ssz(subslice(bytes, offsets[0]..offsets[1])?)?,
            latest_justified,
            latest_finalized,
            historical_block_hashes: SszRead::from_ssz(subslice(bytes, offsets[1]..offsets[2])?)?,
            justified_slots: SszRead::from_ssz(subslice(bytes, offsets[2]..offsets[3])?)?,
            justifications_roots: SszRead::from_ssz(subslice(bytes, offsets[3]..offsets[4])?)?,
            justifications_validators: SszRead::from_ssz(subslice(
                bytes,
                offsets[4]..bytes.len(),
            )?)?,
        })
    }
}

impl SszWrite for State {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        let validators = self.validators.to_ssz()?;
        let historical = self.historical_block_hashes.to_ssz()?;
        let justified_slots = self.justified_slots.to_ssz()?;
        let justifications_roots = self.justifications_roots.to_ssz()?;
        let justifications_validators = self.justifications_validators.to_ssz()?;

        let mut offset = STATE_FIXED_SIZE;

        bytes.extend_from_slice(&self.slot.to_le_bytes());

        let mut header = [0; 112];
        self.latest_block_header.write_fixed(&mut header);
        bytes.extend_from_slice(&header);

        write_offset(bytes, offset)?;
        offset += validators.len();

        let mut checkpoint = [0; 40];
        self.latest_justified.write_fixed(&mut checkpoint);
        bytes.extend_from_slice(&checkpoint);
        self.latest_finalized.write_fixed(&mut checkpoint);
        bytes.extend_from_slice(&checkpoint);

        write_offset(bytes, offset)?;
        offset += historical.len();
        write_offset(bytes, offset)?;
        offset += justified_slots.len();
        write_offset(bytes, offset)?;
        offset += justifications_roots.len();
        write_offset(bytes, offset)?;

        bytes.extend_from_slice(&validators);
        bytes.extend_from_slice(&historical);
        bytes.extend_from_slice(&justified_slots);
        bytes.extend_from_slice(&justifications_roots);
        bytes.extend_from_slice(&justifications_validators);

        Ok(())
    }
}

impl SszHash for State {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        hash_tree_root_of_chunks(&[
            self.slot.hash_tree_root(),
            self.latest_block_header.hash_tree_root(),
            self.validators.hash_tree_root(),
            self.latest_justified.hash_tree_root(),
            self.latest_finalized.hash_tree_root(),
            self.historical_block_hashes.hash_tree_root(),
            self.justified_slots.hash_tree_root(),
            self.justifications_roots.hash_tree_root(),
            self.justifications_validators.hash_tree_root(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> State {
        let mut state = State {
            slot: 3,
            latest_block_header: BlockHeader {
                slot: 2,
                proposer_index: 2,
                parent_root: H256::repeat_byte(1),
                body_root: H256::repeat_byte(2),
                state_root: H256::zero(),
            },
            validators: ContiguousList::new(vec![
                Validator {
                    pubkey: H256::repeat_byte(0xa0),
                },
                Validator {
                    pubkey: H256::repeat_byte(0xa1),
                },
            ])
            .expect("within limit"),
            latest_justified: Checkpoint {
                root: H256::repeat_byte(3),
                slot: 0,
            },
            latest_finalized: Checkpoint {
                root: H256::repeat_byte(3),
                slot: 0,
            },
            historical_block_hashes: ContiguousList::new(vec![
                H256::repeat_byte(3),
                H256::zero(),
                H256::repeat_byte(4),
            ])
            .expect("within limit"),
            justified_slots: BitList::new(vec![true, false, false]).expect("within limit"),
            ..State::default()
        };

        let mut row = vec![false; ValidatorRegistryLimit::USIZE];
        row[1] = true;

        state
            .set_justifications(BTreeMap::from([(H256::repeat_byte(4), row)]))
            .expect("tallies fit");

        state
    }

    #[test]
    fn round_trip() {
        let state = sample_state();
        let encoding = state.to_ssz().expect("offsets fit");

        assert_eq!(State::from_ssz(&encoding), Ok(state));
    }

    #[test]
    fn justifications_round_trip() {
        let state = sample_state();
        let tallies = state.justifications();

        assert_eq!(tallies.len(), 1);

        let row = &tallies[&H256::repeat_byte(4)];
        assert!(row[1]);
        assert_eq!(row.iter().filter(|bit| **bit).count(), 1);

        let mut rebuilt = state.clone();
        rebuilt.set_justifications(tallies).expect("tallies fit");

        assert_eq!(rebuilt, state);
    }

    #[test]
    fn root_changes_with_slot() {
        let state = sample_state();

        let mut advanced = state.clone();
        advanced.slot += 1;

        assert_ne!(state.hash_tree_root(), advanced.hash_tree_root());
    }

    #[test]
    fn root_is_deterministic() {
        let state = sample_state();
        assert_eq!(state.hash_tree_root(), sample_state().hash_tree_root());
    }
}
