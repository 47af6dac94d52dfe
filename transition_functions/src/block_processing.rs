use anyhow::{ensure, Result};
use ssz::{SszHash as _, H256};
use typenum::Unsigned as _;
use types::{
    consts::ValidatorRegistryLimit,
    containers::{Attestation, Block, BlockHeader, Checkpoint},
    state::State,
};

use crate::{error::Error, misc};

/// Validates the block header against the state and updates header-linked
/// fields: the parent's entry in the history, empty-slot fill, and the new
/// latest block header with a zero state root.
pub fn process_block_header(state: &State, block: &Block) -> Result<State> {
    ensure!(
        block.slot == state.slot,
        Error::SlotMismatch {
            state_slot: state.slot,
            block_slot: block.slot,
        },
    );

    ensure!(
        block.slot > state.latest_block_header.slot,
        Error::BlockNotNewerThanLatestBlockHeader {
            block_slot: block.slot,
            block_header_slot: state.latest_block_header.slot,
        },
    );

    let validator_count = u64::try_from(state.validators.len())?;

    ensure!(
        misc::is_proposer(block.proposer_index, block.slot, validator_count),
        Error::ProposerIndexMismatch {
            computed: block.slot % validator_count.max(1),
            in_block: block.proposer_index,
        },
    );

    let expected_parent = state.latest_block_header.hash_tree_root();

    ensure!(
        block.parent_root == expected_parent,
        Error::ParentRootMismatch {
            computed: expected_parent,
            in_block: block.parent_root,
        },
    );

    let mut post = state.clone();
    let parent_slot = state.latest_block_header.slot;
    let genesis_transition = parent_slot == 0;

    // The first block after genesis anchors justification: the genesis block
    // becomes both justified and finalized.
    if genesis_transition {
        post.latest_justified = Checkpoint {
            root: block.parent_root,
            slot: state.latest_justified.slot,
        };
        post.latest_finalized = Checkpoint {
            root: block.parent_root,
            slot: state.latest_finalized.slot,
        };
    }

    post.historical_block_hashes.push(block.parent_root)?;
    post.justified_slots.push(genesis_transition)?;

    let empty_slots = block.slot - parent_slot - 1;

    for _ in 0..empty_slots {
        post.historical_block_hashes.push(H256::zero())?;
        post.justified_slots.push(false)?;
    }

    post.latest_block_header = BlockHeader {
        slot: block.slot,
        proposer_index: block.proposer_index,
        parent_root: block.parent_root,
        body_root: block.body.hash_tree_root(),
        state_root: H256::zero(),
    };

    Ok(post)
}

/// Applies the block's votes to the justification tallies. Votes that miss
/// any of the eligibility conditions are skipped without error; a vote that
/// pushes its target past the 2/3 threshold justifies the target and may
/// finalize the source.
pub fn process_attestations(state: &State, attestations: &[Attestation]) -> Result<State> {
    let mut post = state.clone();
    let mut tallies = post.justifications();

    let validator_count = post.validators.len();

    for attestation in attestations {
        let Attestation { validator_id, data } = attestation;
        let source = data.source;
        let target = data.target;

        let source_matches_history = post.historical_root(source.slot) == Some(source.root);
        let target_matches_history = post.historical_root(target.slot) == Some(target.root);

        let eligible = source_matches_history
            && target_matches_history
            && post.is_justified(source.slot)
            && !post.is_justified(target.slot)
            && target.slot > source.slot
            && misc::is_justifiable_slot(post.latest_finalized.slot, target.slot);

        if !eligible {
            continue;
        }

        let Ok(validator_index) = usize::try_from(*validator_id) else {
            continue;
        };

        if validator_index >= validator_count {
            continue;
        }

        let tally = tallies
            .entry(target.root)
            .or_insert_with(|| vec![false; ValidatorRegistryLimit::USIZE]);

        tally[validator_index] = true;

        let count = tally.iter().filter(|vote| **vote).count();

        if 3 * count < 2 * validator_count {
            continue;
        }

        // Justified. The tally is no longer needed.
        tallies.remove(&target.root);

        post.justified_slots.set(target.slot.try_into()?, true)?;

        if target.slot > post.latest_justified.slot {
            post.latest_justified = target;
        }

        // The source is finalized when the target is its immediate successor
        // among justifiable slots.
        let any_justifiable_between = (source.slot + 1..target.slot)
            .any(|slot| misc::is_justifiable_slot(post.latest_finalized.slot, slot));

        if !any_justifiable_between && source.slot > post.latest_finalized.slot {
            post.latest_finalized = source;
        }
    }

    post.set_justifications(tallies)?;

    Ok(post)
}

/// Full block processing: header, then the body's votes.
pub fn process_block(state: &State, block: &Block) -> Result<State> {
    let post = process_block_header(state, block)?;
    process_attestations(&post, block.body.attestations.as_slice())
}

#[cfg(test)]
mod tests {
    use ssz::ContiguousList;
    use types::{config::Config, containers::AttestationData};

    use crate::{genesis::genesis_state, slot_processing::process_slots};

    use super::*;

    fn build_block(state: &State, slot: u64, attestations: Vec<Attestation>) -> (Block, State) {
        let pre = process_slots(state, slot).expect("slot is later");

        let block = Block {
            slot,
            proposer_index: slot % u64::try_from(pre.validators.len()).expect("registry fits"),
            parent_root: pre.latest_block_header.hash_tree_root(),
            body: types::containers::BlockBody {
                attestations: ContiguousList::new(attestations).expect("within limit"),
            },
            state_root: H256::zero(),
        };

        let post = process_block(&pre, &block).expect("block is valid");

        (block, post)
    }

    fn vote(validator_id: u64, slot: u64, source: Checkpoint, target: Checkpoint) -> Attestation {
        Attestation {
            validator_id,
            data: AttestationData {
                slot,
                source,
                target,
            },
        }
    }

    // Single-chain happy path from genesis with 4 validators.
    #[test]
    fn first_block_after_genesis_anchors_justification() {
        let genesis = genesis_state(&Config::minimal(4)).expect("registry fits");
        let genesis_root = process_slot_root(&genesis);

        let (block, post) = build_block(&genesis, 1, vec![]);

        assert_eq!(block.proposer_index, 1);
        assert_eq!(post.slot, 1);
        assert_eq!(post.historical_block_hashes.as_slice(), [genesis_root]);
        assert_eq!(post.justified_slots.iter().collect::<Vec<_>>(), [true]);
        assert_eq!(
            post.latest_justified,
            Checkpoint {
                root: genesis_root,
                slot: 0,
            },
        );
        assert_eq!(post.latest_justified, post.latest_finalized);
    }

    #[test]
    fn header_processing_rejects_wrong_proposers() {
        let genesis = genesis_state(&Config::minimal(4)).expect("registry fits");
        let pre = process_slots(&genesis, 1).expect("slot is later");

        let block = Block {
            slot: 1,
            proposer_index: 2,
            parent_root: pre.latest_block_header.hash_tree_root(),
            body: types::containers::BlockBody::default(),
            state_root: H256::zero(),
        };

        let error = process_block_header(&pre, &block).expect_err("proposer is wrong");

        assert_eq!(
            error.downcast_ref(),
            Some(&Error::ProposerIndexMismatch {
                computed: 1,
                in_block: 2,
            }),
        );
    }

    #[test]
    fn header_processing_rejects_wrong_parents() {
        let genesis = genesis_state(&Config::minimal(4)).expect("registry fits");
        let pre = process_slots(&genesis, 1).expect("slot is later");

        let block = Block {
            slot: 1,
            proposer_index: 1,
            parent_root: H256::repeat_byte(0xad),
            body: types::containers::BlockBody::default(),
            state_root: H256::zero(),
        };

        let error = process_block_header(&pre, &block).expect_err("parent is wrong");

        assert!(matches!(
            error.downcast_ref(),
            Some(Error::ParentRootMismatch { .. }),
        ));
    }

    // Empty slots between blocks leave zero roots and clear justified bits.
    #[test]
    fn skipped_slots_are_recorded_as_empty() {
        let genesis = genesis_state(&Config::minimal(4)).expect("registry fits");
        let genesis_root = process_slot_root(&genesis);

        let (_, post) = build_block(&genesis, 3, vec![]);

        assert_eq!(post.slot, 3);
        assert_eq!(
            post.historical_block_hashes.as_slice(),
            [genesis_root, H256::zero(), H256::zero()],
        );
        assert_eq!(
            post.justified_slots.iter().collect::<Vec<_>>(),
            [true, false, false],
        );
    }

    #[test]
    fn two_thirds_of_votes_justify_and_finalize() {
        let genesis = genesis_state(&Config::minimal(4)).expect("registry fits");
        let genesis_root = process_slot_root(&genesis);

        let (block_1, state_1) = build_block(&genesis, 1, vec![]);
        let block_1_root = block_1.hash_tree_root();

        let source = Checkpoint {
            root: genesis_root,
            slot: 0,
        };
        let target = Checkpoint {
            root: block_1_root,
            slot: 1,
        };

        // Two votes are not enough for 4 validators.
        let (_, undecided) = build_block(
            &state_1,
            2,
            vec![vote(0, 2, source, target), vote(1, 2, source, target)],
        );

        assert!(!undecided.is_justified(1));
        assert_eq!(undecided.justifications().len(), 1);

        // A third vote crosses 2/3.
        let (_, justified) = build_block(
            &state_1,
            2,
            vec![
                vote(0, 2, source, target),
                vote(1, 2, source, target),
                vote(2, 2, source, target),
            ],
        );

        assert!(justified.is_justified(1));
        assert_eq!(justified.latest_justified, target);
        assert_eq!(justified.latest_finalized, source);
        assert!(
            justified.justifications().is_empty(),
            "the tally must be dropped once the target is justified",
        );
    }

    #[test]
    fn finalization_advances_along_consecutive_justified_slots() {
        let genesis = genesis_state(&Config::minimal(4)).expect("registry fits");
        let genesis_root = process_slot_root(&genesis);

        let (block_1, state_1) = build_block(&genesis, 1, vec![]);
        let block_1_root = block_1.hash_tree_root();

        let genesis_checkpoint = Checkpoint {
            root: genesis_root,
            slot: 0,
        };
        let checkpoint_1 = Checkpoint {
            root: block_1_root,
            slot: 1,
        };

        let votes_1 = (0..3)
            .map(|validator| vote(validator, 2, genesis_checkpoint, checkpoint_1))
            .collect();

        let (block_2, state_2) = build_block(&state_1, 2, votes_1);
        let checkpoint_2 = Checkpoint {
            root: block_2.hash_tree_root(),
            slot: 2,
        };

        let votes_2 = (0..3)
            .map(|validator| vote(validator, 3, checkpoint_1, checkpoint_2))
            .collect();

        let (_, state_3) = build_block(&state_2, 3, votes_2);

        assert_eq!(state_3.latest_justified, checkpoint_2);
        assert_eq!(state_3.latest_finalized, checkpoint_1);
    }

    #[test]
    fn ineligible_votes_are_skipped_silently() {
        let genesis = genesis_state(&Config::minimal(4)).expect("registry fits");
        let genesis_root = process_slot_root(&genesis);

        let (block_1, state_1) = build_block(&genesis, 1, vec![]);

        let source = Checkpoint {
            root: genesis_root,
            slot: 0,
        };
        let bogus_target = Checkpoint {
            root: H256::repeat_byte(0xee),
            slot: 1,
        };
        let backwards = vote(
            0,
            2,
            Checkpoint {
                root: block_1.hash_tree_root(),
                slot: 1,
            },
            source,
        );

        let (_, post) = build_block(
            &state_1,
            2,
            vec![vote(0, 2, source, bogus_target), backwards],
        );

        assert!(post.justifications().is_empty());
        assert!(!post.is_justified(1));
    }

    fn process_slot_root(genesis: &State) -> H256 {
        // The genesis block root equals the root of the genesis header once
        // its state root is filled in by the first `process_slot`.
        crate::slot_processing::process_slot(genesis)
            .latest_block_header
            .hash_tree_root()
    }
}
