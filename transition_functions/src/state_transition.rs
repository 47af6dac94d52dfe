use anyhow::{ensure, Result};
use ssz::SszHash as _;
use types::{containers::Block, state::State};

use crate::{
    block_processing::process_block, error::Error, slot_processing::process_slots,
};

pub enum StateRootPolicy {
    Verify,
    Trust,
}

impl StateRootPolicy {
    pub fn verify(self, state: &State, block: &Block) -> Result<()> {
        match self {
            Self::Verify => {
                let computed = state.hash_tree_root();
                let in_block = block.state_root;

                ensure!(
                    computed == in_block,
                    Error::StateRootMismatch { computed, in_block },
                );
            }
            Self::Trust => {}
        }

        Ok(())
    }
}

/// The complete transition for one block: advance through intermediate
/// slots, apply the block, and check the declared state root.
///
/// Signature verification is not part of the transition; it happens at the
/// boundary before a block reaches this function.
pub fn state_transition(
    state: &State,
    block: &Block,
    state_root_policy: StateRootPolicy,
) -> Result<State> {
    // > Process slots (including those with no blocks) since block
    let post = process_slots(state, block.slot)?;

    // > Process block
    let post = process_block(&post, block)?;

    // > Verify state root
    state_root_policy.verify(&post, block)?;

    Ok(post)
}

#[cfg(test)]
mod tests {
    use ssz::H256;
    use types::config::Config;

    use crate::genesis::{genesis_block, genesis_state};

    use super::*;

    fn valid_block(state: &State, slot: u64) -> Block {
        let mut block = Block {
            slot,
            proposer_index: slot % u64::try_from(state.validators.len()).expect("registry fits"),
            parent_root: crate::process_slot(state).latest_block_header.hash_tree_root(),
            body: types::containers::BlockBody::default(),
            state_root: H256::zero(),
        };

        let trial = state_transition(state, &block, StateRootPolicy::Trust)
            .expect("block is valid apart from the state root");

        block.state_root = trial.hash_tree_root();
        block
    }

    #[test]
    fn accepted_blocks_commit_to_their_post_state() {
        let genesis = genesis_state(&Config::minimal(4)).expect("registry fits");
        let block = valid_block(&genesis, 1);

        let post = state_transition(&genesis, &block, StateRootPolicy::Verify)
            .expect("state root matches");

        assert_eq!(post.hash_tree_root(), block.state_root);
        assert_eq!(
            usize::try_from(post.slot).expect("slot fits"),
            post.historical_block_hashes.len(),
        );
        assert_eq!(
            post.historical_block_hashes.len(),
            post.justified_slots.len(),
        );
    }

    #[test]
    fn transition_is_deterministic() {
        let genesis = genesis_state(&Config::minimal(4)).expect("registry fits");
        let block = valid_block(&genesis, 2);

        let first = state_transition(&genesis, &block, StateRootPolicy::Verify)
            .expect("state root matches");
        let second = state_transition(&genesis, &block, StateRootPolicy::Verify)
            .expect("state root matches");

        assert_eq!(first, second);
        assert_eq!(first.hash_tree_root(), second.hash_tree_root());
    }

    #[test]
    fn corrupted_state_roots_are_rejected() {
        let genesis = genesis_state(&Config::minimal(4)).expect("registry fits");
        let mut block = valid_block(&genesis, 1);

        let mut corrupted = block.state_root.to_fixed_bytes();
        corrupted[31] ^= 1;
        block.state_root = H256(corrupted);

        let error =
            state_transition(&genesis, &block, StateRootPolicy::Verify).expect_err("root differs");

        assert!(matches!(
            error.downcast_ref(),
            Some(crate::Error::StateRootMismatch { .. }),
        ));
    }

    #[test]
    fn genesis_block_commits_to_the_genesis_state() {
        let genesis = genesis_state(&Config::minimal(4)).expect("registry fits");
        let block = genesis_block(&genesis);

        assert_eq!(block.state_root, genesis.hash_tree_root());
        assert_eq!(
            block.hash_tree_root(),
            crate::process_slot(&genesis)
                .latest_block_header
                .hash_tree_root(),
            "the genesis block root must match the filled genesis header root",
        );
    }
}
