use anyhow::Result;
use ssz::{ContiguousList, SszHash as _, H256};
use types::{
    config::Config,
    consts::GENESIS_SLOT,
    containers::{Block, BlockBody, BlockHeader, Validator},
    state::State,
};

/// The state every node starts from. Validator keys are placeholder
/// commitments derived from the index; real deployments overwrite them from
/// the key registry before genesis time.
pub fn genesis_state(config: &Config) -> Result<State> {
    let body = BlockBody::default();

    let validators = (0..config.num_validators)
        .map(|index| Validator {
            pubkey: H256::from_low_u64_be(index + 1),
        })
        .collect();

    Ok(State {
        slot: GENESIS_SLOT,
        latest_block_header: BlockHeader {
            slot: GENESIS_SLOT,
            proposer_index: 0,
            parent_root: H256::zero(),
            body_root: body.hash_tree_root(),
            state_root: H256::zero(),
        },
        validators: ContiguousList::new(validators)?,
        ..State::default()
    })
}

/// The block anchoring the chain. Unlike every later block, its state root
/// is known up front because the genesis state does not depend on it.
#[must_use]
pub fn genesis_block(genesis_state: &State) -> Block {
    Block {
        slot: GENESIS_SLOT,
        proposer_index: 0,
        parent_root: H256::zero(),
        body: BlockBody::default(),
        state_root: genesis_state.hash_tree_root(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_state_has_empty_history() {
        let state = genesis_state(&Config::minimal(4)).expect("registry fits");

        assert_eq!(state.slot, GENESIS_SLOT);
        assert_eq!(state.validators.len(), 4);
        assert!(state.historical_block_hashes.is_empty());
        assert!(state.justified_slots.is_empty());
        assert!(state.latest_justified.root.is_zero());
        assert!(state.latest_finalized.root.is_zero());
    }

    #[test]
    fn validator_keys_are_distinct() {
        let state = genesis_state(&Config::minimal(16)).expect("registry fits");

        let mut keys = state
            .validators
            .iter()
            .map(|validator| validator.pubkey)
            .collect::<Vec<_>>();

        keys.sort();
        keys.dedup();

        assert_eq!(keys.len(), 16);
    }
}
