use anyhow::{ensure, Result};
use ssz::SszHash as _;
use types::{primitives::Slot, state::State};

use crate::error::Error;

/// Per-slot maintenance. If the latest block header still has a zero state
/// root, the current state root is cached into it, closing the deferred
/// commitment left by the previous block.
#[must_use]
pub fn process_slot(state: &State) -> State {
    let mut post = state.clone();
    process_slot_in_place(&mut post);
    post
}

/// Advances the state through empty slots up to `target_slot`.
pub fn process_slots(state: &State, target_slot: Slot) -> Result<State> {
    ensure!(
        state.slot < target_slot,
        Error::SlotNotLater {
            current: state.slot,
            target: target_slot,
        },
    );

    let mut post = state.clone();

    // The slot is incremented after `process_slot`, so each intermediate
    // slot has its header's state root filled exactly once.
    while post.slot < target_slot {
        process_slot_in_place(&mut post);
        post.slot += 1;
    }

    Ok(post)
}

fn process_slot_in_place(state: &mut State) {
    if state.latest_block_header.state_root.is_zero() {
        let state_root = state.hash_tree_root();
        state.latest_block_header.state_root = state_root;
    }
}
