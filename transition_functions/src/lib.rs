//! The per-slot and per-block state transition function.
//!
//! Every public function is pure: it takes the pre-state by reference and
//! returns a freshly allocated post-state, so callers can keep old states
//! around for fork choice.

pub use crate::{
    block_processing::{process_attestations, process_block, process_block_header},
    error::Error,
    genesis::{genesis_block, genesis_state},
    misc::{is_justifiable_slot, is_proposer},
    slot_processing::{process_slot, process_slots},
    state_transition::{state_transition, StateRootPolicy},
};

mod block_processing;
mod error;
mod genesis;
mod misc;
mod slot_processing;
mod state_transition;
