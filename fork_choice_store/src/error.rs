use thiserror::Error;
use types::primitives::{Slot, ValidatorIndex, H256};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    /// The caller treats this as a trigger to sync the missing ancestry.
    #[error("block parent {parent_root:?} is not present in the store")]
    ParentNotFound { parent_root: H256 },
    #[error("block {root:?} is not present in the store")]
    UnknownBlock { root: H256 },
    #[error("block {root:?} has no stored post-state")]
    StateUnavailable { root: H256 },
    #[error("validator {validator_index} is not the proposer for slot {slot}")]
    NotProposer {
        validator_index: ValidatorIndex,
        slot: Slot,
    },
    #[error("anchor block state root ({in_block:?}) does not match anchor state ({computed:?})")]
    AnchorStateMismatch { computed: H256, in_block: H256 },
}
