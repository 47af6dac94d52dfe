use types::containers::Attestation;

use crate::store::Store;

/// The semantic checks every attestation must pass regardless of origin.
/// Never mutates the store; a failure means the vote is silently dropped.
pub fn validate_attestation(store: &Store, attestation: &Attestation) -> bool {
    let data = attestation.data;

    let Some(source_block) = store.block(data.source.root) else {
        return false;
    };

    let Some(target_block) = store.block(data.target.root) else {
        return false;
    };

    if source_block.slot > target_block.slot {
        return false;
    }

    if data.source.slot > data.target.slot {
        return false;
    }

    // Checkpoint consistency: the declared slots must be the slots of the
    // blocks they point at.
    if source_block.slot != data.source.slot {
        return false;
    }

    if target_block.slot != data.target.slot {
        return false;
    }

    // One slot of clock skew. The gossip path separately rejects votes from
    // future slots, so the `+ 1` is only reachable for votes arriving in
    // blocks, which legitimately carry last-interval votes.
    data.slot <= store.current_slot() + 1
}
