use num_integer::Roots as _;
use types::primitives::{Slot, ValidatorIndex};

/// Proposers rotate round-robin through the registry.
#[must_use]
pub const fn is_proposer(
    validator_index: ValidatorIndex,
    slot: Slot,
    validator_count: u64,
) -> bool {
    validator_count > 0 && slot % validator_count == validator_index
}

/// Whether `candidate_slot` may be justified once `finalized_slot` is final.
/// The allowed distances thin out as they grow: everything up to 5, then
/// perfect squares and pronic numbers.
#[must_use]
pub fn is_justifiable_slot(finalized_slot: Slot, candidate_slot: Slot) -> bool {
    let Some(delta) = candidate_slot.checked_sub(finalized_slot) else {
        return false;
    };

    if delta <= 5 {
        return true;
    }

    let root = delta.sqrt();

    root * root == delta || root * (root + 1) == delta
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn proposer_assignment_is_round_robin() {
        assert!(is_proposer(1, 1, 4));
        assert!(is_proposer(3, 3, 4));
        assert!(is_proposer(0, 4, 4));
        assert!(!is_proposer(2, 1, 4));
        assert!(!is_proposer(0, 1, 0));
    }

    #[test_case(0, true; "zero delta")]
    #[test_case(5, true; "small delta")]
    #[test_case(6, true; "pronic 2*3")]
    #[test_case(7, false)]
    #[test_case(9, true; "square of 3")]
    #[test_case(11, false)]
    #[test_case(12, true; "pronic 3*4")]
    #[test_case(16, true; "square of 4")]
    #[test_case(20, true; "pronic 4*5")]
    #[test_case(21, false)]
    #[test_case(25, true; "square of 5")]
    fn justifiable_distances(delta: Slot, justifiable: bool) {
        assert_eq!(is_justifiable_slot(10, 10 + delta), justifiable);
    }

    #[test]
    fn slots_before_finalization_are_not_justifiable() {
        assert!(!is_justifiable_slot(10, 9));
    }
}
