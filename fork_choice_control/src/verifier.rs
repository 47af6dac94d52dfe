use ssz::H256;
use types::primitives::Slot;

/// The seam between consensus and the hash-based signature scheme.
/// The core only ever asks one question.
pub trait Verifier {
    fn verify(&self, pubkey: H256, slot: Slot, message: H256, signature: &[u8]) -> bool;
}

/// Accepts everything. Stands in until real keys are wired in at the node
/// boundary; the core's behavior does not depend on which verifier runs.
#[derive(Clone, Copy, Default)]
pub struct NullVerifier;

impl Verifier for NullVerifier {
    fn verify(&self, _pubkey: H256, _slot: Slot, _message: H256, _signature: &[u8]) -> bool {
        true
    }
}
