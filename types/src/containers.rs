use serde::{Deserialize, Serialize};
use ssz::{ByteList, ContiguousList};

use crate::{
    consts::{MaxAttestations, MaxSignatureSize, MaxSignatures},
    primitives::{Slot, ValidatorIndex, H256},
};

pub type SignatureBytes = ByteList<MaxSignatureSize>;

/// An anchor for justification and finalization accounting: a block root
/// together with the slot it was proposed in.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug, Deserialize, Serialize,
)]
#[serde(deny_unknown_fields)]
pub struct Checkpoint {
    pub root: H256,
    pub slot: Slot,
}

/// The header whose hash tree root is the block's canonical identifier.
/// `state_root` is zero at production time and is filled in by the next
/// slot's processing.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BlockHeader {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub parent_root: H256,
    pub body_root: H256,
    pub state_root: H256,
}

#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug, Deserialize, Serialize,
)]
#[serde(deny_unknown_fields)]
pub struct AttestationData {
    pub slot: Slot,
    pub source: Checkpoint,
    pub target: Checkpoint,
}

/// A vote declaring that the validator observed `data.target` at `data.slot`,
/// with `data.source` as the newest justified checkpoint it knows of.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Attestation {
    pub validator_id: ValidatorIndex,
    pub data: AttestationData,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SignedAttestation {
    pub message: Attestation,
    pub signature: SignatureBytes,
}

/// A commitment to a validator's hash-based public key. The key material
/// itself never enters the core; signatures are verified at the boundary.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Validator {
    pub pubkey: H256,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BlockBody {
    pub attestations: ContiguousList<Attestation, MaxAttestations>,
}

/// The header fields with the body inlined in place of `body_root`, so that
/// a block and its header Merkleize to the same root.
#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub parent_root: H256,
    pub body: BlockBody,
    pub state_root: H256,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BlockWithAttestation {
    pub block: Block,
    /// The proposer's own vote, shipped in the same message to save a
    /// gossip round trip.
    pub proposer_attestation: Attestation,
}

/// The wire envelope for blocks.
#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SignedBlockWithAttestation {
    pub message: BlockWithAttestation,
    pub signatures: ContiguousList<SignatureBytes, MaxSignatures>,
}

/// Exchanged on every new peer connection; the dialer sends first.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Status {
    pub head: Checkpoint,
    pub finalized: Checkpoint,
}
