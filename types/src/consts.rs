use typenum::{Prod, U262144, U4096};

use crate::primitives::Slot;

pub const GENESIS_SLOT: Slot = 0;
pub const SECONDS_PER_SLOT: u64 = 4;

/// Subdivisions of a slot. Interval 0 is the proposal window, interval 1 the
/// attestation window.
pub const INTERVALS_PER_SLOT: u64 = 4;

pub const JUSTIFICATION_LOOKBACK_SLOTS: u64 = 3;

pub type ValidatorRegistryLimit = U4096;
pub type HistoricalRootsLimit = U262144;
pub type MaxAttestations = U4096;
pub type MaxSignatures = U4096;

/// Upper bound on the size of an opaque hash-based signature blob.
/// The core never inspects signatures; verification is an external oracle.
pub type MaxSignatureSize = U4096;

/// Limit of the flattened per-target justification bitfields:
/// one row of [`ValidatorRegistryLimit`] bits per tracked target root.
pub type JustificationVotesLimit = Prod<HistoricalRootsLimit, ValidatorRegistryLimit>;
