use serde::{Deserialize, Serialize};

use crate::primitives::UnixSeconds;

/// Chain-level configuration. Everything else about the network is fixed by
/// the devnet constants in [`consts`](crate::consts).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub genesis_time: UnixSeconds,
    pub num_validators: u64,
}

impl Config {
    #[must_use]
    pub const fn minimal(num_validators: u64) -> Self {
        Self {
            genesis_time: 0,
            num_validators,
        }
    }
}
