pub use ethereum_types::H256;

pub type Slot = u64;
pub type Interval = u64;
pub type ValidatorIndex = u64;
pub type UnixSeconds = u64;
