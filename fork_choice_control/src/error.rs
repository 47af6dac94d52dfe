use thiserror::Error;
use types::primitives::ValidatorIndex;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("signature of validator {validator_index} failed verification")]
    InvalidSignature { validator_index: ValidatorIndex },
}
