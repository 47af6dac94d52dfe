use thiserror::Error;

use crate::consts::BYTES_PER_LENGTH_OFFSET;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum ReadError {
    #[error("input size is incorrect for fixed-size type (expected {expected}, actual {actual})")]
    FixedSizeMismatch { expected: usize, actual: usize },
    #[error("input ends before byte {needed} (length {length})")]
    InputTooShort { needed: usize, length: usize },
    #[error("offset {offset} at position {position} is invalid (input length {length})")]
    OffsetInvalid {
        offset: usize,
        position: usize,
        length: usize,
    },
    #[error("offsets are not increasing ({previous} followed by {next})")]
    OffsetsNotIncreasing { previous: usize, next: usize },
    #[error("variable part length {length} is not a multiple of element size {element_size}")]
    ElementSizeMismatch { length: usize, element_size: usize },
    #[error("list has {actual} elements but the limit is {limit}")]
    ListTooLong { limit: usize, actual: usize },
    #[error("bitlist has {actual} bits but the limit is {limit}")]
    BitListTooLong { limit: usize, actual: usize },
    #[error("bitlist is missing the delimiter bit")]
    BitListMissingDelimiter,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum WriteError {
    #[error("offset {offset} does not fit in {BYTES_PER_LENGTH_OFFSET} bytes")]
    OffsetTooLarge { offset: usize },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum PushError {
    #[error("list is full (limit {limit})")]
    ListFull { limit: usize },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum IndexError {
    #[error("index {index} is out of bounds (length {length})")]
    OutOfBounds { index: usize, length: usize },
}
