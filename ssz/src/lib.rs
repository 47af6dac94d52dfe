//! A small SSZ implementation covering the subset of the [specification]
//! needed by the Lean consensus containers: basic unsigned integers, roots,
//! lists with type-level limits, byte lists, bitlists, and Merkleization.
//!
//! Variable-size containers implement the traits by hand. The fixed part of a
//! container is laid out first, with a 4-byte offset standing in for each
//! variable-size field; the variable parts follow in field order. Offsets are
//! relative to the start of the container's own serialization, so nested
//! variable-size objects are serialized into their own buffers and appended.
//!
//! [specification]: https://github.com/ethereum/consensus-specs/blob/v1.3.0/ssz/simple-serialize.md

pub use ethereum_types::H256;

pub use crate::{
    bit_list::BitList,
    byte_list::ByteList,
    consts::{Offset, BYTES_PER_CHUNK, BYTES_PER_LENGTH_OFFSET},
    contiguous_list::ContiguousList,
    error::{IndexError, PushError, ReadError, WriteError},
    merkle_tree::{hash_tree_root_of_chunks, merkleize_chunks, mix_in_length, pack_bytes},
    porcelain::{SszHash, SszRead, SszSize, SszWrite},
    shared::{read_offset, subslice, write_offset},
    size::Size,
};

mod basic;
mod bit_list;
mod byte_list;
mod consts;
mod contiguous_list;
mod error;
mod merkle_tree;
mod porcelain;
mod shared;
mod size;
