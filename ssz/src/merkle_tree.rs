use ethereum_types::H256;
use hashing::{hash_256_256, ZERO_HASHES};

use crate::consts::BYTES_PER_CHUNK;

/// Root of a Merkle tree of the given `depth` with `chunks` as its leftmost
/// leaves and zero chunks everywhere else. `chunks` must fit in the tree.
#[must_use]
pub fn merkleize_chunks(chunks: &[H256], depth: u32) -> H256 {
    debug_assert!(depth < 64 && chunks.len() <= capacity(depth));
    subtree_root(chunks, depth)
}

/// Merkleizes the fields of a container. The tree depth is determined by the
/// number of fields.
#[must_use]
pub fn hash_tree_root_of_chunks(chunks: &[H256]) -> H256 {
    merkleize_chunks(chunks, depth_for(chunks.len()))
}

#[must_use]
pub fn mix_in_length(root: H256, length: usize) -> H256 {
    let mut chunk = H256::zero();
    chunk.as_bytes_mut()[..core::mem::size_of::<u64>()]
        .copy_from_slice(&(length as u64).to_le_bytes());
    hash_256_256(root, chunk)
}

/// Packs serialized basic values into chunks, zero-padding the last one.
#[must_use]
pub fn pack_bytes(bytes: &[u8]) -> Vec<H256> {
    bytes
        .chunks(BYTES_PER_CHUNK)
        .map(|chunk| {
            let mut padded = H256::zero();
            padded.as_bytes_mut()[..chunk.len()].copy_from_slice(chunk);
            padded
        })
        .collect()
}

/// Smallest depth whose tree holds `chunk_count` chunks.
#[must_use]
pub const fn depth_for(chunk_count: usize) -> u32 {
    if chunk_count <= 1 {
        0
    } else {
        (chunk_count - 1).ilog2() + 1
    }
}

const fn capacity(depth: u32) -> usize {
    1 << depth
}

fn subtree_root(chunks: &[H256], depth: u32) -> H256 {
    if chunks.is_empty() {
        return ZERO_HASHES[depth as usize];
    }

    if depth == 0 {
        return chunks[0];
    }

    let half = capacity(depth - 1);

    if chunks.len() <= half {
        hash_256_256(
            subtree_root(chunks, depth - 1),
            ZERO_HASHES[depth as usize - 1],
        )
    } else {
        hash_256_256(
            subtree_root(&chunks[..half], depth - 1),
            subtree_root(&chunks[half..], depth - 1),
        )
    }
}
