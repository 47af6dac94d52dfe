//! The core-facing edge of the networking layer: topic names, gossip
//! parameters, message identity, payload codec, node-key persistence, and
//! chain synchronization. Host construction and wire transport live outside
//! this repository and consume these pieces.

pub use crate::{
    codec::{compress, decode_gossip, decompress, encode_gossip},
    error::Error,
    gossipsub::GossipsubParams,
    message_id::{compute_message_id, MESSAGE_ID_LENGTH},
    node_key::load_or_generate_node_key,
    sync::{validate_peer_status, BlockSource, ChainStore, Syncer},
    topics::{ATTESTATION_TOPIC, BLOCK_TOPIC, NETWORK_NAME},
};

mod codec;
mod error;
mod gossipsub;
mod message_id;
mod node_key;
mod sync;
mod topics;
