use anyhow::Result;
use ssz::{SszRead, SszWrite};

/// Raw (block-format) snappy, as used on the gossip topics.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    Ok(snap::raw::Encoder::new().compress_vec(data)?)
}

pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    Ok(snap::raw::Decoder::new().decompress_vec(data)?)
}

/// SSZ-encode and compress for publishing.
pub fn encode_gossip<T: SszWrite>(message: &T) -> Result<Vec<u8>> {
    compress(&message.to_ssz()?)
}

/// Decompress and SSZ-decode an inbound gossip payload.
pub fn decode_gossip<T: SszRead>(data: &[u8]) -> Result<T> {
    Ok(T::from_ssz(decompress(data)?)?)
}
