use core::{fmt::Debug, marker::PhantomData};

use ethereum_types::H256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use typenum::{Unsigned, U1};

use crate::{
    consts::BYTES_PER_CHUNK,
    error::{PushError, ReadError, WriteError},
    merkle_tree::{depth_for, merkleize_chunks, mix_in_length, pack_bytes},
    porcelain::{SszHash, SszRead, SszSize, SszWrite},
    size::Size,
};

/// An SSZ `List[uint8, N]`. Kept separate from [`ContiguousList`] because
/// bytes pack 32 to a Merkle chunk.
///
/// [`ContiguousList`]: crate::ContiguousList
pub struct ByteList<N> {
    bytes: Vec<u8>,
    phantom: PhantomData<N>,
}

impl<N> Default for ByteList<N> {
    fn default() -> Self {
        Self {
            bytes: Vec::new(),
            phantom: PhantomData,
        }
    }
}

impl<N> Clone for ByteList<N> {
    fn clone(&self) -> Self {
        Self {
            bytes: self.bytes.clone(),
            phantom: PhantomData,
        }
    }
}

impl<N> PartialEq for ByteList<N> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl<N> Eq for ByteList<N> {}

impl<N> Debug for ByteList<N> {
    fn fmt(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(formatter, "0x{}", hex::encode(&self.bytes))
    }
}

impl<N: Unsigned> ByteList<N> {
    pub fn new(bytes: Vec<u8>) -> Result<Self, PushError> {
        if bytes.len() > N::USIZE {
            return Err(PushError::ListFull { limit: N::USIZE });
        }

        Ok(Self {
            bytes,
            phantom: PhantomData,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl<N> Serialize for ByteList<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(&self.bytes)))
    }
}

impl<'de, N: Unsigned> Deserialize<'de> for ByteList<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        let digits = string.strip_prefix("0x").unwrap_or(&string);
        let bytes = hex::decode(digits).map_err(serde::de::Error::custom)?;
        Self::new(bytes).map_err(serde::de::Error::custom)
    }
}

impl<N> SszSize for ByteList<N> {
    const SIZE: Size = Size::Variable { minimum_size: 0 };
}

impl<N: Unsigned> SszRead for ByteList<N> {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        if bytes.len() > N::USIZE {
            return Err(ReadError::ListTooLong {
                limit: N::USIZE,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            bytes: bytes.to_vec(),
            phantom: PhantomData,
        })
    }
}

impl<N> SszWrite for ByteList<N> {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        bytes.extend_from_slice(&self.bytes);
        Ok(())
    }
}

impl<N: Unsigned> SszHash for ByteList<N> {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        let chunks = pack_bytes(&self.bytes);
        let limit_chunks = N::USIZE.div_ceil(BYTES_PER_CHUNK);
        let root = merkleize_chunks(&chunks, depth_for(limit_chunks));

        mix_in_length(root, self.len())
    }
}
