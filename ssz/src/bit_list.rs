use core::{fmt::Debug, marker::PhantomData};

use ethereum_types::H256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use typenum::{Unsigned, U1};

use crate::{
    consts::BITS_PER_CHUNK,
    error::{IndexError, PushError, ReadError, WriteError},
    merkle_tree::{depth_for, merkleize_chunks, mix_in_length, pack_bytes},
    porcelain::{SszHash, SszRead, SszSize, SszWrite},
    size::Size,
};

const BITS_PER_BYTE: usize = 8;

/// An SSZ `Bitlist[N]`. The wire encoding carries a delimiter bit one past
/// the highest index; the in-memory form does not.
pub struct BitList<N> {
    bits: Vec<bool>,
    phantom: PhantomData<N>,
}

impl<N> Default for BitList<N> {
    fn default() -> Self {
        Self {
            bits: Vec::new(),
            phantom: PhantomData,
        }
    }
}

impl<N> Clone for BitList<N> {
    fn clone(&self) -> Self {
        Self {
            bits: self.bits.clone(),
            phantom: PhantomData,
        }
    }
}

impl<N> PartialEq for BitList<N> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<N> Eq for BitList<N> {}

impl<N> Debug for BitList<N> {
    fn fmt(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.bits.fmt(formatter)
    }
}

impl<N: Unsigned> BitList<N> {
    pub fn new(bits: Vec<bool>) -> Result<Self, PushError> {
        if bits.len() > N::USIZE {
            return Err(PushError::ListFull { limit: N::USIZE });
        }

        Ok(Self {
            bits,
            phantom: PhantomData,
        })
    }

    /// A list of `length` unset bits.
    pub fn with_length(length: usize) -> Result<Self, PushError> {
        Self::new(vec![false; length])
    }

    pub fn push(&mut self, bit: bool) -> Result<(), PushError> {
        if self.bits.len() >= N::USIZE {
            return Err(PushError::ListFull { limit: N::USIZE });
        }

        self.bits.push(bit);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    pub fn set(&mut self, index: usize, value: bool) -> Result<(), IndexError> {
        let length = self.bits.len();

        match self.bits.get_mut(index) {
            Some(bit) => {
                *bit = value;
                Ok(())
            }
            None => Err(IndexError::OutOfBounds { index, length }),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|bit| **bit).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    fn to_packed_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0; self.bits.len().div_ceil(BITS_PER_BYTE)];

        for (index, bit) in self.bits.iter().enumerate() {
            if *bit {
                bytes[index / BITS_PER_BYTE] |= 1 << (index % BITS_PER_BYTE);
            }
        }

        bytes
    }
}

impl<N> Serialize for BitList<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits.serialize(serializer)
    }
}

impl<'de, N: Unsigned> Deserialize<'de> for BitList<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = Vec::deserialize(deserializer)?;
        Self::new(bits).map_err(serde::de::Error::custom)
    }
}

impl<N> SszSize for BitList<N> {
    // The delimiter bit makes even an empty bitlist one byte long.
    const SIZE: Size = Size::Variable { minimum_size: 1 };
}

impl<N: Unsigned> SszRead for BitList<N> {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let Some(last) = bytes.last() else {
            return Err(ReadError::BitListMissingDelimiter);
        };

        if *last == 0 {
            return Err(ReadError::BitListMissingDelimiter);
        }

        let delimiter = BITS_PER_BYTE - 1 - last.leading_zeros() as usize;
        let length = (bytes.len() - 1) * BITS_PER_BYTE + delimiter;

        if length > N::USIZE {
            return Err(ReadError::BitListTooLong {
                limit: N::USIZE,
                actual: length,
            });
        }

        let bits = (0..length)
            .map(|index| bytes[index / BITS_PER_BYTE] & (1 << (index % BITS_PER_BYTE)) != 0)
            .collect();

        Ok(Self {
            bits,
            phantom: PhantomData,
        })
    }
}

impl<N: Unsigned> SszWrite for BitList<N> {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        let length = self.bits.len();
        let start = bytes.len();

        bytes.resize(start + length / BITS_PER_BYTE + 1, 0);

        for (index, bit) in self.bits.iter().enumerate() {
            if *bit {
                bytes[start + index / BITS_PER_BYTE] |= 1 << (index % BITS_PER_BYTE);
            }
        }

        bytes[start + length / BITS_PER_BYTE] |= 1 << (length % BITS_PER_BYTE);

        Ok(())
    }
}

impl<N: Unsigned> SszHash for BitList<N> {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        let chunks = pack_bytes(&self.to_packed_bytes());
        let limit_chunks = N::USIZE.div_ceil(BITS_PER_CHUNK);
        let root = merkleize_chunks(&chunks, depth_for(limit_chunks));

        mix_in_length(root, self.len())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;
    use typenum::{U16, U3};

    use super::*;

    #[test]
    fn empty_bitlist_encodes_to_a_lone_delimiter() {
        let encoding = BitList::<U16>::default().to_ssz().expect("offsets fit");
        assert_eq!(encoding, [0b_0000_0001]);
    }

    #[test_case(vec![]; "empty")]
    #[test_case(vec![true]; "single set bit")]
    #[test_case(vec![false, false, true]; "trailing set bit")]
    #[test_case(vec![true; 8]; "full byte")]
    #[test_case(vec![false; 9]; "nine clear bits")]
    fn round_trip(bits: Vec<bool>) {
        let list = BitList::<U16>::new(bits).expect("within limit");
        let encoding = list.to_ssz().expect("offsets fit");

        assert_eq!(BitList::from_ssz(&encoding), Ok(list));
    }

    #[test]
    fn decoding_rejects_missing_delimiter() {
        assert_eq!(
            BitList::<U16>::from_ssz([0b_0000_0000]),
            Err(ReadError::BitListMissingDelimiter),
        );
    }

    #[test]
    fn decoding_rejects_oversized_bitlists() {
        // 4 bits and the delimiter in the 5th.
        assert_eq!(
            BitList::<U3>::from_ssz([0b_0001_0000]),
            Err(ReadError::BitListTooLong {
                limit: 3,
                actual: 4,
            }),
        );
    }

    #[test]
    fn set_reports_out_of_bounds_indices() {
        let mut list = BitList::<U16>::with_length(2).expect("within limit");

        assert_eq!(list.set(1, true), Ok(()));
        assert_eq!(
            list.set(2, true),
            Err(IndexError::OutOfBounds {
                index: 2,
                length: 2,
            }),
        );
        assert_eq!(list.get(1), Some(true));
    }

    #[test]
    fn length_affects_the_root() {
        let shorter = BitList::<U16>::with_length(1).expect("within limit");
        let longer = BitList::<U16>::with_length(2).expect("within limit");

        assert_ne!(shorter.hash_tree_root(), longer.hash_tree_root());
    }
}
