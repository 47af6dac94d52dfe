use core::{fmt::Debug, marker::PhantomData};

use ethereum_types::H256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use typenum::{Unsigned, U1};

use crate::{
    consts::BYTES_PER_LENGTH_OFFSET,
    error::{PushError, ReadError, WriteError},
    merkle_tree::{depth_for, merkleize_chunks, mix_in_length},
    porcelain::{SszHash, SszRead, SszSize, SszWrite},
    shared::{read_offset, subslice, write_offset},
    size::Size,
};

/// An SSZ `List[T, N]` backed by a `Vec`.
pub struct ContiguousList<T, N> {
    elements: Vec<T>,
    phantom: PhantomData<N>,
}

impl<T, N> Default for ContiguousList<T, N> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            phantom: PhantomData,
        }
    }
}

impl<T: Clone, N> Clone for ContiguousList<T, N> {
    fn clone(&self) -> Self {
        Self {
            elements: self.elements.clone(),
            phantom: PhantomData,
        }
    }
}

impl<T: PartialEq, N> PartialEq for ContiguousList<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl<T: Eq, N> Eq for ContiguousList<T, N> {}

impl<T: Debug, N> Debug for ContiguousList<T, N> {
    fn fmt(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.elements.fmt(formatter)
    }
}

impl<T, N: Unsigned> ContiguousList<T, N> {
    pub fn new(elements: Vec<T>) -> Result<Self, PushError> {
        if elements.len() > N::USIZE {
            return Err(PushError::ListFull { limit: N::USIZE });
        }

        Ok(Self {
            elements,
            phantom: PhantomData,
        })
    }

    pub fn push(&mut self, element: T) -> Result<(), PushError> {
        if self.elements.len() >= N::USIZE {
            return Err(PushError::ListFull { limit: N::USIZE });
        }

        self.elements.push(element);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    pub fn iter(&self) -> core::slice::Iter<T> {
        self.elements.iter()
    }

    #[must_use]
    pub const fn limit() -> usize {
        N::USIZE
    }
}

impl<'list, T, N> IntoIterator for &'list ContiguousList<T, N> {
    type Item = &'list T;
    type IntoIter = core::slice::Iter<'list, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<T: Serialize, N> Serialize for ContiguousList<T, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.elements.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>, N: Unsigned> Deserialize<'de> for ContiguousList<T, N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let elements = Vec::deserialize(deserializer)?;
        Self::new(elements).map_err(serde::de::Error::custom)
    }
}

impl<T, N> SszSize for ContiguousList<T, N> {
    const SIZE: Size = Size::Variable { minimum_size: 0 };
}

impl<T: SszRead, N: Unsigned> SszRead for ContiguousList<T, N> {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }

        let elements = match T::SIZE {
            Size::Fixed { size } => {
                if bytes.len() % size != 0 {
                    return Err(ReadError::ElementSizeMismatch {
                        length: bytes.len(),
                        element_size: size,
                    });
                }

                let count = bytes.len() / size;

                if count > N::USIZE {
                    return Err(ReadError::ListTooLong {
                        limit: N::USIZE,
                        actual: count,
                    });
                }

                bytes
                    .chunks_exact(size)
                    .map(T::from_ssz_unchecked)
                    .collect::<Result<_, _>>()?
            }
            Size::Variable { .. } => {
                let first_offset = read_offset(bytes, 0)?;

                if first_offset % BYTES_PER_LENGTH_OFFSET != 0 || first_offset == 0 {
                    return Err(ReadError::OffsetInvalid {
                        offset: first_offset,
                        position: 0,
                        length: bytes.len(),
                    });
                }

                let count = first_offset / BYTES_PER_LENGTH_OFFSET;

                if count > N::USIZE {
                    return Err(ReadError::ListTooLong {
                        limit: N::USIZE,
                        actual: count,
                    });
                }

                let mut elements = Vec::with_capacity(count);
                let mut start = first_offset;

                for index in 1..=count {
                    let end = if index < count {
                        read_offset(bytes, index * BYTES_PER_LENGTH_OFFSET)?
                    } else {
                        bytes.len()
                    };

                    if end < start {
                        return Err(ReadError::OffsetsNotIncreasing {
                            previous: start,
                            next: end,
                        });
                    }

                    elements.push(T::from_ssz(subslice(bytes, start..end)?)?);
                    start = end;
                }

                elements
            }
        };

        Ok(Self {
            elements,
            phantom: PhantomData,
        })
    }
}

impl<T: SszWrite, N: Unsigned> SszWrite for ContiguousList<T, N> {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        match T::SIZE {
            Size::Fixed { size } => {
                for element in self {
                    let start = bytes.len();
                    bytes.resize(start + size, 0);
                    element.write_fixed(&mut bytes[start..]);
                }
            }
            Size::Variable { .. } => {
                let parts = self
                    .iter()
                    .map(SszWrite::to_ssz)
                    .collect::<Result<Vec<_>, _>>()?;

                let mut offset = self.len() * BYTES_PER_LENGTH_OFFSET;

                for part in &parts {
                    write_offset(bytes, offset)?;
                    offset += part.len();
                }

                for part in parts {
                    bytes.extend_from_slice(&part);
                }
            }
        }

        Ok(())
    }
}

impl<T: SszHash<PackingFactor = U1>, N: Unsigned> SszHash for ContiguousList<T, N> {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        let chunks = self
            .iter()
            .map(SszHash::hash_tree_root)
            .collect::<Vec<_>>();

        let root = merkleize_chunks(&chunks, depth_for(N::USIZE));

        mix_in_length(root, self.len())
    }
}
