use ethereum_types::H256;
use typenum::{U1, U4};

use crate::{
    error::ReadError,
    porcelain::{SszHash, SszRead, SszSize, SszWrite},
    size::Size,
};

impl SszSize for u64 {
    const SIZE: Size = Size::Fixed {
        size: core::mem::size_of::<Self>(),
    };
}

impl SszRead for u64 {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let mut buffer = [0; core::mem::size_of::<Self>()];
        buffer.copy_from_slice(bytes);
        Ok(Self::from_le_bytes(buffer))
    }
}

impl SszWrite for u64 {
    fn write_fixed(&self, bytes: &mut [u8]) {
        bytes.copy_from_slice(&self.to_le_bytes());
    }
}

impl SszHash for u64 {
    type PackingFactor = U4;

    fn hash_tree_root(&self) -> H256 {
        let mut chunk = H256::zero();
        chunk.as_bytes_mut()[..core::mem::size_of::<Self>()]
            .copy_from_slice(&self.to_le_bytes());
        chunk
    }
}

impl SszSize for H256 {
    const SIZE: Size = Size::Fixed {
        size: Self::len_bytes(),
    };
}

impl SszRead for H256 {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Ok(Self::from_slice(bytes))
    }
}

impl SszWrite for H256 {
    fn write_fixed(&self, bytes: &mut [u8]) {
        bytes.copy_from_slice(self.as_bytes());
    }
}

impl SszHash for H256 {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_round_trip() {
        let encoding = 0x0807_0605_0403_0201_u64.to_ssz().expect("fixed size");
        assert_eq!(encoding, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(u64::from_ssz(&encoding), Ok(0x0807_0605_0403_0201));
    }

    #[test]
    fn u64_rejects_wrong_length() {
        assert_eq!(
            u64::from_ssz([0; 7]),
            Err(ReadError::FixedSizeMismatch {
                expected: 8,
                actual: 7,
            }),
        );
    }

    #[test]
    fn h256_hashes_to_itself() {
        let root = H256::repeat_byte(0x5a);
        assert_eq!(root.hash_tree_root(), root);
    }
}
