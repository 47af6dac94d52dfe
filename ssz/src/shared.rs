use core::ops::Range;

use crate::{
    consts::{Offset, BYTES_PER_LENGTH_OFFSET},
    error::{ReadError, WriteError},
};

/// Reads the length offset stored at `position`.
pub fn read_offset(bytes: &[u8], position: usize) -> Result<usize, ReadError> {
    let encoded = subslice(bytes, position..position + BYTES_PER_LENGTH_OFFSET)?;
    let mut buffer = [0; BYTES_PER_LENGTH_OFFSET];
    buffer.copy_from_slice(encoded);

    let offset = Offset::from_le_bytes(buffer) as usize;

    if offset > bytes.len() {
        return Err(ReadError::OffsetInvalid {
            offset,
            position,
            length: bytes.len(),
        });
    }

    Ok(offset)
}

/// Appends `offset` to `bytes` in its wire encoding.
pub fn write_offset(bytes: &mut Vec<u8>, offset: usize) -> Result<(), WriteError> {
    let offset = Offset::try_from(offset).map_err(|_| WriteError::OffsetTooLarge { offset })?;
    bytes.extend_from_slice(&offset.to_le_bytes());
    Ok(())
}

pub fn subslice(bytes: &[u8], range: Range<usize>) -> Result<&[u8], ReadError> {
    let needed = range.end;
    bytes.get(range).ok_or(ReadError::InputTooShort {
        needed,
        length: bytes.len(),
    })
}
