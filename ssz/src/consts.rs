pub type Offset = u32;

pub const BYTES_PER_LENGTH_OFFSET: usize = core::mem::size_of::<Offset>();
pub const BYTES_PER_CHUNK: usize = 32;
pub const BITS_PER_CHUNK: usize = BYTES_PER_CHUNK * 8;
