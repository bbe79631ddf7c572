//! Sequential reader over an immutable byte buffer.

use crate::FormatError;

/// Big-endian byte cursor.
///
/// Every read advances the position. Reads that run past the end fail
/// with [`FormatError::UnexpectedEof`] and leave the position unchanged,
/// except [`ByteCursor::read_up_to`], which returns whatever is left.
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16_be(&mut self) -> Result<u16, FormatError> {
        let [hi, lo] = self.read_array()?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    /// Read exactly `count` bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], FormatError> {
        if count > self.remaining() {
            return Err(FormatError::UnexpectedEof {
                offset: self.pos,
                wanted: count,
            });
        }
        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    /// Read exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read at most `count` bytes, stopping at the end of the buffer.
    pub fn read_up_to(&mut self, count: usize) -> &'a [u8] {
        let count = count.min(self.remaining());
        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        bytes
    }
}
