//! Bounds-checked cursor over a borrowed byte slice.
//!
//! Every fixed-size read in the codecs goes through [`ByteReader`], so a short
//! buffer surfaces as [`ProtocolError::TruncatedInput`] instead of a panic.

use crate::error::{ProtocolError, Result};

#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    off: usize,
}

impl<'a> ByteReader<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, off: 0 }
    }

    /// Start reading at `offset`. An offset past the end leaves nothing to read.
    #[must_use]
    pub fn at(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, off: offset }
    }

    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.off)
    }

    /// Number of bytes consumed so far.
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.off
    }

    #[inline]
    fn ensure(&self, len: usize) -> Result<()> {
        if self.remaining() < len {
            return Err(ProtocolError::TruncatedInput {
                needed: self.off.saturating_add(len),
                available: self.buf.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let b = self.buf[self.off];
        self.off += 1;
        Ok(b)
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read a 3-byte big-endian length.
    pub fn read_u24_be(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(3)?;
        Ok(u32::from(bytes[0]) << 16 | u32::from(bytes[1]) << 8 | u32::from(bytes[2]))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let start = self.off;
        self.off += len;
        Ok(&self.buf[start..start + len])
    }

    /// Consume everything left in the buffer.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let start = self.off.min(self.buf.len());
        self.off = self.buf.len();
        &self.buf[start..]
    }
}
