//! MSB-first bit cursor over an immutable byte slice.
//!
//! SCTE-35 fields are rarely byte-aligned (a 33-bit PTS follows a single flag
//! bit and six reserved bits), so every decoder in this crate reads through a
//! [`BitReader`] instead of indexing bytes directly. All reads are bounds
//! checked: running past the end of the buffer yields
//! [`Scte35Error::BufferUnderrun`] and leaves the cursor where it was.

use bytes::Bytes;

use crate::{Result, Scte35Error};

/// Bit-level reader over a borrowed byte buffer.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Cursor position in bits from the start of `data`.
    position: usize,
}

impl<'a> BitReader<'a> {
    /// Create a reader positioned at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        BitReader { data, position: 0 }
    }

    /// Number of bits consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of bits left between the cursor and the end of the buffer.
    pub fn remaining_bits(&self) -> usize {
        self.data.len() * 8 - self.position
    }

    fn ensure(&self, bits: usize) -> Result<()> {
        let remaining = self.remaining_bits();
        if bits > remaining {
            return Err(Scte35Error::BufferUnderrun {
                requested: bits,
                remaining,
            });
        }
        Ok(())
    }

    /// Read `bits` (1..=64) as an unsigned, most-significant-bit-first integer.
    pub fn read_unsigned(&mut self, bits: u32) -> Result<u64> {
        if bits == 0 || bits > 64 {
            return Err(Scte35Error::InvalidBitWidth(bits));
        }
        self.ensure(bits as usize)?;

        let mut value: u64 = 0;
        let mut left = bits as usize;
        while left > 0 {
            let byte = self.data[self.position / 8];
            let available = 8 - self.position % 8;
            let take = available.min(left);
            let chunk = (byte >> (available - take)) & (0xFF >> (8 - take));
            value = (value << take) | u64::from(chunk);
            self.position += take;
            left -= take;
        }
        Ok(value)
    }

    /// Read a single bit as a flag.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_unsigned(1)? != 0)
    }

    /// Read up to 8 bits.
    pub fn read_u8(&mut self, bits: u32) -> Result<u8> {
        debug_assert!(bits <= 8);
        Ok(self.read_unsigned(bits)? as u8)
    }

    /// Read up to 16 bits.
    pub fn read_u16(&mut self, bits: u32) -> Result<u16> {
        debug_assert!(bits <= 16);
        Ok(self.read_unsigned(bits)? as u16)
    }

    /// Read up to 32 bits.
    pub fn read_u32(&mut self, bits: u32) -> Result<u32> {
        debug_assert!(bits <= 32);
        Ok(self.read_unsigned(bits)? as u32)
    }

    /// Advance the cursor by `bits` without materialising a value.
    pub fn skip(&mut self, bits: usize) -> Result<()> {
        self.ensure(bits)?;
        self.position += bits;
        Ok(())
    }

    /// Read `N` whole bytes into a fixed array (identifiers, ISO codes).
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure(N * 8)?;
        let mut out = [0u8; N];
        for byte in out.iter_mut() {
            *byte = self.read_u8(8)?;
        }
        Ok(out)
    }

    /// Read `len` bytes into an owned buffer.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.ensure(len * 8)?;
        if self.position % 8 == 0 {
            let start = self.position / 8;
            self.position += len * 8;
            return Ok(Bytes::copy_from_slice(&self.data[start..start + len]));
        }

        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.read_u8(8)?);
        }
        Ok(Bytes::from(out))
    }
}
