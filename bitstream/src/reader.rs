//! Bit-level reader with bounded operations.

use crate::error::{BitError, BitResult};

/// Widest single field a reader or writer handles.
pub const MAX_FIELD_BITS: u8 = 64;

/// A bit-level reader for decoding bitfield groups.
///
/// Bits are consumed most-significant first and fields may straddle byte
/// boundaries. The cursor only ever moves forward. All reads are
/// bounds-checked; the reader never panics on malformed input.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new `BitReader` positioned at the first bit of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Creates a reader positioned at the first bit of `data[offset]`.
    ///
    /// An offset past the end yields an empty reader.
    #[must_use]
    pub const fn at(data: &'a [u8], offset: usize) -> Self {
        Self {
            data,
            bit_pos: offset.saturating_mul(8),
        }
    }

    /// Returns the number of bits remaining to read.
    #[must_use]
    pub const fn bits_remaining(&self) -> usize {
        self.data
            .len()
            .saturating_mul(8)
            .saturating_sub(self.bit_pos)
    }

    /// Returns `true` if there are no more bits to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits_remaining() == 0
    }

    /// Returns the absolute bit position.
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.bit_pos
    }

    /// Returns the cursor as `(byte index, bit index)`, bit index 0 being the MSB.
    #[must_use]
    pub const fn cursor(&self) -> (usize, u8) {
        (self.bit_pos / 8, (self.bit_pos % 8) as u8)
    }

    /// Returns `true` if the cursor sits on a byte boundary.
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.bit_pos % 8 == 0
    }

    /// Reads a single bit as a boolean.
    pub fn read_bit(&mut self) -> BitResult<bool> {
        if self.bits_remaining() == 0 {
            return Err(BitError::UnexpectedEof {
                requested: 1,
                available: 0,
            });
        }
        let (byte_idx, bit_idx) = self.cursor();
        let bit = (self.data[byte_idx] >> (7 - bit_idx)) & 1;
        self.bit_pos += 1;
        Ok(bit == 1)
    }

    /// Reads up to 64 bits as an unsigned integer, MSB first.
    pub fn read_bits(&mut self, bits: u8) -> BitResult<u64> {
        if bits > MAX_FIELD_BITS {
            return Err(BitError::InvalidBitCount {
                bits,
                max_bits: MAX_FIELD_BITS,
            });
        }
        if bits == 0 {
            return Ok(0);
        }
        if bits as usize > self.bits_remaining() {
            return Err(BitError::UnexpectedEof {
                requested: bits as usize,
                available: self.bits_remaining(),
            });
        }

        let mut value = 0u64;
        for _ in 0..bits {
            value = (value << 1) | u64::from(self.read_bit()?);
        }
        Ok(value)
    }

    /// Reads one value per entry of `widths`, in order.
    ///
    /// The whole group is bounds-checked up front so a short buffer fails
    /// before any bit is consumed.
    pub fn read_group(&mut self, widths: &[u8]) -> BitResult<Vec<u64>> {
        let total: usize = widths.iter().map(|&w| usize::from(w)).sum();
        if total > self.bits_remaining() {
            return Err(BitError::UnexpectedEof {
                requested: total,
                available: self.bits_remaining(),
            });
        }
        widths.iter().map(|&w| self.read_bits(w)).collect()
    }
}

/// Decodes a byte-aligned bit group starting at `data[offset]`.
///
/// Returns the decoded values and the number of bytes the group occupies.
pub fn unpack_group(data: &[u8], offset: usize, widths: &[u8]) -> BitResult<(Vec<u64>, usize)> {
    let total: usize = widths.iter().map(|&w| usize::from(w)).sum();
    if total % 8 != 0 {
        return Err(BitError::Unaligned {
            bits_written: total,
        });
    }
    let mut reader = BitReader::at(data, offset);
    let values = reader.read_group(widths)?;
    Ok((values, total / 8))
}
