//! Bit-level writer for encoding bitfield groups.

use crate::error::{BitError, BitResult};
use crate::reader::MAX_FIELD_BITS;

/// A bit-level writer for encoding bitfield groups.
///
/// Bits are pushed most-significant first into an accumulator byte which is
/// flushed every time it fills. Unlike a general-purpose bit writer there is
/// no implicit padding: [`finish`](Self::finish) fails unless the total
/// number of bits written is a multiple of 8.
#[derive(Debug, Default)]
pub struct BitWriter {
    /// The completed bytes.
    bytes: Vec<u8>,
    /// Current byte being written (not yet pushed to bytes).
    current_byte: u8,
    /// Number of bits written to `current_byte` (0-7).
    bit_count: u8,
}

impl BitWriter {
    /// Creates a new empty `BitWriter`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `BitWriter` with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            current_byte: 0,
            bit_count: 0,
        }
    }

    /// Returns the number of bits written so far.
    #[must_use]
    pub fn bits_written(&self) -> usize {
        self.bytes.len() * 8 + self.bit_count as usize
    }

    /// Returns `true` if no partial byte is pending.
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.bit_count == 0
    }

    /// Writes a single bit.
    pub fn write_bit(&mut self, value: bool) {
        self.current_byte = (self.current_byte << 1) | u8::from(value);
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.bytes.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// Writes the low `bits` bits of `value`, MSB first.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 64`.
    /// Returns [`BitError::ValueOutOfRange`] if `value` doesn't fit in `bits`;
    /// the value is never truncated.
    pub fn write_bits(&mut self, value: u64, bits: u8) -> BitResult<()> {
        if bits > MAX_FIELD_BITS {
            return Err(BitError::InvalidBitCount {
                bits,
                max_bits: MAX_FIELD_BITS,
            });
        }
        if bits < MAX_FIELD_BITS && value >= (1u64 << bits) {
            return Err(BitError::ValueOutOfRange { value, bits });
        }

        for i in (0..bits).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
        Ok(())
    }

    /// Finishes writing and returns the byte buffer.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::Unaligned`] if a partial byte is pending.
    pub fn finish(self) -> BitResult<Vec<u8>> {
        if self.bit_count > 0 {
            return Err(BitError::Unaligned {
                bits_written: self.bits_written(),
            });
        }
        Ok(self.bytes)
    }
}

/// Encodes `values` into a byte-aligned bit group described by `widths`.
pub fn pack_group(values: &[u64], widths: &[u8]) -> BitResult<Vec<u8>> {
    if values.len() != widths.len() {
        return Err(BitError::WidthCountMismatch {
            widths: widths.len(),
            values: values.len(),
        });
    }
    let total: usize = widths.iter().map(|&w| usize::from(w)).sum();
    let mut writer = BitWriter::with_capacity(total.div_ceil(8));
    for (&value, &width) in values.iter().zip(widths) {
        writer.write_bits(value, width)?;
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_writer() {
        let writer = BitWriter::new();
        assert_eq!(writer.bits_written(), 0);
        assert!(writer.is_aligned());
        let bytes = writer.finish().unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn write_full_byte() {
        let mut writer = BitWriter::new();
        for bit in [true, false, true, false, true, false, true, false] {
            writer.write_bit(bit);
        }
        assert_eq!(writer.bits_written(), 8);
        let bytes = writer.finish().unwrap();
        assert_eq!(bytes, vec![0b1010_1010]);
    }

    #[test]
    fn partial_byte_is_an_error() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b11010, 5).unwrap();
        assert!(!writer.is_aligned());
        let err = writer.finish().unwrap_err();
        assert_eq!(err, BitError::Unaligned { bits_written: 5 });
    }

    #[test]
    fn write_bits_zero_width() {
        let mut writer = BitWriter::new();
        writer.write_bits(0, 0).unwrap();
        assert_eq!(writer.bits_written(), 0);
    }

    #[test]
    fn write_bits_zero_width_rejects_nonzero_value() {
        let mut writer = BitWriter::new();
        let err = writer.write_bits(1, 0).unwrap_err();
        assert_eq!(err, BitError::ValueOutOfRange { value: 1, bits: 0 });
    }

    #[test]
    fn write_bits_multiple_bytes() {
        let mut writer = BitWriter::new();
        writer.write_bits(0xABCD, 16).unwrap();
        assert_eq!(writer.finish().unwrap(), vec![0xAB, 0xCD]);
    }

    #[test]
    fn write_bits_across_byte_boundary() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b1111, 4).unwrap();
        writer.write_bits(0b1010_1010, 8).unwrap();
        writer.write_bits(0, 4).unwrap();
        // 1111 + 10101010 + 0000 = 1111_1010 1010_0000
        assert_eq!(writer.finish().unwrap(), vec![0b1111_1010, 0b1010_0000]);
    }

    #[test]
    fn write_bits_invalid_count() {
        let mut writer = BitWriter::new();
        let result = writer.write_bits(0, 65);
        assert!(matches!(
            result,
            Err(BitError::InvalidBitCount {
                bits: 65,
                max_bits: 64
            })
        ));
    }

    #[test]
    fn write_bits_value_out_of_range() {
        let mut writer = BitWriter::new();
        let result = writer.write_bits(8, 3);
        assert!(matches!(
            result,
            Err(BitError::ValueOutOfRange { value: 8, bits: 3 })
        ));
    }

    #[test]
    fn write_bits_64_bits() {
        let mut writer = BitWriter::new();
        writer.write_bits(u64::MAX, 64).unwrap();
        assert_eq!(writer.finish().unwrap(), vec![0xFF; 8]);
    }

    #[test]
    fn pack_group_single_byte() {
        assert_eq!(pack_group(&[1, 5, 0, 3], &[1, 3, 1, 3]).unwrap(), vec![0b1101_0011]);
    }

    #[test]
    fn pack_group_count_mismatch() {
        let err = pack_group(&[1, 2], &[4, 4, 8]).unwrap_err();
        assert_eq!(err, BitError::WidthCountMismatch { widths: 3, values: 2 });
    }
}
