//! Fixed-width unsigned scalar reads and writes.
//!
//! Reads take an absolute offset into an immutable buffer; writes append to
//! an output vector. 8-bit scalars ignore byte order.

use crate::error::{DecodeError, EncodeError, WireResult};
use crate::ByteOrder;

/// Borrows `len` bytes starting at `offset`.
pub fn read_bytes(data: &[u8], offset: usize, len: usize) -> WireResult<&[u8]> {
    let available = data.len().saturating_sub(offset);
    if offset > data.len() || len > available {
        return Err(DecodeError::Truncated {
            offset,
            needed: len,
            available,
        });
    }
    Ok(&data[offset..offset + len])
}

fn read_array<const N: usize>(data: &[u8], offset: usize) -> WireResult<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(read_bytes(data, offset, N)?);
    Ok(out)
}

pub fn read_u8(data: &[u8], offset: usize) -> WireResult<u8> {
    let [byte] = read_array::<1>(data, offset)?;
    Ok(byte)
}

pub fn read_u16(data: &[u8], offset: usize, order: ByteOrder) -> WireResult<u16> {
    read_array::<2>(data, offset).map(|bytes| order.decode_u16(bytes))
}

pub fn read_u32(data: &[u8], offset: usize, order: ByteOrder) -> WireResult<u32> {
    read_array::<4>(data, offset).map(|bytes| order.decode_u32(bytes))
}

pub fn write_u8(out: &mut Vec<u8>, value: u64) -> Result<(), EncodeError> {
    let byte = u8::try_from(value).map_err(|_| EncodeError::ValueOutOfRange { value, width: 1 })?;
    out.push(byte);
    Ok(())
}

pub fn write_u16(out: &mut Vec<u8>, value: u64, order: ByteOrder) -> Result<(), EncodeError> {
    let word =
        u16::try_from(value).map_err(|_| EncodeError::ValueOutOfRange { value, width: 2 })?;
    out.extend_from_slice(&order.encode_u16(word));
    Ok(())
}

pub fn write_u32(out: &mut Vec<u8>, value: u64, order: ByteOrder) -> Result<(), EncodeError> {
    let long =
        u32::try_from(value).map_err(|_| EncodeError::ValueOutOfRange { value, width: 4 })?;
    out.extend_from_slice(&order.encode_u32(long));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_bytes_in_bounds() {
        let data = [1, 2, 3, 4];
        assert_eq!(read_bytes(&data, 1, 2).unwrap(), &[2, 3]);
        assert_eq!(read_bytes(&data, 4, 0).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn read_bytes_truncated() {
        let err = read_bytes(&[1, 2, 3], 2, 4).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                offset: 2,
                needed: 4,
                available: 1
            }
        );
    }

    #[test]
    fn read_past_end_reports_zero_available() {
        let err = read_u8(&[1], 5).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { available: 0, .. }));
    }

    #[test]
    fn read_words_at_offset() {
        let data = [0xFF, 0x34, 0x12];
        assert_eq!(read_u16(&data, 1, ByteOrder::Little).unwrap(), 0x1234);
        assert_eq!(read_u16(&data, 1, ByteOrder::Big).unwrap(), 0x3412);
    }

    #[test]
    fn read_longs() {
        let data = [0x78, 0x56, 0x34, 0x12];
        assert_eq!(read_u32(&data, 0, ByteOrder::Little).unwrap(), 0x1234_5678);
        assert_eq!(read_u32(&data, 0, ByteOrder::Big).unwrap(), 0x7856_3412);
    }

    #[test]
    fn write_scalars() {
        let mut out = Vec::new();
        write_u8(&mut out, 0xAB).unwrap();
        write_u16(&mut out, 0x1234, ByteOrder::Big).unwrap();
        write_u32(&mut out, 0x1234_5678, ByteOrder::Little).unwrap();
        assert_eq!(out, vec![0xAB, 0x12, 0x34, 0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn write_rejects_oversized_values() {
        let mut out = Vec::new();
        assert_eq!(
            write_u8(&mut out, 256).unwrap_err(),
            EncodeError::ValueOutOfRange {
                value: 256,
                width: 1
            }
        );
        assert!(write_u16(&mut out, 0x1_0000, ByteOrder::Little).is_err());
        assert!(write_u32(&mut out, 0x1_0000_0000, ByteOrder::Big).is_err());
        assert!(out.is_empty());
    }
}
