//! Procfields shared by several formats.

use wire::ByteOrder;

use super::{DecodeContext, EncodeContext, Procfield, ProcfieldDecoder, ProcfieldEncoder};
use crate::error::{CodecError, CodecResult};
use crate::value::{Mpi, Value};

/// Largest payload of a single length-prefixed block.
pub const MAX_BLOCK_LEN: usize = u8::MAX as usize;

/// Length-prefixed sub-blocks ending at a zero-length block.
///
/// Decodes to `List<Bytes>`; the terminator is consumed but not returned.
#[must_use]
pub fn data_blocks() -> Procfield {
    Procfield::from_handler(DataBlocks)
}

/// A single length byte followed by that many bytes. Decodes to `Bytes`.
#[must_use]
pub fn pascal_string() -> Procfield {
    Procfield::from_handler(PascalString)
}

/// A 16-bit big-endian bit count followed by `ceil(bits / 8)` magnitude bytes.
#[must_use]
pub fn mpi() -> Procfield {
    Procfield::from_handler(MpiField)
}

#[derive(Debug, Clone, Copy)]
struct DataBlocks;

impl ProcfieldDecoder for DataBlocks {
    fn decode(&self, cx: &DecodeContext<'_>) -> CodecResult<(Value, usize)> {
        let mut blocks = Vec::new();
        let mut used = 0;
        loop {
            let len = usize::from(cx.read_u8(used)?);
            used += 1;
            if len == 0 {
                break;
            }
            blocks.push(Value::Bytes(cx.bytes(used, len)?.to_vec()));
            used += len;
        }
        Ok((Value::List(blocks), used))
    }
}

impl ProcfieldEncoder for DataBlocks {
    fn encode(&self, cx: &EncodeContext<'_>, out: &mut Vec<u8>) -> CodecResult<()> {
        let blocks = cx.value().as_list().ok_or_else(|| cx.mismatch("list"))?;
        for block in blocks {
            let bytes = block.as_bytes().ok_or_else(|| {
                CodecError::TypeMismatch {
                    field: cx.name(),
                    expected: "bytes",
                    found: block.kind_name(),
                }
            })?;
            if bytes.is_empty() || bytes.len() > MAX_BLOCK_LEN {
                return Err(CodecError::invalid_data(format!(
                    "{}: data block of {} bytes, must be 1..={MAX_BLOCK_LEN}",
                    cx.name(),
                    bytes.len()
                )));
            }
            out.push(bytes.len() as u8);
            out.extend_from_slice(bytes);
        }
        out.push(0);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct PascalString;

impl ProcfieldDecoder for PascalString {
    fn decode(&self, cx: &DecodeContext<'_>) -> CodecResult<(Value, usize)> {
        let len = usize::from(cx.read_u8(0)?);
        let bytes = cx.bytes(1, len)?;
        Ok((Value::Bytes(bytes.to_vec()), 1 + len))
    }
}

impl ProcfieldEncoder for PascalString {
    fn encode(&self, cx: &EncodeContext<'_>, out: &mut Vec<u8>) -> CodecResult<()> {
        let bytes = cx.value().as_bytes().ok_or_else(|| cx.mismatch("bytes"))?;
        if bytes.len() > MAX_BLOCK_LEN {
            return Err(CodecError::invalid_data(format!(
                "{}: string of {} bytes exceeds {MAX_BLOCK_LEN}",
                cx.name(),
                bytes.len()
            )));
        }
        out.push(bytes.len() as u8);
        out.extend_from_slice(bytes);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct MpiField;

impl ProcfieldDecoder for MpiField {
    fn decode(&self, cx: &DecodeContext<'_>) -> CodecResult<(Value, usize)> {
        let header = cx.bytes(0, 2)?;
        let bits = ByteOrder::Big.decode_u16([header[0], header[1]]);
        let len = Mpi::byte_len_for(bits);
        let magnitude = cx.bytes(2, len)?.to_vec();
        Ok((Value::Mpi(Mpi::new(bits, magnitude)?), 2 + len))
    }
}

impl ProcfieldEncoder for MpiField {
    fn encode(&self, cx: &EncodeContext<'_>, out: &mut Vec<u8>) -> CodecResult<()> {
        let mpi = cx.value().as_mpi().ok_or_else(|| cx.mismatch("mpi"))?;
        out.extend_from_slice(&ByteOrder::Big.encode_u16(mpi.bits()));
        out.extend_from_slice(mpi.magnitude());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn decode(procfield: &Procfield, data: &[u8], offset: usize) -> CodecResult<(Value, usize)> {
        let cx = DecodeContext::new(data, offset, &[], &[], ByteOrder::Little);
        procfield.decode(&cx)
    }

    fn encode(procfield: &Procfield, value: &Value) -> CodecResult<Vec<u8>> {
        let values = [value];
        let cx = EncodeContext::new(value, 0, &values, &[], ByteOrder::Little);
        let mut out = Vec::new();
        procfield.encode("test", &cx, &mut out)?;
        Ok(out)
    }

    #[test]
    fn data_blocks_decode() {
        let data = [0xAA, 2, 1, 2, 1, 3, 0, 0xFF];
        let (value, used) = decode(&data_blocks(), &data, 1).unwrap();
        assert_eq!(used, 6);
        assert_eq!(
            value,
            Value::List(vec![Value::Bytes(vec![1, 2]), Value::Bytes(vec![3])])
        );
    }

    #[test]
    fn data_blocks_empty_consumes_terminator() {
        let (value, used) = decode(&data_blocks(), &[0x00], 0).unwrap();
        assert_eq!(value, Value::List(Vec::new()));
        assert_eq!(used, 1);
    }

    #[test]
    fn data_blocks_truncated() {
        let err = decode(&data_blocks(), &[3, 1, 2], 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);
        // Missing terminator.
        let err = decode(&data_blocks(), &[1, 9], 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);
    }

    #[test]
    fn data_blocks_encode() {
        let value = Value::List(vec![Value::Bytes(vec![1, 2]), Value::Bytes(vec![3])]);
        assert_eq!(encode(&data_blocks(), &value).unwrap(), [2, 1, 2, 1, 3, 0]);
        assert_eq!(encode(&data_blocks(), &Value::List(Vec::new())).unwrap(), [0]);
    }

    #[test]
    fn data_blocks_encode_rejects_bad_blocks() {
        let empty = Value::List(vec![Value::Bytes(Vec::new())]);
        assert_eq!(
            encode(&data_blocks(), &empty).unwrap_err().kind(),
            ErrorKind::DataValidation
        );
        let big = Value::List(vec![Value::Bytes(vec![0; 256])]);
        assert_eq!(
            encode(&data_blocks(), &big).unwrap_err().kind(),
            ErrorKind::DataValidation
        );
        let wrong = Value::List(vec![Value::UInt(1)]);
        assert_eq!(
            encode(&data_blocks(), &wrong).unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
    }

    #[test]
    fn pascal_string_roundtrip() {
        let (value, used) = decode(&pascal_string(), b"\x05alice!", 0).unwrap();
        assert_eq!(value, Value::Bytes(b"alice".to_vec()));
        assert_eq!(used, 6);
        assert_eq!(encode(&pascal_string(), &value).unwrap(), b"\x05alice");
    }

    #[test]
    fn mpi_reads_big_endian_bit_count() {
        // 9 bits -> 2 magnitude bytes, regardless of the format's byte order.
        let (value, used) = decode(&mpi(), &[0x00, 0x09, 0x01, 0xFF], 0).unwrap();
        assert_eq!(used, 4);
        let mpi_value = value.as_mpi().unwrap();
        assert_eq!(mpi_value.bits(), 9);
        assert_eq!(mpi_value.to_u128(), Some(0x1FF));
        assert_eq!(encode(&mpi(), &value).unwrap(), [0x00, 0x09, 0x01, 0xFF]);
    }

    #[test]
    fn mpi_truncated_magnitude() {
        let err = decode(&mpi(), &[0x00, 0x10, 0x01], 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);
    }
}
