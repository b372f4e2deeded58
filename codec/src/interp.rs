//! Format interpreter: runs a parsed [`Format`] against bytes or values.
//!
//! Decoding produces exactly one value per slot: one per scalar, one list
//! per repetition, one integer per bitfield width and one value per
//! procfield. Encoding consumes values with the same accounting, so the
//! output of [`unpack`] is always valid input to [`pack`].

use schema::{BitGroup, Format, Op, Scalar};
use wire::ByteOrder;

use crate::error::{CodecError, CodecResult};
use crate::procfield::{slot_label, DecodeContext, EncodeContext, ProcfieldTable};
use crate::value::{mismatch, Value};

/// Decodes one record's worth of slots starting at `offset`.
///
/// Returns the slot values and the number of bytes consumed.
pub fn unpack(
    format: &Format,
    data: &[u8],
    offset: usize,
    procfields: &ProcfieldTable,
) -> CodecResult<(Vec<Value>, usize)> {
    decode_slots(format, data, offset, procfields, &[])
}

/// Encodes one value per slot.
///
/// `values.len()` must equal [`Format::slot_count`].
pub fn pack(format: &Format, values: &[Value], procfields: &ProcfieldTable) -> CodecResult<Vec<u8>> {
    let refs: Vec<&Value> = values.iter().collect();
    encode_slots(format, &refs, procfields, &[])
}

pub(crate) fn decode_slots(
    format: &Format,
    data: &[u8],
    offset: usize,
    procfields: &ProcfieldTable,
    names: &[String],
) -> CodecResult<(Vec<Value>, usize)> {
    let order = format.byte_order();
    let mut values = Vec::with_capacity(format.slot_count());
    let mut pos = offset;

    for op in format.ops() {
        match op {
            Op::Scalar(scalar) => {
                values.push(read_scalar(*scalar, data, pos, order)?);
                pos += scalar.size();
            }
            Op::Repeat { count, scalar } => {
                let total = count.saturating_mul(scalar.size());
                // Bounds check before allocating the list.
                wire::read_bytes(data, pos, total)?;
                let items = (0..*count)
                    .map(|i| read_scalar(*scalar, data, pos + i * scalar.size(), order))
                    .collect::<CodecResult<Vec<_>>>()?;
                values.push(Value::List(items));
                pos += total;
            }
            Op::Bits(group) => {
                pos += read_group(group, data, pos, &mut values)?;
            }
            Op::Procfield(name) => {
                let procfield = procfields.require(name)?;
                let cx = DecodeContext::new(data, pos, &values, names, order);
                let (value, used) = procfield.decode(&cx)?;
                let end = pos.checked_add(used).filter(|end| *end <= data.len());
                let Some(end) = end else {
                    return Err(CodecError::Wire(wire::DecodeError::Truncated {
                        offset: pos,
                        needed: used,
                        available: data.len().saturating_sub(pos),
                    }));
                };
                values.push(value);
                pos = end;
            }
        }
    }

    Ok((values, pos - offset))
}

pub(crate) fn encode_slots(
    format: &Format,
    values: &[&Value],
    procfields: &ProcfieldTable,
    names: &[String],
) -> CodecResult<Vec<u8>> {
    let expected = format.slot_count();
    if values.len() != expected {
        return Err(CodecError::SlotCountMismatch {
            expected,
            actual: values.len(),
        });
    }

    let order = format.byte_order();
    let mut out = Vec::with_capacity(format.fixed_size());
    let mut slot = 0;

    for op in format.ops() {
        match op {
            Op::Scalar(scalar) => {
                write_scalar(*scalar, values[slot], &slot_label(names, slot), order, &mut out)?;
                slot += 1;
            }
            Op::Repeat { count, scalar } => {
                let label = slot_label(names, slot);
                let items = values[slot]
                    .as_list()
                    .ok_or_else(|| mismatch(&label, "list", values[slot]))?;
                if items.len() != *count {
                    return Err(CodecError::LengthMismatch {
                        field: label,
                        expected: *count,
                        actual: items.len(),
                    });
                }
                for item in items {
                    write_scalar(*scalar, item, &label, order, &mut out)?;
                }
                slot += 1;
            }
            Op::Bits(group) => {
                let fields = values[slot..slot + group.len()]
                    .iter()
                    .enumerate()
                    .map(|(i, value)| {
                        value
                            .as_uint()
                            .ok_or_else(|| mismatch(&slot_label(names, slot + i), "uint", value))
                    })
                    .collect::<CodecResult<Vec<u64>>>()?;
                out.extend(bitstream::pack_group(&fields, group.widths())?);
                slot += group.len();
            }
            Op::Procfield(name) => {
                let procfield = procfields.require(name)?;
                let cx = EncodeContext::new(values[slot], slot, values, names, order);
                procfield.encode(name, &cx, &mut out)?;
                slot += 1;
            }
        }
    }

    Ok(out)
}

fn read_scalar(scalar: Scalar, data: &[u8], pos: usize, order: ByteOrder) -> CodecResult<Value> {
    let value = match scalar {
        Scalar::Byte => Value::UInt(u64::from(wire::read_u8(data, pos)?)),
        Scalar::Char => Value::Char(wire::read_u8(data, pos)?),
        Scalar::Word => Value::UInt(u64::from(wire::read_u16(data, pos, order)?)),
        Scalar::Long => Value::UInt(u64::from(wire::read_u32(data, pos, order)?)),
    };
    Ok(value)
}

fn read_group(group: &BitGroup, data: &[u8], pos: usize, values: &mut Vec<Value>) -> CodecResult<usize> {
    let (fields, used) = bitstream::unpack_group(data, pos, group.widths())?;
    values.extend(fields.into_iter().map(Value::UInt));
    Ok(used)
}

fn write_scalar(
    scalar: Scalar,
    value: &Value,
    label: &str,
    order: ByteOrder,
    out: &mut Vec<u8>,
) -> CodecResult<()> {
    match (scalar, value) {
        (Scalar::Char, Value::Char(c)) => out.push(*c),
        (Scalar::Char, other) => return Err(mismatch(label, "char", other)),
        (_, Value::UInt(v)) => match scalar {
            Scalar::Word => wire::write_u16(out, *v, order)?,
            Scalar::Long => wire::write_u32(out, *v, order)?,
            _ => wire::write_u8(out, *v)?,
        },
        (_, other) => return Err(mismatch(label, "uint", other)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::procfield::{builtin, Procfield};

    fn fmt(source: &str) -> Format {
        Format::parse(source).unwrap()
    }

    #[test]
    fn unpack_scalars_little_endian() {
        let data = [0x01, b'Z', 0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        let (values, used) = unpack(&fmt("Lbchl"), &data, 0, &ProcfieldTable::new()).unwrap();
        assert_eq!(used, 8);
        assert_eq!(
            values,
            [
                Value::UInt(1),
                Value::Char(b'Z'),
                Value::UInt(0x1234),
                Value::UInt(0x1234_5678)
            ]
        );
    }

    #[test]
    fn unpack_big_endian_word() {
        let (values, _) = unpack(&fmt("Bh"), &[0x12, 0x34], 0, &ProcfieldTable::new()).unwrap();
        assert_eq!(values, [Value::UInt(0x1234)]);
    }

    #[test]
    fn repeat_yields_one_slot() {
        let (values, used) = unpack(&fmt("L3cb"), b"GIF\x07", 0, &ProcfieldTable::new()).unwrap();
        assert_eq!(used, 4);
        assert_eq!(values, [Value::char_list(b"GIF"), Value::UInt(7)]);
    }

    #[test]
    fn zero_repeat_is_empty_list() {
        let (values, used) = unpack(&fmt("L0bb"), &[5], 0, &ProcfieldTable::new()).unwrap();
        assert_eq!(used, 1);
        assert_eq!(values, [Value::List(Vec::new()), Value::UInt(5)]);
    }

    #[test]
    fn bitfields_are_msb_first() {
        let format = fmt("L(1 3 1 3)");
        let (values, used) = unpack(&format, &[0b1101_0011], 0, &ProcfieldTable::new()).unwrap();
        assert_eq!(used, 1);
        assert_eq!(values, [1u64, 5, 0, 3].map(Value::UInt));
        let packed = pack(&format, &values, &ProcfieldTable::new()).unwrap();
        assert_eq!(packed, [0b1101_0011]);
    }

    #[test]
    fn group_after_scalar_reads_from_its_own_byte() {
        let data = [0xFF, 0x12, 0x34, 0xEE];
        let (values, used) = unpack(&fmt("Lb(4 12)"), &data, 0, &ProcfieldTable::new()).unwrap();
        assert_eq!(used, 3);
        assert_eq!(values, [0xFFu64, 0x1, 0x234].map(Value::UInt));

        let (values, used) = unpack(&fmt("L(4 4)"), &data, 3, &ProcfieldTable::new()).unwrap();
        assert_eq!(used, 1);
        assert_eq!(values, [0xEu64, 0xE].map(Value::UInt));

        let err = unpack(&fmt("L(4 12)"), &data, 3, &ProcfieldTable::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);
    }

    #[test]
    fn unpack_at_offset() {
        let (values, used) = unpack(&fmt("Lb"), &[9, 8, 7], 2, &ProcfieldTable::new()).unwrap();
        assert_eq!((values, used), (vec![Value::UInt(7)], 1));
    }

    #[test]
    fn truncated_input() {
        let err = unpack(&fmt("Ll"), &[1, 2, 3], 0, &ProcfieldTable::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);
        let err = unpack(&fmt("L4b"), &[1, 2, 3], 0, &ProcfieldTable::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);
        let err = unpack(&fmt("L(8 8)"), &[1], 0, &ProcfieldTable::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);
    }

    #[test]
    fn unknown_procfield_at_run_time() {
        let err = unpack(&fmt("Lb[gct]"), &[1], 0, &ProcfieldTable::new()).unwrap_err();
        assert_eq!(err, CodecError::UnknownProcfield { name: "gct".into() });
    }

    #[test]
    fn procfield_sees_earlier_slots() {
        let table = ProcfieldTable::new().with(
            "body",
            Procfield::decode_only(|cx: &DecodeContext<'_>| {
                let len = cx.last().and_then(Value::as_uint).unwrap_or(0) as usize;
                Ok((Value::Bytes(cx.bytes(0, len)?.to_vec()), len))
            }),
        );
        let (values, used) = unpack(&fmt("Lb[body]b"), &[2, 0xA, 0xB, 0xC], 0, &table).unwrap();
        assert_eq!(used, 4);
        assert_eq!(
            values,
            [Value::UInt(2), Value::Bytes(vec![0xA, 0xB]), Value::UInt(0xC)]
        );
    }

    #[test]
    fn procfield_overclaiming_length_is_truncation() {
        let table = ProcfieldTable::new().with(
            "liar",
            Procfield::decode_only(|_cx: &DecodeContext<'_>| Ok((Value::Absent, 10))),
        );
        let err = unpack(&fmt("L[liar]"), &[1, 2], 0, &table).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);
    }

    #[test]
    fn pack_overflow_is_bit_width() {
        let table = ProcfieldTable::new();
        let err = pack(&fmt("L(1 3 1 3)"), &[1u64, 8, 0, 0].map(Value::UInt), &table).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BitWidth);
        let err = pack(&fmt("Lb"), &[Value::UInt(256)], &table).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BitWidth);
        let err = pack(&fmt("Lh"), &[Value::UInt(0x1_0000)], &table).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BitWidth);
    }

    #[test]
    fn pack_type_and_count_checks() {
        let table = ProcfieldTable::new();
        let err = pack(&fmt("Lc"), &[Value::UInt(1)], &table).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(err.to_string().contains("slot 0"));

        let err = pack(&fmt("L3c"), &[Value::char_list(b"GI")], &table).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);

        let err = pack(&fmt("Lbb"), &[Value::UInt(1)], &table).unwrap_err();
        assert_eq!(
            err,
            CodecError::SlotCountMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn pack_mixed_roundtrip() {
        let format = fmt("B2h(4 4)c[s]l");
        let table = ProcfieldTable::new().with("s", builtin::pascal_string());
        let values = vec![
            Value::List(vec![Value::UInt(0xBEEF), Value::UInt(1)]),
            Value::UInt(0xA),
            Value::UInt(0x5),
            Value::Char(b'!'),
            Value::Bytes(b"hi".to_vec()),
            Value::UInt(0xDEAD_BEEF),
        ];
        let bytes = pack(&format, &values, &table).unwrap();
        assert_eq!(
            bytes,
            [0xBE, 0xEF, 0x00, 0x01, 0xA5, b'!', 2, b'h', b'i', 0xDE, 0xAD, 0xBE, 0xEF]
        );
        let (decoded, used) = unpack(&format, &bytes, 0, &table).unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(decoded, values);
    }
}
