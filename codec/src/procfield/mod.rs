//! Procfield dispatch.
//!
//! A procfield (`[name]` in a format string) is a slot whose length and
//! shape depend on the data itself. The interpreter hands each procfield a
//! context describing where decoding stands; the procfield returns the value
//! and how many bytes it consumed. Encoding is the mirror image and is
//! optional: a procfield without an encoder makes its oracle decode-only.

pub mod builtin;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use wire::ByteOrder;

use crate::error::{CodecError, CodecResult};
use crate::value::{mismatch, Record, Value};

/// Read-only view handed to a procfield decoder.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    data: &'a [u8],
    offset: usize,
    decoded: &'a [Value],
    names: &'a [String],
    byte_order: ByteOrder,
}

impl<'a> DecodeContext<'a> {
    /// Creates a context. `names` may be empty when decoding raw slots.
    #[must_use]
    pub const fn new(
        data: &'a [u8],
        offset: usize,
        decoded: &'a [Value],
        names: &'a [String],
        byte_order: ByteOrder,
    ) -> Self {
        Self {
            data,
            offset,
            decoded,
            names,
            byte_order,
        }
    }

    /// The whole input buffer.
    #[must_use]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Absolute offset of this procfield in [`DecodeContext::data`].
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub const fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Values decoded so far, in slot order.
    #[must_use]
    pub const fn decoded(&self) -> &'a [Value] {
        self.decoded
    }

    /// Bytes from the current offset to the end of the buffer.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        self.data.get(self.offset..).unwrap_or_default()
    }

    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&'a Value> {
        self.decoded.get(index)
    }

    /// The most recently decoded value.
    #[must_use]
    pub fn last(&self) -> Option<&'a Value> {
        self.decoded.last()
    }

    /// Looks up an already-decoded field by name.
    pub fn field(&self, name: &str) -> CodecResult<&'a Value> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|index| self.decoded.get(index))
            .ok_or_else(|| CodecError::MissingField {
                field: name.to_string(),
            })
    }

    /// Looks up an already-decoded numeric field by name.
    pub fn uint(&self, name: &str) -> CodecResult<u64> {
        let value = self.field(name)?;
        value.as_uint().ok_or_else(|| mismatch(name, "uint", value))
    }

    /// Reads `len` bytes starting `skip` bytes past the current offset.
    pub fn bytes(&self, skip: usize, len: usize) -> CodecResult<&'a [u8]> {
        let start = self.offset.checked_add(skip).ok_or_else(|| {
            CodecError::Wire(wire::DecodeError::Truncated {
                offset: self.offset,
                needed: skip,
                available: self.data.len().saturating_sub(self.offset),
            })
        })?;
        Ok(wire::read_bytes(self.data, start, len)?)
    }

    /// Reads one byte `skip` bytes past the current offset.
    pub fn read_u8(&self, skip: usize) -> CodecResult<u8> {
        Ok(self.bytes(skip, 1)?[0])
    }

    /// Reads a 16-bit scalar `skip` bytes past the current offset.
    pub fn read_u16(&self, skip: usize) -> CodecResult<u16> {
        let bytes = self.bytes(skip, 2)?;
        Ok(self.byte_order.decode_u16([bytes[0], bytes[1]]))
    }
}

/// Read-only view handed to a procfield encoder.
#[derive(Debug, Clone, Copy)]
pub struct EncodeContext<'a> {
    value: &'a Value,
    slot: usize,
    values: &'a [&'a Value],
    names: &'a [String],
    byte_order: ByteOrder,
}

impl<'a> EncodeContext<'a> {
    #[must_use]
    pub const fn new(
        value: &'a Value,
        slot: usize,
        values: &'a [&'a Value],
        names: &'a [String],
        byte_order: ByteOrder,
    ) -> Self {
        Self {
            value,
            slot,
            values,
            names,
            byte_order,
        }
    }

    /// The value to encode.
    #[must_use]
    pub const fn value(&self) -> &'a Value {
        self.value
    }

    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    #[must_use]
    pub const fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Field name of the slot being encoded, or `slot N` for raw packs.
    #[must_use]
    pub fn name(&self) -> String {
        slot_label(self.names, self.slot)
    }

    /// Looks up any field of the record being packed.
    pub fn field(&self, name: &str) -> CodecResult<&'a Value> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|index| self.values.get(index).copied())
            .ok_or_else(|| CodecError::MissingField {
                field: name.to_string(),
            })
    }

    pub fn uint(&self, name: &str) -> CodecResult<u64> {
        let value = self.field(name)?;
        value.as_uint().ok_or_else(|| mismatch(name, "uint", value))
    }

    /// Builds a type mismatch error for this slot.
    #[must_use]
    pub fn mismatch(&self, expected: &'static str) -> CodecError {
        mismatch(&self.name(), expected, self.value)
    }

    /// Returns the value as a record or a type mismatch error.
    pub fn record(&self) -> CodecResult<&'a Record> {
        self.value.as_record().ok_or_else(|| self.mismatch("record"))
    }
}

pub(crate) fn slot_label(names: &[String], slot: usize) -> String {
    names
        .get(slot)
        .cloned()
        .unwrap_or_else(|| format!("slot {slot}"))
}

/// Decoding half of a procfield.
pub trait ProcfieldDecoder: Send + Sync {
    /// Returns the decoded value and the number of bytes consumed.
    fn decode(&self, cx: &DecodeContext<'_>) -> CodecResult<(Value, usize)>;
}

/// Encoding half of a procfield.
pub trait ProcfieldEncoder: Send + Sync {
    /// Appends the encoding of `cx.value()` to `out`.
    fn encode(&self, cx: &EncodeContext<'_>, out: &mut Vec<u8>) -> CodecResult<()>;
}

impl<F> ProcfieldDecoder for F
where
    F: Fn(&DecodeContext<'_>) -> CodecResult<(Value, usize)> + Send + Sync,
{
    fn decode(&self, cx: &DecodeContext<'_>) -> CodecResult<(Value, usize)> {
        self(cx)
    }
}

impl<F> ProcfieldEncoder for F
where
    F: Fn(&EncodeContext<'_>, &mut Vec<u8>) -> CodecResult<()> + Send + Sync,
{
    fn encode(&self, cx: &EncodeContext<'_>, out: &mut Vec<u8>) -> CodecResult<()> {
        self(cx, out)
    }
}

/// A registered procfield: a decoder and an optional encoder.
#[derive(Clone)]
pub struct Procfield {
    decoder: Arc<dyn ProcfieldDecoder>,
    encoder: Option<Arc<dyn ProcfieldEncoder>>,
}

impl Procfield {
    /// A procfield from a decode closure and an encode closure.
    pub fn new<D, E>(decode: D, encode: E) -> Self
    where
        D: Fn(&DecodeContext<'_>) -> CodecResult<(Value, usize)> + Send + Sync + 'static,
        E: Fn(&EncodeContext<'_>, &mut Vec<u8>) -> CodecResult<()> + Send + Sync + 'static,
    {
        Self {
            decoder: Arc::new(decode),
            encoder: Some(Arc::new(encode)),
        }
    }

    /// A procfield that can only decode.
    pub fn decode_only<D>(decode: D) -> Self
    where
        D: Fn(&DecodeContext<'_>) -> CodecResult<(Value, usize)> + Send + Sync + 'static,
    {
        Self {
            decoder: Arc::new(decode),
            encoder: None,
        }
    }

    /// A procfield from a type implementing both halves.
    pub fn from_handler<H>(handler: H) -> Self
    where
        H: ProcfieldDecoder + ProcfieldEncoder + 'static,
    {
        let handler = Arc::new(handler);
        Self {
            decoder: handler.clone(),
            encoder: Some(handler),
        }
    }

    #[must_use]
    pub fn can_encode(&self) -> bool {
        self.encoder.is_some()
    }

    pub fn decode(&self, cx: &DecodeContext<'_>) -> CodecResult<(Value, usize)> {
        self.decoder.decode(cx)
    }

    /// Encodes through this procfield; `name` is used for the missing-encoder error.
    pub fn encode(&self, name: &str, cx: &EncodeContext<'_>, out: &mut Vec<u8>) -> CodecResult<()> {
        match &self.encoder {
            Some(encoder) => encoder.encode(cx, out),
            None => Err(CodecError::MissingEncoder {
                name: name.to_string(),
            }),
        }
    }
}

impl fmt::Debug for Procfield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procfield")
            .field("can_encode", &self.can_encode())
            .finish_non_exhaustive()
    }
}

/// Procfields keyed by the name used between brackets in a format string.
#[derive(Debug, Clone, Default)]
pub struct ProcfieldTable {
    entries: BTreeMap<String, Procfield>,
}

impl ProcfieldTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a procfield, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, procfield: Procfield) -> Option<Procfield> {
        self.entries.insert(name.into(), procfield)
    }

    /// Builder form of [`ProcfieldTable::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, procfield: Procfield) -> Self {
        self.insert(name, procfield);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Procfield> {
        self.entries.get(name)
    }

    /// Looks up a procfield that the format references.
    pub fn require(&self, name: &str) -> CodecResult<&Procfield> {
        self.get(name).ok_or_else(|| CodecError::UnknownProcfield {
            name: name.to_string(),
        })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
