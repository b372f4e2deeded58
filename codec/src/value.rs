//! Decoded values and named records.

use crate::error::{CodecError, CodecResult};

/// A single decoded slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `b`, `h`, `l` and bitfield widths.
    UInt(u64),
    /// `c`: a raw byte, kept apart from numbers.
    Char(u8),
    /// `N<scalar>` repetitions and multi-element procfield results.
    List(Vec<Value>),
    /// Opaque bytes produced by a procfield.
    Bytes(Vec<u8>),
    /// Multi-precision integer produced by the `mpi` procfield.
    Mpi(Mpi),
    /// Sub-record produced by a nested oracle.
    Record(Record),
    /// A procfield that found nothing to decode (e.g. no colour table).
    Absent,
}

impl Value {
    /// Human-readable name of the variant, used in type mismatch errors.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::UInt(_) => "uint",
            Self::Char(_) => "char",
            Self::List(_) => "list",
            Self::Bytes(_) => "bytes",
            Self::Mpi(_) => "mpi",
            Self::Record(_) => "record",
            Self::Absent => "absent",
        }
    }

    #[must_use]
    pub const fn as_uint(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_char(&self) -> Option<u8> {
        match self {
            Self::Char(c) => Some(*c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_mpi(&self) -> Option<&Mpi> {
        match self {
            Self::Mpi(mpi) => Some(mpi),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Collects a list of `c` values into bytes.
    ///
    /// Returns `None` if this is not a list or any element is not a char.
    #[must_use]
    pub fn chars(&self) -> Option<Vec<u8>> {
        self.as_list()?.iter().map(Value::as_char).collect()
    }

    /// Builds a list of `c` values from bytes.
    #[must_use]
    pub fn char_list(bytes: &[u8]) -> Self {
        Self::List(bytes.iter().copied().map(Self::Char).collect())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Mpi> for Value {
    fn from(mpi: Mpi) -> Self {
        Self::Mpi(mpi)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// A multi-precision integer: a bit count and a big-endian magnitude of
/// exactly `ceil(bits / 8)` bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Mpi {
    bits: u16,
    magnitude: Vec<u8>,
}

impl Mpi {
    /// Creates an MPI, checking that the magnitude length matches the bit count.
    pub fn new(bits: u16, magnitude: Vec<u8>) -> CodecResult<Self> {
        let expected = Self::byte_len_for(bits);
        if magnitude.len() != expected {
            return Err(CodecError::invalid_data(format!(
                "mpi of {bits} bits needs {expected} bytes, got {}",
                magnitude.len()
            )));
        }
        Ok(Self { bits, magnitude })
    }

    /// Builds the minimal MPI for `value`.
    #[must_use]
    pub fn from_u128(value: u128) -> Self {
        let bits = (u128::BITS - value.leading_zeros()) as u16;
        let len = Self::byte_len_for(bits);
        let magnitude = value.to_be_bytes()[16 - len..].to_vec();
        Self { bits, magnitude }
    }

    /// Returns the value if it fits in 128 bits.
    #[must_use]
    pub fn to_u128(&self) -> Option<u128> {
        let significant: Vec<u8> = self
            .magnitude
            .iter()
            .copied()
            .skip_while(|b| *b == 0)
            .collect();
        if significant.len() > 16 {
            return None;
        }
        Some(
            significant
                .iter()
                .fold(0u128, |acc, b| (acc << 8) | u128::from(*b)),
        )
    }

    #[must_use]
    pub const fn bits(&self) -> u16 {
        self.bits
    }

    #[must_use]
    pub fn magnitude(&self) -> &[u8] {
        &self.magnitude
    }

    /// Number of magnitude bytes for a bit count.
    #[must_use]
    pub const fn byte_len_for(bits: u16) -> usize {
        (bits as usize).div_ceil(8)
    }
}

/// An ordered mapping from field names to values.
///
/// Decoded records keep the oracle's declaration order. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Builds a record from pairs that are already known to have unique names.
    pub(crate) fn from_unique(fields: Vec<(String, Value)>) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets a field, keeping its position if it already exists.
    ///
    /// Returns the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.get_mut(&name) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    /// Builder form of [`Record::set`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(index).1)
    }

    /// Looks up a field that must exist.
    pub fn field(&self, name: &str) -> CodecResult<&Value> {
        self.get(name).ok_or_else(|| CodecError::MissingField {
            field: name.to_string(),
        })
    }

    /// Looks up a numeric field.
    pub fn uint(&self, name: &str) -> CodecResult<u64> {
        let value = self.field(name)?;
        value.as_uint().ok_or_else(|| mismatch(name, "uint", value))
    }

    /// Looks up a sub-record field.
    pub fn record(&self, name: &str) -> CodecResult<&Record> {
        let value = self.field(name)?;
        value.as_record().ok_or_else(|| mismatch(name, "record", value))
    }

    /// Looks up a bytes field.
    pub fn bytes(&self, name: &str) -> CodecResult<&[u8]> {
        let value = self.field(name)?;
        value.as_bytes().ok_or_else(|| mismatch(name, "bytes", value))
    }

    /// Looks up a list field.
    pub fn list(&self, name: &str) -> CodecResult<&[Value]> {
        let value = self.field(name)?;
        value.as_list().ok_or_else(|| mismatch(name, "list", value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (name, value) in iter {
            record.set(name, value);
        }
        record
    }
}

pub(crate) fn mismatch(field: &str, expected: &'static str, found: &Value) -> CodecError {
    CodecError::TypeMismatch {
        field: field.to_string(),
        expected,
        found: found.kind_name(),
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use serde::ser::{SerializeMap, SerializeStruct};
    use serde::{Serialize, Serializer};

    use super::{Mpi, Record, Value};

    impl Serialize for Value {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Self::UInt(v) => serializer.serialize_u64(*v),
                Self::Char(c) => serializer.serialize_char(char::from(*c)),
                Self::List(items) => items.serialize(serializer),
                Self::Bytes(bytes) => bytes.serialize(serializer),
                Self::Mpi(mpi) => mpi.serialize(serializer),
                Self::Record(record) => record.serialize(serializer),
                Self::Absent => serializer.serialize_none(),
            }
        }
    }

    impl Serialize for Mpi {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut state = serializer.serialize_struct("Mpi", 2)?;
            state.serialize_field("bits", &self.bits)?;
            state.serialize_field("magnitude", &self.magnitude)?;
            state.end()
        }
    }

    impl Serialize for Record {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.fields.len()))?;
            for (name, value) in &self.fields {
                map.serialize_entry(name, value)?;
            }
            map.end()
        }
    }
}
