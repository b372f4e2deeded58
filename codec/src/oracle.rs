//! Named record schemas.

use std::collections::HashSet;
use std::sync::Arc;

use schema::{Format, FormatLimits};
use tracing::trace;

use crate::error::{CodecError, CodecResult};
use crate::interp::{decode_slots, encode_slots};
use crate::procfield::{
    DecodeContext, EncodeContext, Procfield, ProcfieldDecoder, ProcfieldEncoder, ProcfieldTable,
};
use crate::value::{Record, Value};

/// A named, reusable record schema: a format string, one field name per
/// slot, and the procfields the format references.
///
/// An oracle is immutable once built and can be shared across threads.
#[derive(Debug, Clone)]
pub struct Oracle {
    name: String,
    format: Format,
    names: Vec<String>,
    procfields: ProcfieldTable,
}

impl Oracle {
    /// Builds an oracle with default format limits.
    ///
    /// Fails if the format is malformed, the name count differs from the
    /// slot count, a name repeats, or a referenced procfield is missing.
    pub fn new<S: AsRef<str>>(
        name: &str,
        format: &str,
        names: &[S],
        procfields: ProcfieldTable,
    ) -> CodecResult<Self> {
        Self::builder(name, format)
            .fields(names)
            .procfields(procfields)
            .build()
    }

    #[must_use]
    pub fn builder(name: &str, format: &str) -> OracleBuilder {
        OracleBuilder {
            name: name.to_string(),
            format: format.to_string(),
            names: Vec::new(),
            procfields: ProcfieldTable::new(),
            limits: FormatLimits::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn format(&self) -> &Format {
        &self.format
    }

    #[must_use]
    pub fn field_names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub const fn procfields(&self) -> &ProcfieldTable {
        &self.procfields
    }

    /// Fixed size in bytes, excluding procfields.
    #[must_use]
    pub fn size(&self) -> usize {
        self.format.fixed_size()
    }

    /// True if every referenced procfield can encode.
    #[must_use]
    pub fn can_pack(&self) -> bool {
        self.format
            .procfield_names()
            .all(|name| self.procfields.get(name).is_some_and(Procfield::can_encode))
    }

    /// Decodes one record starting at `offset`.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn unpack(&self, data: &[u8], offset: usize) -> CodecResult<(Record, usize)> {
        let (values, used) =
            decode_slots(&self.format, data, offset, &self.procfields, &self.names)?;
        trace!(oracle = %self.name, offset, used, "unpacked record");
        let fields = self.names.iter().cloned().zip(values).collect();
        Ok((Record::from_unique(fields), used))
    }

    /// Encodes a record. Fields not declared by this oracle are ignored.
    pub fn pack(&self, record: &Record) -> CodecResult<Vec<u8>> {
        let values = self
            .names
            .iter()
            .map(|name| {
                record.get(name).ok_or_else(|| CodecError::MissingField {
                    field: name.clone(),
                })
            })
            .collect::<CodecResult<Vec<_>>>()?;
        let out = encode_slots(&self.format, &values, &self.procfields, &self.names)?;
        trace!(oracle = %self.name, len = out.len(), "packed record");
        Ok(out)
    }

    /// The record obtained by decoding `size()` zero bytes.
    ///
    /// Procfields see an empty remainder, so oracles whose procfields need
    /// data beyond the fixed part fail with a truncation error.
    pub fn default_record(&self) -> CodecResult<Record> {
        let zeros = vec![0u8; self.size()];
        self.unpack(&zeros, 0).map(|(record, _)| record)
    }

    /// Wraps this oracle as a procfield decoding to and encoding from a
    /// nested [`Value::Record`].
    #[must_use]
    pub fn as_procfield(self: &Arc<Self>) -> Procfield {
        Procfield::from_handler(Nested(Arc::clone(self)))
    }
}

struct Nested(Arc<Oracle>);

impl ProcfieldDecoder for Nested {
    fn decode(&self, cx: &DecodeContext<'_>) -> CodecResult<(Value, usize)> {
        let (record, used) = self.0.unpack(cx.data(), cx.offset())?;
        Ok((Value::Record(record), used))
    }
}

impl ProcfieldEncoder for Nested {
    fn encode(&self, cx: &EncodeContext<'_>, out: &mut Vec<u8>) -> CodecResult<()> {
        out.extend(self.0.pack(cx.record()?)?);
        Ok(())
    }
}

/// Builder for [`Oracle`].
#[derive(Debug, Clone)]
pub struct OracleBuilder {
    name: String,
    format: String,
    names: Vec<String>,
    procfields: ProcfieldTable,
    limits: FormatLimits,
}

impl OracleBuilder {
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    #[must_use]
    pub fn fields<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.names
            .extend(names.iter().map(|name| name.as_ref().to_string()));
        self
    }

    #[must_use]
    pub fn procfield(mut self, name: impl Into<String>, procfield: Procfield) -> Self {
        self.procfields.insert(name, procfield);
        self
    }

    /// Replaces the procfield table.
    #[must_use]
    pub fn procfields(mut self, procfields: ProcfieldTable) -> Self {
        self.procfields = procfields;
        self
    }

    #[must_use]
    pub fn limits(mut self, limits: FormatLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn build(self) -> CodecResult<Oracle> {
        let format = Format::parse_with_limits(&self.format, &self.limits)?;

        let slots = format.slot_count();
        if self.names.len() != slots {
            return Err(CodecError::FieldCountMismatch {
                oracle: self.name,
                names: self.names.len(),
                slots,
            });
        }

        let mut seen = HashSet::with_capacity(self.names.len());
        if let Some(dup) = self.names.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(CodecError::DuplicateField {
                oracle: self.name.clone(),
                field: dup.clone(),
            });
        }

        for name in format.procfield_names() {
            self.procfields.require(name)?;
        }

        Ok(Oracle {
            name: self.name,
            format,
            names: self.names,
            procfields: self.procfields,
        })
    }
}
