//! Error types for codec operations.

use std::fmt;

use bitstream::BitError;
use schema::SchemaError;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while building an oracle or running a format.
///
/// Every error aborts the enclosing `unpack`/`pack` call; there are no
/// partial records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The format string is malformed.
    Schema(SchemaError),

    /// The input buffer ended early.
    Wire(wire::DecodeError),

    /// A scalar value does not fit its declared width.
    WireEncode(wire::EncodeError),

    /// A bitfield group failed to decode or encode.
    Bitstream(BitError),

    /// The format references a procfield that is not registered.
    UnknownProcfield { name: String },

    /// The procfield has no encoder, so the record cannot be packed.
    MissingEncoder { name: String },

    /// An oracle declares a different number of names than its format has slots.
    FieldCountMismatch {
        oracle: String,
        names: usize,
        slots: usize,
    },

    /// An oracle declares the same field name twice.
    DuplicateField { oracle: String, field: String },

    /// A field required for packing (or looked up by a procfield) is missing.
    MissingField { field: String },

    /// A raw pack was given the wrong number of slot values.
    SlotCountMismatch { expected: usize, actual: usize },

    /// A value has the wrong shape for its slot.
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A repetition was given the wrong number of elements.
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// The data is well-formed bytes but not a valid record of this kind.
    InvalidData { reason: String },
}

/// Coarse error categories shared by every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed format string.
    FormatSyntax,
    /// Misaligned bitfield group, value wider than its field, or unaligned writer.
    BitWidth,
    /// Procfield name absent from the table.
    UnknownProcfield,
    /// Oracle names do not line up with the format's slots.
    FieldBinding,
    /// Field missing from a record or slot list.
    FieldLookup,
    /// Value of the wrong shape for its slot.
    TypeMismatch,
    /// Input ended before the record did.
    Truncated,
    /// Consumer-level validation failed.
    DataValidation,
    /// Operation not supported by this schema (e.g. pack without encoder).
    Unsupported,
}

impl CodecError {
    /// Shorthand for a consumer-level validation failure.
    pub fn invalid_data(reason: impl Into<String>) -> Self {
        Self::InvalidData {
            reason: reason.into(),
        }
    }

    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Schema(err) => {
                if err.is_bit_width() {
                    ErrorKind::BitWidth
                } else {
                    ErrorKind::FormatSyntax
                }
            }
            Self::Wire(_) => ErrorKind::Truncated,
            Self::WireEncode(_) => ErrorKind::BitWidth,
            Self::Bitstream(err) => {
                if err.is_width_error() {
                    ErrorKind::BitWidth
                } else {
                    ErrorKind::Truncated
                }
            }
            Self::UnknownProcfield { .. } => ErrorKind::UnknownProcfield,
            Self::MissingEncoder { .. } => ErrorKind::Unsupported,
            Self::FieldCountMismatch { .. } | Self::DuplicateField { .. } => {
                ErrorKind::FieldBinding
            }
            Self::MissingField { .. } | Self::SlotCountMismatch { .. } => ErrorKind::FieldLookup,
            Self::TypeMismatch { .. } | Self::LengthMismatch { .. } => ErrorKind::TypeMismatch,
            Self::InvalidData { .. } => ErrorKind::DataValidation,
        }
    }
}

impl From<SchemaError> for CodecError {
    fn from(err: SchemaError) -> Self {
        Self::Schema(err)
    }
}

impl From<wire::DecodeError> for CodecError {
    fn from(err: wire::DecodeError) -> Self {
        Self::Wire(err)
    }
}

impl From<wire::EncodeError> for CodecError {
    fn from(err: wire::EncodeError) -> Self {
        Self::WireEncode(err)
    }
}

impl From<BitError> for CodecError {
    fn from(err: BitError) -> Self {
        Self::Bitstream(err)
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(e) => write!(f, "format error: {e}"),
            Self::Wire(e) => write!(f, "decode error: {e}"),
            Self::WireEncode(e) => write!(f, "encode error: {e}"),
            Self::Bitstream(e) => write!(f, "bitfield error: {e}"),
            Self::UnknownProcfield { name } => {
                write!(f, "procfield function {name:?} missing")
            }
            Self::MissingEncoder { name } => {
                write!(f, "procfield {name:?} has no encoder")
            }
            Self::FieldCountMismatch {
                oracle,
                names,
                slots,
            } => {
                write!(
                    f,
                    "{oracle}: {names} field names declared but format has {slots} slots"
                )
            }
            Self::DuplicateField { oracle, field } => {
                write!(f, "{oracle}: duplicate field name {field:?}")
            }
            Self::MissingField { field } => write!(f, "missing field {field:?}"),
            Self::SlotCountMismatch { expected, actual } => {
                write!(f, "expected {expected} values, got {actual}")
            }
            Self::TypeMismatch {
                field,
                expected,
                found,
            } => {
                write!(f, "field {field:?}: expected {expected}, found {found}")
            }
            Self::LengthMismatch {
                field,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "field {field:?}: expected {expected} elements, found {actual}"
                )
            }
            Self::InvalidData { reason } => write!(f, "invalid data: {reason}"),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FormatSyntax => "format syntax",
            Self::BitWidth => "bit width",
            Self::UnknownProcfield => "unknown procfield",
            Self::FieldBinding => "field binding",
            Self::FieldLookup => "field lookup",
            Self::TypeMismatch => "type mismatch",
            Self::Truncated => "truncated input",
            Self::DataValidation => "data validation",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Schema(e) => Some(e),
            Self::Wire(e) => Some(e),
            Self::WireEncode(e) => Some(e),
            Self::Bitstream(e) => Some(e),
            _ => None,
        }
    }
}
