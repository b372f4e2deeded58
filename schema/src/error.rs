//! Format-string validation errors.

use std::fmt;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur when parsing or validating a format string.
///
/// Positions are byte offsets into the format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The leading byte-order tag is missing or not `L`/`B`.
    InvalidByteOrder { found: Option<char> },

    /// A character that does not start any token.
    UnexpectedToken { found: char, position: usize },

    /// A `(` or `[` without its closing counterpart.
    Unterminated { open: char, position: usize },

    /// A `)` or `]` with no opening counterpart.
    UnmatchedClose { found: char, position: usize },

    /// A repeat count not followed by a scalar code.
    MissingRepeatTarget { position: usize },

    /// A repeat count too large to represent.
    InvalidRepeatCount { position: usize },

    /// A `[]` procfield reference.
    EmptyProcfieldName { position: usize },

    /// A `()` bitfield group.
    EmptyBitGroup { position: usize },

    /// A bitfield width outside `1..=64`.
    InvalidBitWidth { width: usize, position: usize },

    /// A bitfield group whose widths do not sum to a multiple of 8.
    MisalignedBitGroup { total_bits: usize, position: usize },

    /// A configured limit was exceeded.
    LimitExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },
}

/// Format limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    RepeatCount,
    GroupBits,
    OpCount,
}

impl SchemaError {
    /// Returns `true` for bit-width violations, `false` for syntax errors.
    #[must_use]
    pub const fn is_bit_width(&self) -> bool {
        matches!(
            self,
            Self::EmptyBitGroup { .. }
                | Self::InvalidBitWidth { .. }
                | Self::MisalignedBitGroup { .. }
        )
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidByteOrder { found: Some(tag) } => {
                write!(f, "unsupported byte order code {tag:?}")
            }
            Self::InvalidByteOrder { found: None } => {
                write!(f, "empty format string, expected a byte order code")
            }
            Self::UnexpectedToken { found, position } => {
                write!(f, "unsupported format character {found:?} at {position}")
            }
            Self::Unterminated { open, position } => {
                write!(f, "no closing bracket for {open:?} opened at {position}")
            }
            Self::UnmatchedClose { found, position } => {
                write!(f, "unmatched {found:?} at {position}")
            }
            Self::MissingRepeatTarget { position } => {
                write!(f, "repeat count must be followed by b, c, h or l at {position}")
            }
            Self::InvalidRepeatCount { position } => {
                write!(f, "repeat count at {position} is too large")
            }
            Self::EmptyProcfieldName { position } => {
                write!(f, "empty procfield name at {position}")
            }
            Self::EmptyBitGroup { position } => {
                write!(f, "empty bitfield group at {position}")
            }
            Self::InvalidBitWidth { width, position } => {
                write!(f, "bitfield width {width} at {position} is outside 1..=64")
            }
            Self::MisalignedBitGroup {
                total_bits,
                position,
            } => {
                write!(
                    f,
                    "bitfield group at {position} is {total_bits} bits, not a multiple of 8"
                )
            }
            Self::LimitExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RepeatCount => "repeat count",
            Self::GroupBits => "bitfield group bits",
            Self::OpCount => "field count",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for SchemaError {}
