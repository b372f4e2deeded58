//! Error types for bitstream operations.

use std::fmt;

/// Result type for bitstream operations.
pub type BitResult<T> = Result<T, BitError>;

/// Errors that can occur during bit-level encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitError {
    /// Attempted to read past the end of the buffer.
    UnexpectedEof {
        /// Number of bits requested.
        requested: usize,
        /// Number of bits available.
        available: usize,
    },

    /// Invalid bit count for the operation.
    InvalidBitCount {
        /// The invalid bit count provided.
        bits: u8,
        /// Maximum allowed bits for this operation.
        max_bits: u8,
    },

    /// Value exceeds the range representable by the specified number of bits.
    ValueOutOfRange {
        /// The value that was out of range.
        value: u64,
        /// Number of bits available.
        bits: u8,
    },

    /// The writer was finished with a partially filled byte.
    Unaligned {
        /// Total number of bits written.
        bits_written: usize,
    },

    /// A group was packed with a different number of values than widths.
    WidthCountMismatch {
        /// Number of declared widths.
        widths: usize,
        /// Number of supplied values.
        values: usize,
    },
}

impl BitError {
    /// Returns `true` for errors caused by a value or width that does not fit
    /// the declared bit layout (as opposed to running out of input).
    #[must_use]
    pub const fn is_width_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidBitCount { .. }
                | Self::ValueOutOfRange { .. }
                | Self::Unaligned { .. }
                | Self::WidthCountMismatch { .. }
        )
    }
}

impl fmt::Display for BitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof {
                requested,
                available,
            } => {
                write!(
                    f,
                    "attempted to read {requested} bits but only {available} bits available"
                )
            }
            Self::InvalidBitCount { bits, max_bits } => {
                write!(f, "invalid bit count {bits}, maximum allowed is {max_bits}")
            }
            Self::ValueOutOfRange { value, bits } => {
                write!(f, "value {value} cannot be represented in {bits} bits")
            }
            Self::Unaligned { bits_written } => {
                write!(
                    f,
                    "bit group did not finish on a byte boundary ({bits_written} bits written)"
                )
            }
            Self::WidthCountMismatch { widths, values } => {
                write!(f, "bit group declares {widths} widths but {values} values given")
            }
        }
    }
}

impl std::error::Error for BitError {}
