//! Error types for scalar encoding and decoding.

use std::fmt;

/// Result type for scalar decode operations.
pub type WireResult<T> = Result<T, DecodeError>;

/// Errors that can occur while decoding scalars from a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// The buffer ended before the scalar did.
    Truncated {
        /// Offset the read started at.
        offset: usize,
        /// Bytes required from `offset`.
        needed: usize,
        /// Bytes actually available from `offset`.
        available: usize,
    },
}

/// Errors that can occur while encoding scalars.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EncodeError {
    /// Value does not fit the scalar width; values are never truncated.
    ValueOutOfRange {
        /// The rejected value.
        value: u64,
        /// Width of the scalar in bytes.
        width: usize,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated {
                offset,
                needed,
                available,
            } => {
                write!(
                    f,
                    "truncated input at offset {offset}: need {needed} bytes, have {available}"
                )
            }
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValueOutOfRange { value, width } => {
                write!(f, "value {value} does not fit in {width} byte(s)")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl std::error::Error for EncodeError {}
