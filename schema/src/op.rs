//! Precompiled format tokens.

use std::fmt;

/// A fixed-width scalar code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    /// `b`: unsigned 8-bit integer.
    Byte,
    /// `c`: raw byte, kept opaque.
    Char,
    /// `h`: unsigned 16-bit integer in the declared byte order.
    Word,
    /// `l`: unsigned 32-bit integer in the declared byte order.
    Long,
}

impl Scalar {
    /// Resolves a scalar code character.
    #[must_use]
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'b' => Some(Self::Byte),
            'c' => Some(Self::Char),
            'h' => Some(Self::Word),
            'l' => Some(Self::Long),
            _ => None,
        }
    }

    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Byte => 'b',
            Self::Char => 'c',
            Self::Word => 'h',
            Self::Long => 'l',
        }
    }

    /// Encoded size in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Byte | Self::Char => 1,
            Self::Word => 2,
            Self::Long => 4,
        }
    }
}

/// The widths of one bitfield group, e.g. `(1 3 1 3)`.
///
/// Always non-empty, each width in `1..=64`, summing to a multiple of 8.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitGroup {
    widths: Vec<u8>,
}

impl BitGroup {
    pub(crate) fn new(widths: Vec<u8>) -> Self {
        Self { widths }
    }

    #[must_use]
    pub fn widths(&self) -> &[u8] {
        &self.widths
    }

    /// Number of fields (and decoded slots) in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.widths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    #[must_use]
    pub fn total_bits(&self) -> usize {
        self.widths.iter().map(|&w| usize::from(w)).sum()
    }

    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.total_bits() / 8
    }
}

/// One top-level token of a format string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    /// A single scalar: one slot.
    Scalar(Scalar),
    /// `N<scalar>`: one slot holding a nested sequence of `count` values.
    Repeat { count: usize, scalar: Scalar },
    /// A bitfield group: one slot per width.
    Bits(BitGroup),
    /// `[name]`: one slot produced by the named callback.
    Procfield(String),
}

impl Op {
    /// Bytes this op occupies, or 0 for procfields whose size is only
    /// known at decode time.
    #[must_use]
    pub fn fixed_size(&self) -> usize {
        match self {
            Self::Scalar(scalar) => scalar.size(),
            Self::Repeat { count, scalar } => count.saturating_mul(scalar.size()),
            Self::Bits(group) => group.byte_len(),
            Self::Procfield(_) => 0,
        }
    }

    /// Number of top-level slots this op produces when decoding and
    /// consumes when encoding.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        match self {
            Self::Scalar(_) | Self::Repeat { .. } | Self::Procfield(_) => 1,
            Self::Bits(group) => group.len(),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(scalar) => write!(f, "{}", scalar.code()),
            Self::Repeat { count, scalar } => write!(f, "{count}{}", scalar.code()),
            Self::Bits(group) => {
                f.write_str("(")?;
                for (i, width) in group.widths().iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{width}")?;
                }
                f.write_str(")")
            }
            Self::Procfield(name) => write!(f, "[{name}]"),
        }
    }
}
