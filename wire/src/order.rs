//! Byte-order tags.

use std::fmt;

/// Byte order used for the multi-byte scalars of a format string.
///
/// Selected by the first character of every format string: `L` for
/// little-endian, `B` for big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Tag character for little-endian formats.
    pub const LITTLE_TAG: char = 'L';

    /// Tag character for big-endian formats.
    pub const BIG_TAG: char = 'B';

    /// Resolves a tag character.
    #[must_use]
    pub const fn from_tag(tag: char) -> Option<Self> {
        match tag {
            Self::LITTLE_TAG => Some(Self::Little),
            Self::BIG_TAG => Some(Self::Big),
            _ => None,
        }
    }

    /// Returns the tag character for this byte order.
    #[must_use]
    pub const fn tag(self) -> char {
        match self {
            Self::Little => Self::LITTLE_TAG,
            Self::Big => Self::BIG_TAG,
        }
    }

    #[must_use]
    pub const fn decode_u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            Self::Little => u16::from_le_bytes(bytes),
            Self::Big => u16::from_be_bytes(bytes),
        }
    }

    #[must_use]
    pub const fn decode_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::Little => u32::from_le_bytes(bytes),
            Self::Big => u32::from_be_bytes(bytes),
        }
    }

    #[must_use]
    pub const fn encode_u16(self, value: u16) -> [u8; 2] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }

    #[must_use]
    pub const fn encode_u32(self, value: u32) -> [u8; 4] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Little => "little-endian",
            Self::Big => "big-endian",
        };
        write!(f, "{name}")
    }
}
