//! MSB-first bit-group packing primitives for the bitoracle codec.
//!
//! This crate provides [`BitReader`] and [`BitWriter`] for the bitfield groups
//! of a format string, e.g. `(1 3 1 3)`. Fields are read and written most
//! significant bit first and may straddle byte boundaries, but a group as a
//! whole always occupies a whole number of bytes.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - All reads are bounds-checked.
//! - **No truncation** - Writing a value wider than its field is an error.
//! - **Byte-aligned groups** - Finishing mid-byte is an error, never padding.
//!
//! # Example
//!
//! ```
//! use bitstream::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bit(true);
//! writer.write_bits(42, 7).unwrap();
//!
//! let bytes = writer.finish().unwrap();
//!
//! let mut reader = BitReader::new(&bytes);
//! assert_eq!(reader.read_bit().unwrap(), true);
//! assert_eq!(reader.read_bits(7).unwrap(), 42);
//! ```

mod error;
mod reader;
mod writer;

pub use error::{BitError, BitResult};
pub use reader::{unpack_group, BitReader, MAX_FIELD_BITS};
pub use writer::{pack_group, BitWriter};
