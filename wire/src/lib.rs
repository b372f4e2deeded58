//! Byte-order-aware scalar primitives for the bitoracle codec.
//!
//! This crate reads and writes the fixed-width unsigned scalars a format
//! string can name (`b`, `c`, `h`, `l`) in either byte order. It knows
//! nothing about format strings or records, only about bytes.
//!
//! # Design Principles
//!
//! - **Bounded decoding** - Every read is checked against the buffer length.
//! - **No truncation** - Encoding a value wider than its scalar is an error.
//! - **No sign extension, no floats** - All scalars are unsigned integers.

mod error;
mod order;
mod scalar;

pub use error::{DecodeError, EncodeError, WireResult};
pub use order::ByteOrder;
pub use scalar::{read_bytes, read_u16, read_u32, read_u8, write_u16, write_u32, write_u8};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = ByteOrder::from_tag('L');
        let _: WireResult<()> = Ok(());
        let _ = read_u8(&[0], 0);
    }

    #[test]
    fn scalars_roundtrip_both_orders() {
        for order in [ByteOrder::Little, ByteOrder::Big] {
            let mut out = Vec::new();
            write_u16(&mut out, 0xBEEF, order).unwrap();
            write_u32(&mut out, 0xDEAD_BEEF, order).unwrap();
            assert_eq!(read_u16(&out, 0, order).unwrap(), 0xBEEF);
            assert_eq!(read_u32(&out, 2, order).unwrap(), 0xDEAD_BEEF);
        }
    }
}
