//! Format-string grammar for the bitoracle codec.
//!
//! A format string describes one non-padded binary record:
//!
//! ```text
//! Lhh(1 3 1 3)bb[gct]
//! ^ byte order: L (little) or B (big)
//!  ^^ two 16-bit words
//!    ^^^^^^^^^ a bitfield group, four fields MSB first, one byte total
//!             ^^ two bytes
//!               ^^^^^ a procfield resolved by name at decode time
//! ```
//!
//! This crate only parses and validates; running a format against a buffer
//! is the job of the `codec` crate.
//!
//! # Design Principles
//!
//! - **Parse once** - A [`Format`] is an immutable, precompiled op list.
//! - **Fail at construction** - Misaligned bitfield groups and syntax errors
//!   are schema errors, never data errors.
//! - **Explicit slot accounting** - [`Format::slot_count`] is the single
//!   source of truth for how many values a record holds.

mod error;
mod format;
mod limits;
mod op;

pub use error::{LimitKind, SchemaError, SchemaResult};
pub use format::Format;
pub use limits::FormatLimits;
pub use op::{BitGroup, Op, Scalar};
pub use wire::ByteOrder;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = FormatLimits::default();
        let _ = Scalar::from_code('b');
        let _: SchemaResult<Format> = Format::parse("Lb");
        let _ = ByteOrder::Big;
    }

    #[test]
    fn graphic_control_extension_layout() {
        let format = Format::parse("Lbbb(3 3 1 1)hbb").unwrap();
        assert_eq!(format.slot_count(), 10);
        assert_eq!(format.fixed_size(), 8);
    }

    #[test]
    fn ctb_layout() {
        let format = Format::parse("B(1 1 4 2)").unwrap();
        assert_eq!(format.byte_order(), ByteOrder::Big);
        assert_eq!(format.slot_count(), 4);
        assert_eq!(format.fixed_size(), 1);
    }
}
