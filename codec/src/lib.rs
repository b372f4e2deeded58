//! Format interpreter, procfield dispatch and oracles for bitoracle.
//!
//! This is the main codec crate that ties together bitstream, wire, and
//! schema: a parsed [`Format`] is run against a byte buffer to produce one
//! [`Value`] per slot, and an [`Oracle`] binds those slots to field names
//! to produce a [`Record`]. Packing walks the same format in reverse.
//!
//! ```
//! use codec::{Oracle, ProcfieldTable};
//!
//! let header = Oracle::new("GIF Header", "L3c3c", &["signature", "version"], ProcfieldTable::new())?;
//! let (record, used) = header.unpack(b"GIF89a", 0)?;
//! assert_eq!(used, 6);
//! assert_eq!(header.pack(&record)?, b"GIF89a");
//! # Ok::<(), codec::CodecError>(())
//! ```
//!
//! # Design Principles
//!
//! - **Parse once** - Format strings are validated when an oracle is built.
//! - **Symmetric** - Unpacking what `pack` produced gives back an equal record.
//! - **No truncation** - Values wider than their field are errors.
//! - **All or nothing** - A failed decode never yields a partial record.

mod error;
mod interp;
mod oracle;
pub mod procfield;
mod value;

pub use error::{CodecError, CodecResult, ErrorKind};
pub use interp::{pack, unpack};
pub use oracle::{Oracle, OracleBuilder};
pub use procfield::{
    DecodeContext, EncodeContext, Procfield, ProcfieldDecoder, ProcfieldEncoder, ProcfieldTable,
};
pub use schema::{ByteOrder, Format, FormatLimits};
pub use value::{Mpi, Record, Value};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = FormatLimits::default();
        let _ = ProcfieldTable::new();
        let _ = Record::new();
        let _ = Mpi::from_u128(1);
        let _ = procfield::builtin::data_blocks();
        let _: CodecResult<()> = Ok(());
    }

    #[test]
    fn raw_unpack_matches_oracle() {
        let format = Format::parse("Lhh(1 3 1 3)bb").unwrap();
        let data = [0x0A, 0x00, 0x0A, 0x00, 0x91, 0x00, 0x00];
        let (values, used) = unpack(&format, &data, 0, &ProcfieldTable::new()).unwrap();
        assert_eq!(used, 7);
        assert_eq!(values.len(), 8);
        assert_eq!(values[2], Value::UInt(1));
        assert_eq!(values[5], Value::UInt(1));
    }

    #[test]
    fn pack_then_unpack_gives_equal_record() {
        let oracle = Oracle::new(
            "comment",
            "Lb(4 4)[db]",
            &["label", "hi", "lo", "data"],
            ProcfieldTable::new().with("db", procfield::builtin::data_blocks()),
        )
        .unwrap();
        let record = Record::new()
            .with("label", 0xFEu64)
            .with("hi", 3u64)
            .with("lo", 9u64)
            .with("data", Value::List(vec![Value::Bytes(b"ok".to_vec())]));
        let bytes = oracle.pack(&record).unwrap();
        let (decoded, used) = oracle.unpack(&bytes, 0).unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(decoded, record);
    }
}
