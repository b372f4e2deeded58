use codec::procfield::builtin;
use codec::{pack, unpack, Format, Mpi, Oracle, ProcfieldTable, Record, Value};
use proptest::prelude::*;

/// One token of a generated format plus a value that fits it.
#[derive(Debug, Clone)]
enum Token {
    Byte(u8),
    Char(u8),
    Word(u16),
    Long(u32),
    Repeat(Vec<u16>),
    Group(Vec<(u8, u64)>),
    Blocks(Vec<Vec<u8>>),
    Mpi(u128),
}

impl Token {
    fn source(&self) -> String {
        match self {
            Self::Byte(_) => "b".into(),
            Self::Char(_) => "c".into(),
            Self::Word(_) => "h".into(),
            Self::Long(_) => "l".into(),
            Self::Repeat(items) => format!("{}h", items.len()),
            Self::Group(fields) => {
                let widths: Vec<String> = fields.iter().map(|(w, _)| w.to_string()).collect();
                format!("({})", widths.join(" "))
            }
            Self::Blocks(_) => "[db]".into(),
            Self::Mpi(_) => "[mpi]".into(),
        }
    }

    fn values(&self) -> Vec<Value> {
        match self {
            Self::Byte(v) => vec![Value::UInt(u64::from(*v))],
            Self::Char(c) => vec![Value::Char(*c)],
            Self::Word(v) => vec![Value::UInt(u64::from(*v))],
            Self::Long(v) => vec![Value::UInt(u64::from(*v))],
            Self::Repeat(items) => vec![Value::List(
                items.iter().map(|v| Value::UInt(u64::from(*v))).collect(),
            )],
            Self::Group(fields) => fields.iter().map(|(_, v)| Value::UInt(*v)).collect(),
            Self::Blocks(blocks) => vec![Value::List(
                blocks.iter().cloned().map(Value::Bytes).collect(),
            )],
            Self::Mpi(v) => vec![Value::Mpi(Mpi::from_u128(*v))],
        }
    }
}

fn mask(width: u8) -> u64 {
    if width == 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn group_strategy() -> impl Strategy<Value = Vec<(u8, u64)>> {
    prop::collection::vec(1u8..=16, 1..6).prop_flat_map(|mut widths| {
        // Pad to a byte boundary.
        let total: u32 = widths.iter().map(|w| u32::from(*w)).sum();
        let pad = (8 - total % 8) % 8;
        if pad > 0 {
            widths.push(pad as u8);
        }
        widths
            .into_iter()
            .map(|w| (Just(w), any::<u64>().prop_map(move |v| v & mask(w))))
            .collect::<Vec<_>>()
    })
}

fn token_strategy() -> impl Strategy<Value = Token> {
    prop_oneof![
        any::<u8>().prop_map(Token::Byte),
        any::<u8>().prop_map(Token::Char),
        any::<u16>().prop_map(Token::Word),
        any::<u32>().prop_map(Token::Long),
        prop::collection::vec(any::<u16>(), 0..5).prop_map(Token::Repeat),
        group_strategy().prop_map(Token::Group),
        prop::collection::vec(prop::collection::vec(any::<u8>(), 1..8), 0..4)
            .prop_map(Token::Blocks),
        any::<u128>().prop_map(Token::Mpi),
    ]
}

fn table() -> ProcfieldTable {
    ProcfieldTable::new()
        .with("db", builtin::data_blocks())
        .with("mpi", builtin::mpi())
}

proptest! {
    #[test]
    fn prop_raw_pack_unpack_roundtrip(
        big in any::<bool>(),
        tokens in prop::collection::vec(token_strategy(), 1..10),
    ) {
        let mut source = String::from(if big { "B" } else { "L" });
        for token in &tokens {
            source.push_str(&token.source());
        }
        let format = Format::parse(&source).unwrap();
        let values: Vec<Value> = tokens.iter().flat_map(Token::values).collect();
        prop_assert_eq!(values.len(), format.slot_count());

        let bytes = pack(&format, &values, &table()).unwrap();
        prop_assert!(bytes.len() >= format.fixed_size());
        let (decoded, used) = unpack(&format, &bytes, 0, &table()).unwrap();
        prop_assert_eq!(used, bytes.len());
        prop_assert_eq!(decoded, values);
    }

    #[test]
    fn prop_oracle_roundtrip_with_trailing_bytes(
        tokens in prop::collection::vec(token_strategy(), 1..8),
        trailer in prop::collection::vec(any::<u8>(), 0..8),
    ) {
        let mut source = String::from("L");
        for token in &tokens {
            source.push_str(&token.source());
        }
        let values: Vec<Value> = tokens.iter().flat_map(Token::values).collect();
        let names: Vec<String> = (0..values.len()).map(|i| format!("f{i}")).collect();
        let oracle = Oracle::new("generated", &source, &names, table()).unwrap();

        let record: Record = names.iter().cloned().zip(values).collect();
        let mut bytes = oracle.pack(&record).unwrap();
        let len = bytes.len();
        bytes.extend(&trailer);

        let (decoded, used) = oracle.unpack(&bytes, 0).unwrap();
        prop_assert_eq!(used, len);
        prop_assert_eq!(decoded, record);
    }

    #[test]
    fn prop_unpack_arbitrary_bytes_never_panics(
        data in prop::collection::vec(any::<u8>(), 0..64),
        offset in 0usize..80,
    ) {
        let format = Format::parse("Bb(4 4)h3c[db][mpi]l").unwrap();
        let _ = unpack(&format, &data, offset, &table());
    }
}
