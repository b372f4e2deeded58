use proptest::prelude::*;
use schema::{Format, Op, SchemaError};

#[derive(Clone, Debug)]
enum Token {
    Scalar(char),
    Repeat(usize, char),
    Group(Vec<u8>),
    Proc(String),
}

impl Token {
    fn render(&self) -> String {
        match self {
            Self::Scalar(code) => code.to_string(),
            Self::Repeat(count, code) => format!("{count}{code}"),
            Self::Group(widths) => {
                let widths: Vec<String> = widths.iter().map(u8::to_string).collect();
                format!("({})", widths.join(" "))
            }
            Self::Proc(name) => format!("[{name}]"),
        }
    }

    fn size(&self) -> usize {
        match self {
            Self::Scalar(code) => code_size(*code),
            Self::Repeat(count, code) => count * code_size(*code),
            Self::Group(widths) => widths.iter().map(|&w| usize::from(w)).sum::<usize>() / 8,
            Self::Proc(_) => 0,
        }
    }

    fn slots(&self) -> usize {
        match self {
            Self::Group(widths) => widths.len(),
            _ => 1,
        }
    }
}

fn code_size(code: char) -> usize {
    match code {
        'h' => 2,
        'l' => 4,
        _ => 1,
    }
}

fn code_strategy() -> impl Strategy<Value = char> {
    prop_oneof![Just('b'), Just('c'), Just('h'), Just('l')]
}

fn group_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(1u8..=16, 1..6).prop_map(|mut widths| {
        let total: usize = widths.iter().map(|&w| usize::from(w)).sum();
        let pad = (8 - total % 8) % 8;
        if pad > 0 {
            widths.push(pad as u8);
        }
        widths
    })
}

fn token_strategy() -> impl Strategy<Value = Token> {
    prop_oneof![
        code_strategy().prop_map(Token::Scalar),
        (0usize..32, code_strategy()).prop_map(|(n, c)| Token::Repeat(n, c)),
        group_strategy().prop_map(Token::Group),
        "[a-z_]{1,8}".prop_map(Token::Proc),
    ]
}

proptest! {
    #[test]
    fn prop_sizes_and_slots_match_tokens(
        big in any::<bool>(),
        tokens in prop::collection::vec(token_strategy(), 0..16),
    ) {
        let mut source = String::from(if big { "B" } else { "L" });
        for token in &tokens {
            source.push_str(&token.render());
        }

        let format = Format::parse(&source).unwrap();
        prop_assert_eq!(format.ops().len(), tokens.len());
        prop_assert_eq!(format.fixed_size(), tokens.iter().map(Token::size).sum::<usize>());
        prop_assert_eq!(format.slot_count(), tokens.iter().map(Token::slots).sum::<usize>());

        let rendered: String = format.ops().iter().map(Op::to_string).collect();
        prop_assert_eq!(&rendered, &source[1..]);
    }

    #[test]
    fn prop_arbitrary_input_never_panics(source in "\\PC{0,32}") {
        let _ = Format::parse(&source);
    }

    #[test]
    fn prop_misaligned_group_rejected(widths in prop::collection::vec(1u8..=16, 1..6)) {
        let total: usize = widths.iter().map(|&w| usize::from(w)).sum();
        prop_assume!(total % 8 != 0);
        let rendered: Vec<String> = widths.iter().map(u8::to_string).collect();
        let source = format!("L({})", rendered.join(" "));
        let err = Format::parse(&source).unwrap_err();
        let is_misaligned = matches!(err, SchemaError::MisalignedBitGroup { .. });
        prop_assert!(is_misaligned);
    }
}
