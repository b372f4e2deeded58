//! Format-string parsing and validation.

use std::fmt;
use std::str::FromStr;

use wire::ByteOrder;

use crate::error::{LimitKind, SchemaError, SchemaResult};
use crate::{BitGroup, FormatLimits, Op, Scalar};

/// A parsed format string.
///
/// Parsing happens once; the resulting op list is what the interpreter
/// walks for every decode and encode. All structural errors (syntax, bit
/// widths, limits) surface here rather than on first use.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Format {
    source: String,
    byte_order: ByteOrder,
    ops: Vec<Op>,
}

impl Format {
    /// Parses a format string with default limits.
    pub fn parse(source: &str) -> SchemaResult<Self> {
        Self::parse_with_limits(source, &FormatLimits::default())
    }

    /// Parses a format string, enforcing `limits`.
    pub fn parse_with_limits(source: &str, limits: &FormatLimits) -> SchemaResult<Self> {
        let mut parser = Parser {
            src: source,
            pos: 0,
            limits,
        };
        let byte_order = parser.byte_order()?;
        let mut ops = Vec::new();
        while let Some(op) = parser.next_op()? {
            ops.push(op);
        }
        if ops.len() > limits.max_ops {
            return Err(SchemaError::LimitExceeded {
                kind: LimitKind::OpCount,
                limit: limits.max_ops,
                actual: ops.len(),
            });
        }
        Ok(Self {
            source: source.to_string(),
            byte_order,
            ops,
        })
    }

    /// Returns the original format string.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub const fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    #[must_use]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Byte length of the fixed portion; procfields count as zero.
    #[must_use]
    pub fn fixed_size(&self) -> usize {
        self.ops
            .iter()
            .fold(0usize, |acc, op| acc.saturating_add(op.fixed_size()))
    }

    /// Number of top-level slots a decode produces.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.ops.iter().map(Op::slot_count).sum()
    }

    /// Procfield names in the order they are referenced.
    pub fn procfield_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.ops.iter().filter_map(|op| match op {
            Op::Procfield(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

impl FromStr for Format {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    limits: &'a FormatLimits,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|ch| ch.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn digits(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn byte_order(&mut self) -> SchemaResult<ByteOrder> {
        let tag = self.bump();
        tag.and_then(ByteOrder::from_tag)
            .ok_or(SchemaError::InvalidByteOrder { found: tag })
    }

    fn next_op(&mut self) -> SchemaResult<Option<Op>> {
        self.skip_whitespace();
        let position = self.pos;
        let Some(ch) = self.bump() else {
            return Ok(None);
        };
        let op = match ch {
            '0'..='9' => {
                self.pos = position;
                self.repeat()?
            }
            '(' => Op::Bits(self.bit_group(position)?),
            '[' => Op::Procfield(self.procfield(position)?),
            ')' | ']' => {
                return Err(SchemaError::UnmatchedClose {
                    found: ch,
                    position,
                })
            }
            _ => Op::Scalar(
                Scalar::from_code(ch).ok_or(SchemaError::UnexpectedToken {
                    found: ch,
                    position,
                })?,
            ),
        };
        Ok(Some(op))
    }

    fn repeat(&mut self) -> SchemaResult<Op> {
        let position = self.pos;
        let count: usize = self
            .digits()
            .parse()
            .map_err(|_| SchemaError::InvalidRepeatCount { position })?;
        if count > self.limits.max_repeat {
            return Err(SchemaError::LimitExceeded {
                kind: LimitKind::RepeatCount,
                limit: self.limits.max_repeat,
                actual: count,
            });
        }
        let target = self.pos;
        let scalar = self
            .bump()
            .and_then(Scalar::from_code)
            .ok_or(SchemaError::MissingRepeatTarget { position: target })?;
        Ok(Op::Repeat { count, scalar })
    }

    fn bit_group(&mut self, open: usize) -> SchemaResult<BitGroup> {
        let mut widths = Vec::new();
        loop {
            self.skip_whitespace();
            let position = self.pos;
            match self.peek() {
                Some(')') => {
                    self.pos += 1;
                    break;
                }
                Some(ch) if ch.is_ascii_digit() => {
                    let width = self.digits().parse::<usize>().unwrap_or(usize::MAX);
                    let width = u8::try_from(width)
                        .ok()
                        .filter(|w| (1..=bitstream::MAX_FIELD_BITS).contains(w))
                        .ok_or(SchemaError::InvalidBitWidth { width, position })?;
                    widths.push(width);
                }
                Some(found) => return Err(SchemaError::UnexpectedToken { found, position }),
                None => {
                    return Err(SchemaError::Unterminated {
                        open: '(',
                        position: open,
                    })
                }
            }
        }

        let group = BitGroup::new(widths);
        if group.is_empty() {
            return Err(SchemaError::EmptyBitGroup { position: open });
        }
        let total_bits = group.total_bits();
        if total_bits % 8 != 0 {
            return Err(SchemaError::MisalignedBitGroup {
                total_bits,
                position: open,
            });
        }
        if total_bits > self.limits.max_group_bits {
            return Err(SchemaError::LimitExceeded {
                kind: LimitKind::GroupBits,
                limit: self.limits.max_group_bits,
                actual: total_bits,
            });
        }
        Ok(group)
    }

    fn procfield(&mut self, open: usize) -> SchemaResult<String> {
        let rest = &self.src[self.pos..];
        let end = rest.find(']').ok_or(SchemaError::Unterminated {
            open: '[',
            position: open,
        })?;
        let name = &rest[..end];
        if name.is_empty() {
            return Err(SchemaError::EmptyProcfieldName { position: open });
        }
        if let Some(nested) = name.find('[') {
            return Err(SchemaError::UnexpectedToken {
                found: '[',
                position: self.pos + nested,
            });
        }
        self.pos += end + 1;
        Ok(name.to_string())
    }
}
