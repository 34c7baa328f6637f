//! Recursive-descent parser for descriptor text.
//!
//! Positions in errors are byte offsets into the original text.

use super::{Endian, Field, Scalar, ScalarKind, TypeDescriptor};
use crate::error::{Error, Result};

/// Fixed codes, longest-prefix-free so order does not matter.
const FIXED_CODES: [(&str, ScalarKind); 4] = [
    ("f8", ScalarKind::Float64),
    ("i8", ScalarKind::Int64),
    ("i4", ScalarKind::Int32),
    ("M8[ns]", ScalarKind::DateTimeNs),
];

pub(super) fn parse(text: &str) -> Result<TypeDescriptor> {
    Parser { text, pos: 0 }.dtype()
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn error<T>(&self, expected: impl Into<String>) -> Result<T> {
        let found = if self.rest().is_empty() {
            "end of input".to_string()
        } else {
            let snippet: String = self.rest().chars().take(8).collect();
            format!("{snippet:?}")
        };
        Err(Error::Parse {
            position: self.pos,
            expected: expected.into(),
            found,
        })
    }

    fn expect(&mut self, c: char) -> Result<()> {
        self.skip_whitespace();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            self.error(format!("'{c}'"))
        }
    }

    fn dtype(&mut self) -> Result<TypeDescriptor> {
        self.skip_whitespace();
        match self.peek() {
            Some('[') => self.record(),
            Some('\'') | Some('"') => self.scalar().map(TypeDescriptor::Scalar),
            _ => self.error("'[' or a quoted scalar code"),
        }
    }

    fn record(&mut self) -> Result<TypeDescriptor> {
        self.expect('[')?;
        let mut fields = Vec::new();
        let mut stride = 0usize;
        loop {
            let start = self.pos;
            let field = self.field()?;
            stride = match stride.checked_add(field.dtype.itemsize()) {
                Some(stride) => stride,
                None => {
                    self.pos = start;
                    return self.error("a record stride that fits in usize");
                }
            };
            fields.push(field);

            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {
                    self.pos += 1;
                    return Ok(TypeDescriptor::Record(fields));
                }
                _ => return self.error("',' or ']'"),
            }
        }
    }

    fn field(&mut self) -> Result<Field> {
        self.expect('(')?;
        self.skip_whitespace();
        let name = self.quoted()?;
        self.expect(',')?;
        let dtype = self.dtype()?;
        self.expect(')')?;
        Ok(Field { name, dtype })
    }

    fn quoted(&mut self) -> Result<String> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return self.error("quoted field name"),
        };
        self.pos += 1;
        match self.rest().find(quote) {
            Some(len) => {
                let name = self.rest()[..len].to_string();
                self.pos += len + 1;
                Ok(name)
            }
            None => {
                self.pos = self.text.len();
                self.error(format!("closing {quote}"))
            }
        }
    }

    fn scalar(&mut self) -> Result<Scalar> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return self.error("quoted scalar code"),
        };
        self.pos += 1;

        let endian = match self.peek().and_then(Endian::from_marker) {
            Some(endian) => {
                self.pos += 1;
                endian
            }
            None => Endian::Native,
        };
        let kind = self.scalar_kind()?;

        if self.peek() != Some(quote) {
            return self.error(format!("closing {quote}"));
        }
        self.pos += 1;

        Ok(Scalar { kind, endian })
    }

    fn scalar_kind(&mut self) -> Result<ScalarKind> {
        for (code, kind) in FIXED_CODES {
            if self.rest().starts_with(code) {
                self.pos += code.len();
                return Ok(kind);
            }
        }

        match self.peek() {
            Some('S') => {
                self.pos += 1;
                Ok(ScalarKind::FixedString(self.length(1)?))
            }
            Some('U') => {
                self.pos += 1;
                Ok(ScalarKind::FixedUnicode(self.length(4)?))
            }
            _ => self.error("scalar code (f8, i4, i8, M8[ns], S<n> or U<n>)"),
        }
    }

    /// Character count of a text code; `unit` is the byte width of one char.
    fn length(&mut self, unit: usize) -> Result<usize> {
        let digits = self
            .rest()
            .bytes()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits == 0 {
            return self.error("length digits");
        }

        let n = match self.rest()[..digits].parse::<usize>() {
            Ok(n) if n > 0 && n.checked_mul(unit).is_some() => n,
            _ => return self.error("a positive length"),
        };
        self.pos += digits;
        Ok(n)
    }
}
