//! Structured Type Descriptors
//!
//! A `TypeDescriptor` describes the packed byte layout of one row. It is written
//! in a small numpy-dtype-style language and is the schema contract shared by
//! the column codec, the segment store and the persisted version documents.
//!
//! ## Grammar
//!
//! ```text
//! dtype   := scalar | '[' field (',' field)* ']'
//! field   := '(' name ',' dtype ')'
//! scalar  := quote endian? code quote
//! code    := 'f8' | 'i8' | 'i4' | 'M8[ns]' | 'S' digits | 'U' digits
//! endian  := '<' | '>' | '='
//! ```
//!
//! ## Layout
//!
//! | Code     | Kind          | Width    |
//! |----------|---------------|----------|
//! | `f8`     | `Float64`     | 8        |
//! | `i4`     | `Int32`       | 4        |
//! | `i8`     | `Int64`       | 8        |
//! | `M8[ns]` | `DateTimeNs`  | 8        |
//! | `S<n>`   | `FixedString` | n        |
//! | `U<n>`   | `FixedUnicode`| 4 * n    |
//!
//! Records have no padding: the offset of field `i` is the sum of the widths
//! of fields `0..i`, and the record width is the sum of all field widths.
//!
//! ## Example
//! ```ignore
//! let dtype = TypeDescriptor::parse("[('Open', '<f8'), ('Volume', '<i8')]")?;
//! assert_eq!(dtype.itemsize(), 16);
//! assert_eq!(dtype.field_offset(1), Some(8));
//! assert_eq!(dtype.to_string(), "[('Open', '<f8'), ('Volume', '<i8')]");
//! ```

mod parser;

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Byte order of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    /// `<`
    Little,
    /// `>`
    Big,
    /// `=` or no marker: the host byte order
    Native,
}

impl Endian {
    pub fn marker(self) -> char {
        match self {
            Endian::Little => '<',
            Endian::Big => '>',
            Endian::Native => '=',
        }
    }

    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            '<' => Some(Endian::Little),
            '>' => Some(Endian::Big),
            '=' => Some(Endian::Native),
            _ => None,
        }
    }

    /// Whether values are stored least significant byte first on this host.
    pub fn is_little(self) -> bool {
        match self {
            Endian::Little => true,
            Endian::Big => false,
            Endian::Native => cfg!(target_endian = "little"),
        }
    }
}

/// Scalar kinds a column can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Float64,
    Int32,
    Int64,
    /// Nanoseconds since 1970-01-01T00:00:00Z
    DateTimeNs,
    /// `n` single-byte characters
    FixedString(usize),
    /// `n` UTF-32 code units (4 * n bytes)
    FixedUnicode(usize),
}

impl ScalarKind {
    /// Width of one value in bytes
    pub fn width(self) -> usize {
        match self {
            ScalarKind::Float64 | ScalarKind::Int64 | ScalarKind::DateTimeNs => 8,
            ScalarKind::Int32 => 4,
            ScalarKind::FixedString(n) => n,
            ScalarKind::FixedUnicode(n) => n.saturating_mul(4),
        }
    }

    /// Type code without the byte-order marker
    pub fn code(self) -> String {
        match self {
            ScalarKind::Float64 => "f8".to_string(),
            ScalarKind::Int32 => "i4".to_string(),
            ScalarKind::Int64 => "i8".to_string(),
            ScalarKind::DateTimeNs => "M8[ns]".to_string(),
            ScalarKind::FixedString(n) => format!("S{n}"),
            ScalarKind::FixedUnicode(n) => format!("U{n}"),
        }
    }

    pub fn is_time(self) -> bool {
        matches!(self, ScalarKind::DateTimeNs)
    }

    pub fn is_text(self) -> bool {
        matches!(self, ScalarKind::FixedString(_) | ScalarKind::FixedUnicode(_))
    }
}

/// A leaf of a descriptor: kind plus byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scalar {
    pub kind: ScalarKind,
    pub endian: Endian,
}

impl Scalar {
    pub fn new(kind: ScalarKind, endian: Endian) -> Self {
        Self { kind, endian }
    }

    /// Little-endian scalar, the canonical form columns are built with.
    pub fn little(kind: ScalarKind) -> Self {
        Self::new(kind, Endian::Little)
    }

    pub fn width(&self) -> usize {
        self.kind.width()
    }

    /// Layout equality with `Native` resolved to the host order.
    /// Single-byte strings have no byte order.
    pub fn layout_eq(&self, other: &Scalar) -> bool {
        if self.kind != other.kind {
            return false;
        }
        match self.kind {
            ScalarKind::FixedString(_) => true,
            _ => self.endian.is_little() == other.endian.is_little(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.endian.marker(), self.kind.code())
    }
}

/// A named member of a record descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub dtype: TypeDescriptor,
}

impl Field {
    pub fn new(name: impl Into<String>, dtype: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            dtype,
        }
    }

    pub fn scalar(name: impl Into<String>, scalar: Scalar) -> Self {
        Self::new(name, TypeDescriptor::Scalar(scalar))
    }
}

/// Parsed structured type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    Scalar(Scalar),
    Record(Vec<Field>),
}

impl TypeDescriptor {
    /// Parse descriptor text.
    ///
    /// Anything after the top-level scalar or the closing `]` is ignored.
    pub fn parse(text: &str) -> Result<Self> {
        parser::parse(text)
    }

    pub fn record(fields: Vec<Field>) -> Self {
        TypeDescriptor::Record(fields)
    }

    /// Total width in bytes (the row stride for a record)
    pub fn itemsize(&self) -> usize {
        match self {
            TypeDescriptor::Scalar(scalar) => scalar.width(),
            TypeDescriptor::Record(fields) => fields
                .iter()
                .fold(0usize, |acc, f| acc.saturating_add(f.dtype.itemsize())),
        }
    }

    /// Fields of a record; empty for a scalar
    pub fn fields(&self) -> &[Field] {
        match self {
            TypeDescriptor::Scalar(_) => &[],
            TypeDescriptor::Record(fields) => fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// Byte offset of field `i` inside one row
    pub fn field_offset(&self, i: usize) -> Option<usize> {
        let fields = self.fields();
        if i >= fields.len() {
            return None;
        }
        Some(
            fields[..i]
                .iter()
                .fold(0usize, |acc, f| acc.saturating_add(f.dtype.itemsize())),
        )
    }

    /// Offsets of every field, in order
    pub fn offsets(&self) -> Vec<usize> {
        let mut offset: usize = 0;
        self.fields()
            .iter()
            .map(|f| {
                let start = offset;
                offset = offset.saturating_add(f.dtype.itemsize());
                start
            })
            .collect()
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            TypeDescriptor::Scalar(scalar) => Some(scalar),
            TypeDescriptor::Record(_) => None,
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, TypeDescriptor::Record(_))
    }

    /// Check that the descriptor prints as text `parse` accepts back.
    ///
    /// Descriptors built in code can hold empty records, zero-length text
    /// codes, names using both quote characters or a stride past `usize::MAX`.
    pub fn validate(&self) -> Result<()> {
        match self {
            TypeDescriptor::Scalar(scalar) => match scalar.kind {
                ScalarKind::FixedString(0) | ScalarKind::FixedUnicode(0) => Err(
                    Error::UnsupportedLayout(format!("zero-length text code '{scalar}'")),
                ),
                ScalarKind::FixedUnicode(n) if n.checked_mul(4).is_none() => Err(
                    Error::UnsupportedLayout(format!("text code '{scalar}' is too wide")),
                ),
                _ => Ok(()),
            },
            TypeDescriptor::Record(fields) if fields.is_empty() => Err(
                Error::UnsupportedLayout("record without fields".to_string()),
            ),
            TypeDescriptor::Record(fields) => {
                let mut stride = 0usize;
                for field in fields {
                    if field.name.contains('\'') && field.name.contains('"') {
                        return Err(Error::UnsupportedLayout(format!(
                            "field name {:?} uses both quote characters",
                            field.name
                        )));
                    }
                    field.dtype.validate()?;
                    stride = stride.checked_add(field.dtype.itemsize()).ok_or_else(|| {
                        Error::UnsupportedLayout(format!("record stride overflows at {}", field.name))
                    })?;
                }
                Ok(())
            }
        }
    }

    /// Structural equality with byte orders resolved against the host.
    ///
    /// `'=f8'` and `'<f8'` describe the same bytes on a little-endian host, so
    /// they are layout-equal there even though they print differently.
    pub fn layout_eq(&self, other: &TypeDescriptor) -> bool {
        match (self, other) {
            (TypeDescriptor::Scalar(a), TypeDescriptor::Scalar(b)) => a.layout_eq(b),
            (TypeDescriptor::Record(a), TypeDescriptor::Record(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|(x, y)| x.name == y.name && x.dtype.layout_eq(&y.dtype))
            }
            _ => false,
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TypeDescriptor::parse(s)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Scalar(scalar) => write!(f, "'{scalar}'"),
            TypeDescriptor::Record(fields) => {
                f.write_str("[")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    let quote = if field.name.contains('\'') { '"' } else { '\'' };
                    write!(f, "({quote}{}{quote}, {})", field.name, field.dtype)?;
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ohlc_example() {
        let dtype = TypeDescriptor::parse("[('Open', '<f8'), ('Volume', '<i8')]").unwrap();

        assert_eq!(dtype.fields().len(), 2);
        assert_eq!(dtype.fields()[0].name, "Open");
        assert_eq!(dtype.fields()[1].name, "Volume");
        assert_eq!(dtype.field_offset(0), Some(0));
        assert_eq!(dtype.field_offset(1), Some(8));
        assert_eq!(dtype.field_offset(2), None);
        assert_eq!(dtype.itemsize(), 16);
    }

    #[test]
    fn test_scalar_widths() {
        let cases = [
            ("'<f8'", 8),
            ("'<i4'", 4),
            ("'<i8'", 8),
            ("'<M8[ns]'", 8),
            ("'S12'", 12),
            ("'<U5'", 20),
        ];
        for (text, width) in cases {
            let dtype = TypeDescriptor::parse(text).unwrap();
            assert_eq!(dtype.itemsize(), width, "width of {text}");
        }
    }

    #[test]
    fn test_display_roundtrip_every_scalar_code() {
        for code in ["f8", "i4", "i8", "M8[ns]", "S3", "U7"] {
            for marker in ["", "<", ">", "="] {
                let text = format!("'{marker}{code}'");
                let parsed = TypeDescriptor::parse(&text).unwrap();
                let reparsed = TypeDescriptor::parse(&parsed.to_string()).unwrap();
                assert_eq!(parsed, reparsed, "roundtrip of {text}");
            }
        }
    }

    #[test]
    fn test_display_regenerates_markers() {
        let dtype = TypeDescriptor::parse("[('a', '>i4'), ('b', 'f8'), ('c', '<U2')]").unwrap();
        assert_eq!(dtype.to_string(), "[('a', '>i4'), ('b', '=f8'), ('c', '<U2')]");
    }

    #[test]
    fn test_nested_record_display() {
        let text = "[('quote', [('bid', '<f8'), ('ask', '<f8')]), ('size', '<i4')]";
        let dtype = TypeDescriptor::parse(text).unwrap();
        assert_eq!(dtype.to_string(), text);
        assert_eq!(dtype.itemsize(), 20);
        assert_eq!(dtype.offsets(), vec![0, 16]);
    }

    #[test]
    fn test_whitespace_and_double_quotes() {
        let dtype = TypeDescriptor::parse(" [ ( \"px\" , '<f8' ) ,('qty','<i8') ] ").unwrap();
        assert_eq!(dtype.to_string(), "[('px', '<f8'), ('qty', '<i8')]");
    }

    #[test]
    fn test_name_with_single_quote_uses_double_quotes() {
        let dtype = TypeDescriptor::record(vec![Field::scalar(
            "it's",
            Scalar::little(ScalarKind::Int64),
        )]);
        let text = dtype.to_string();
        assert_eq!(text, "[(\"it's\", '<i8')]");
        assert_eq!(TypeDescriptor::parse(&text).unwrap(), dtype);
    }

    #[test]
    fn test_unknown_code_reports_position() {
        let err = TypeDescriptor::parse("[('Open', '<f4')]").unwrap_err();
        match err {
            Error::Parse { position, .. } => assert_eq!(position, 12),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_closing_bracket() {
        let err = TypeDescriptor::parse("[('Open', '<f8')").unwrap_err();
        match err {
            Error::Parse {
                position,
                expected,
                found,
            } => {
                assert_eq!(position, 16);
                assert_eq!(expected, "',' or ']'");
                assert_eq!(found, "end of input");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_length_string_rejected() {
        assert!(matches!(
            TypeDescriptor::parse("'S0'"),
            Err(Error::Parse { position: 2, .. })
        ));
        assert!(TypeDescriptor::parse("'U'").is_err());
    }

    #[test]
    fn test_record_stride_overflow_rejected() {
        let text = "[('a', 'S18446744073709551615'), ('b', 'S2')]";
        match TypeDescriptor::parse(text) {
            Err(Error::Parse { position, expected, .. }) => {
                assert_eq!(position, 32);
                assert!(expected.contains("stride"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }

        // A single field may use the whole address space
        let wide = TypeDescriptor::parse("[('a', 'S18446744073709551615')]").unwrap();
        assert_eq!(wide.itemsize(), usize::MAX);
    }

    #[test]
    fn test_validate_rejects_unprintable_descriptors() {
        let zero = TypeDescriptor::record(vec![
            Field::scalar("ts", Scalar::little(ScalarKind::DateTimeNs)),
            Field::scalar("tag", Scalar::little(ScalarKind::FixedString(0))),
        ]);
        assert!(matches!(zero.validate(), Err(Error::UnsupportedLayout(_))));
        assert!(TypeDescriptor::parse(&zero.to_string()).is_err());

        let quotes = TypeDescriptor::record(vec![Field::scalar(
            "it's \"x\"",
            Scalar::little(ScalarKind::Int64),
        )]);
        assert!(matches!(quotes.validate(), Err(Error::UnsupportedLayout(_))));

        let wide = TypeDescriptor::record(vec![
            Field::scalar("a", Scalar::little(ScalarKind::FixedString(usize::MAX))),
            Field::scalar("b", Scalar::little(ScalarKind::Int32)),
        ]);
        assert!(matches!(wide.validate(), Err(Error::UnsupportedLayout(_))));
        assert!(TypeDescriptor::record(vec![]).validate().is_err());

        let ok = TypeDescriptor::parse("[('a', '<f8'), ('b', [('c', '<U3')])]").unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_unterminated_name() {
        assert!(matches!(
            TypeDescriptor::parse("[('Open, '<f8')]"),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            TypeDescriptor::parse("   "),
            Err(Error::Parse { position: 3, .. })
        ));
    }

    #[test]
    fn test_trailing_text_is_ignored() {
        let dtype = TypeDescriptor::parse("'<f8' garbage").unwrap();
        assert_eq!(dtype, TypeDescriptor::Scalar(Scalar::little(ScalarKind::Float64)));

        let dtype = TypeDescriptor::parse("[('a', '<i4')]]]").unwrap();
        assert_eq!(dtype.itemsize(), 4);
    }

    #[test]
    fn test_layout_eq_resolves_native() {
        let native = TypeDescriptor::parse("[('a', '=f8')]").unwrap();
        let little = TypeDescriptor::parse("[('a', '<f8')]").unwrap();
        let big = TypeDescriptor::parse("[('a', '>f8')]").unwrap();

        assert_ne!(native, little);
        assert_eq!(native.layout_eq(&little), cfg!(target_endian = "little"));
        assert!(!little.layout_eq(&big));
    }

    #[test]
    fn test_layout_eq_checks_names_and_strings() {
        let a = TypeDescriptor::parse("[('a', '<S4')]").unwrap();
        let b = TypeDescriptor::parse("[('a', '>S4')]").unwrap();
        let c = TypeDescriptor::parse("[('b', '<S4')]").unwrap();
        assert!(a.layout_eq(&b));
        assert!(!a.layout_eq(&c));
    }

    #[test]
    fn test_from_str() {
        let dtype: TypeDescriptor = "'<M8[ns]'".parse().unwrap();
        assert!(dtype.as_scalar().unwrap().kind.is_time());
        assert!(!dtype.is_record());
    }
}
