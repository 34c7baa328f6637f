//! Typed Columns
//!
//! A `Column` is a named, homogeneous sequence of one scalar kind. The name
//! and byte layout live in its descriptor leaf (`Field`); the values live in a
//! `ColumnData` buffer whose variant always matches the descriptor's kind.
//!
//! ## Value Representation
//! - `Float64`, `Int32`, `Int64`: plain vectors
//! - `DateTimeNs`: `i64` nanoseconds since the Unix epoch, convertible to
//!   `chrono::DateTime<Utc>` through `datetime_at` / `Column::datetimes`
//! - `FixedString`, `FixedUnicode`: owned strings; the fixed width only
//!   matters when packing rows (values longer than the width are truncated)
//!
//! ## Example
//! ```ignore
//! let mut close = Column::float64("Close", vec![101.5, 102.0]);
//! close.push(Value::Float64(103.25))?;
//! close.set(0, Value::Float64(101.75))?;
//! assert_eq!(close.get(2), Some(Value::Float64(103.25)));
//! ```

use std::fmt;
use std::ops::Range;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

use crate::dtype::{Field, Scalar, ScalarKind, TypeDescriptor};
use crate::error::{Error, Result};

/// Backing buffer of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Float64(Vec<f64>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    DateTimeNs(Vec<i64>),
    FixedString(Vec<String>),
    FixedUnicode(Vec<String>),
}

impl ColumnData {
    /// Empty buffer for `kind` with room for `capacity` values
    pub fn with_capacity(kind: ScalarKind, capacity: usize) -> Self {
        match kind {
            ScalarKind::Float64 => ColumnData::Float64(Vec::with_capacity(capacity)),
            ScalarKind::Int32 => ColumnData::Int32(Vec::with_capacity(capacity)),
            ScalarKind::Int64 => ColumnData::Int64(Vec::with_capacity(capacity)),
            ScalarKind::DateTimeNs => ColumnData::DateTimeNs(Vec::with_capacity(capacity)),
            ScalarKind::FixedString(_) => ColumnData::FixedString(Vec::with_capacity(capacity)),
            ScalarKind::FixedUnicode(_) => ColumnData::FixedUnicode(Vec::with_capacity(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Float64(v) => v.len(),
            ColumnData::Int32(v) => v.len(),
            ColumnData::Int64(v) | ColumnData::DateTimeNs(v) => v.len(),
            ColumnData::FixedString(v) | ColumnData::FixedUnicode(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind_name(&self) -> &'static str {
        match self {
            ColumnData::Float64(_) => "float64",
            ColumnData::Int32(_) => "int32",
            ColumnData::Int64(_) => "int64",
            ColumnData::DateTimeNs(_) => "datetime64[ns]",
            ColumnData::FixedString(_) => "fixed string",
            ColumnData::FixedUnicode(_) => "fixed unicode",
        }
    }

    fn matches(&self, kind: ScalarKind) -> bool {
        matches!(
            (self, kind),
            (ColumnData::Float64(_), ScalarKind::Float64)
                | (ColumnData::Int32(_), ScalarKind::Int32)
                | (ColumnData::Int64(_), ScalarKind::Int64)
                | (ColumnData::DateTimeNs(_), ScalarKind::DateTimeNs)
                | (ColumnData::FixedString(_), ScalarKind::FixedString(_))
                | (ColumnData::FixedUnicode(_), ScalarKind::FixedUnicode(_))
        )
    }

    fn slice(&self, range: Range<usize>) -> Self {
        match self {
            ColumnData::Float64(v) => ColumnData::Float64(v[range].to_vec()),
            ColumnData::Int32(v) => ColumnData::Int32(v[range].to_vec()),
            ColumnData::Int64(v) => ColumnData::Int64(v[range].to_vec()),
            ColumnData::DateTimeNs(v) => ColumnData::DateTimeNs(v[range].to_vec()),
            ColumnData::FixedString(v) => ColumnData::FixedString(v[range].to_vec()),
            ColumnData::FixedUnicode(v) => ColumnData::FixedUnicode(v[range].to_vec()),
        }
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float64(f64),
    Int32(i32),
    Int64(i64),
    DateTimeNs(i64),
    Text(String),
}

impl Value {
    fn kind_name(&self) -> &'static str {
        match self {
            Value::Float64(_) => "float64",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::DateTimeNs(_) => "datetime64[ns]",
            Value::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float64(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::DateTimeNs(ns) => write!(
                f,
                "{}",
                Utc.timestamp_nanos(*ns)
                    .to_rfc3339_opts(SecondsFormat::AutoSi, true)
            ),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub(crate) name: String,
    pub(crate) scalar: Scalar,
    pub(crate) data: ColumnData,
}

impl Column {
    /// Build a column, checking that `data` matches `scalar.kind` and that the
    /// kind has a printable width.
    pub fn new(name: impl Into<String>, scalar: Scalar, data: ColumnData) -> Result<Self> {
        let name = name.into();
        TypeDescriptor::Scalar(scalar).validate()?;
        if !data.matches(scalar.kind) {
            return Err(Error::TypeMismatch {
                column: name,
                expected: scalar.kind.code(),
                actual: data.kind_name().to_string(),
            });
        }
        Ok(Self { name, scalar, data })
    }

    pub fn empty(name: impl Into<String>, scalar: Scalar) -> Self {
        Self {
            name: name.into(),
            scalar,
            data: ColumnData::with_capacity(scalar.kind, 0),
        }
    }

    pub fn float64(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            scalar: Scalar::little(ScalarKind::Float64),
            data: ColumnData::Float64(values),
        }
    }

    pub fn int32(name: impl Into<String>, values: Vec<i32>) -> Self {
        Self {
            name: name.into(),
            scalar: Scalar::little(ScalarKind::Int32),
            data: ColumnData::Int32(values),
        }
    }

    pub fn int64(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            scalar: Scalar::little(ScalarKind::Int64),
            data: ColumnData::Int64(values),
        }
    }

    /// Time column from raw epoch nanoseconds
    pub fn datetime_ns(name: impl Into<String>, nanos: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            scalar: Scalar::little(ScalarKind::DateTimeNs),
            data: ColumnData::DateTimeNs(nanos),
        }
    }

    /// Time column from calendar timestamps.
    ///
    /// Fails for instants outside the range `i64` nanoseconds can express
    /// (roughly 1677-09-21 to 2262-04-11).
    pub fn datetimes(name: impl Into<String>, values: &[DateTime<Utc>]) -> Result<Self> {
        let name = name.into();
        let mut nanos = Vec::with_capacity(values.len());
        for value in values {
            match value.timestamp_nanos_opt() {
                Some(ns) => nanos.push(ns),
                None => {
                    return Err(Error::TypeMismatch {
                        column: name,
                        expected: "M8[ns]".to_string(),
                        actual: value.to_rfc3339(),
                    })
                }
            }
        }
        Ok(Self::datetime_ns(name, nanos))
    }

    pub fn fixed_string(name: impl Into<String>, width: usize, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            scalar: Scalar::little(ScalarKind::FixedString(width)),
            data: ColumnData::FixedString(values),
        }
    }

    pub fn fixed_unicode(name: impl Into<String>, width: usize, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            scalar: Scalar::little(ScalarKind::FixedUnicode(width)),
            data: ColumnData::FixedUnicode(values),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn scalar(&self) -> Scalar {
        self.scalar
    }

    pub fn kind(&self) -> ScalarKind {
        self.scalar.kind
    }

    /// Descriptor leaf for this column
    pub fn field(&self) -> Field {
        Field::new(self.name.clone(), TypeDescriptor::Scalar(self.scalar))
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<Value> {
        match &self.data {
            ColumnData::Float64(v) => v.get(row).map(|x| Value::Float64(*x)),
            ColumnData::Int32(v) => v.get(row).map(|x| Value::Int32(*x)),
            ColumnData::Int64(v) => v.get(row).map(|x| Value::Int64(*x)),
            ColumnData::DateTimeNs(v) => v.get(row).map(|x| Value::DateTimeNs(*x)),
            ColumnData::FixedString(v) | ColumnData::FixedUnicode(v) => {
                v.get(row).map(|s| Value::Text(s.clone()))
            }
        }
    }

    /// Overwrite one value in place
    pub fn set(&mut self, row: usize, value: Value) -> Result<()> {
        let len = self.len();
        if row >= len {
            return Err(Error::RowOutOfBounds {
                column: self.name.clone(),
                row,
                len,
            });
        }
        let outcome = match (&mut self.data, value) {
            (ColumnData::Float64(v), Value::Float64(x)) => {
                v[row] = x;
                Ok(())
            }
            (ColumnData::Int32(v), Value::Int32(x)) => {
                v[row] = x;
                Ok(())
            }
            (ColumnData::Int64(v), Value::Int64(x)) => {
                v[row] = x;
                Ok(())
            }
            (ColumnData::DateTimeNs(v), Value::DateTimeNs(x)) => {
                v[row] = x;
                Ok(())
            }
            (ColumnData::FixedString(v), Value::Text(x))
            | (ColumnData::FixedUnicode(v), Value::Text(x)) => {
                v[row] = x;
                Ok(())
            }
            (_, value) => Err(value),
        };
        outcome.map_err(|value| self.mismatch(&value))
    }

    /// Grow by one value
    pub fn push(&mut self, value: Value) -> Result<()> {
        let outcome = match (&mut self.data, value) {
            (ColumnData::Float64(v), Value::Float64(x)) => {
                v.push(x);
                Ok(())
            }
            (ColumnData::Int32(v), Value::Int32(x)) => {
                v.push(x);
                Ok(())
            }
            (ColumnData::Int64(v), Value::Int64(x)) => {
                v.push(x);
                Ok(())
            }
            (ColumnData::DateTimeNs(v), Value::DateTimeNs(x)) => {
                v.push(x);
                Ok(())
            }
            (ColumnData::FixedString(v), Value::Text(x))
            | (ColumnData::FixedUnicode(v), Value::Text(x)) => {
                v.push(x);
                Ok(())
            }
            (_, value) => Err(value),
        };
        outcome.map_err(|value| self.mismatch(&value))
    }

    /// Append every value of `other`, which must have the same kind
    pub fn extend_from(&mut self, other: &Column) -> Result<()> {
        match (&mut self.data, &other.data) {
            (ColumnData::Float64(a), ColumnData::Float64(b)) => a.extend_from_slice(b),
            (ColumnData::Int32(a), ColumnData::Int32(b)) => a.extend_from_slice(b),
            (ColumnData::Int64(a), ColumnData::Int64(b)) => a.extend_from_slice(b),
            (ColumnData::DateTimeNs(a), ColumnData::DateTimeNs(b)) => a.extend_from_slice(b),
            (ColumnData::FixedString(a), ColumnData::FixedString(b))
            | (ColumnData::FixedUnicode(a), ColumnData::FixedUnicode(b)) => {
                a.extend_from_slice(b)
            }
            _ => {
                return Err(Error::TypeMismatch {
                    column: self.name.clone(),
                    expected: self.scalar.kind.code(),
                    actual: other.data.kind_name().to_string(),
                })
            }
        }
        Ok(())
    }

    /// Copy of rows `range`, clamped to the column length
    pub fn slice(&self, range: Range<usize>) -> Column {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        Column {
            name: self.name.clone(),
            scalar: self.scalar,
            data: self.data.slice(start..end),
        }
    }

    pub fn datetime_at(&self, row: usize) -> Option<DateTime<Utc>> {
        self.as_datetime_ns()?
            .get(row)
            .map(|ns| Utc.timestamp_nanos(*ns))
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match &self.data {
            ColumnData::Float64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<&[i32]> {
        match &self.data {
            ColumnData::Int32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<&[i64]> {
        match &self.data {
            ColumnData::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_datetime_ns(&self) -> Option<&[i64]> {
        match &self.data {
            ColumnData::DateTimeNs(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&[String]> {
        match &self.data {
            ColumnData::FixedString(v) | ColumnData::FixedUnicode(v) => Some(v),
            _ => None,
        }
    }

    fn mismatch(&self, value: &Value) -> Error {
        Error::TypeMismatch {
            column: self.name.clone(),
            expected: self.scalar.kind.code(),
            actual: value.kind_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::Endian;

    #[test]
    fn test_new_rejects_mismatched_buffer() {
        let err = Column::new(
            "px",
            Scalar::little(ScalarKind::Float64),
            ColumnData::Int64(vec![1]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));

        let ok = Column::new(
            "sym",
            Scalar::new(ScalarKind::FixedUnicode(4), Endian::Big),
            ColumnData::FixedUnicode(vec!["AAPL".to_string()]),
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_new_rejects_zero_width_text() {
        let err = Column::new(
            "tag",
            Scalar::little(ScalarKind::FixedString(0)),
            ColumnData::FixedString(vec![String::new()]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedLayout(_)));

        let err = Column::new(
            "tag",
            Scalar::little(ScalarKind::FixedUnicode(0)),
            ColumnData::FixedUnicode(vec![]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedLayout(_)));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Float64(1.5).to_string(), "1.5");
        assert_eq!(Value::Int32(-7).to_string(), "-7");
        assert_eq!(Value::Text("AAPL".to_string()).to_string(), "AAPL");
        assert_eq!(
            Value::DateTimeNs(1_500_000_000).to_string(),
            "1970-01-01T00:00:01.500Z"
        );
    }

    #[test]
    fn test_get_set_push() {
        let mut col = Column::int64("qty", vec![1, 2]);
        col.push(Value::Int64(3)).unwrap();
        col.set(0, Value::Int64(10)).unwrap();

        assert_eq!(col.len(), 3);
        assert_eq!(col.get(0), Some(Value::Int64(10)));
        assert_eq!(col.get(2), Some(Value::Int64(3)));
        assert_eq!(col.get(3), None);
    }

    #[test]
    fn test_set_out_of_bounds_and_wrong_type() {
        let mut col = Column::float64("px", vec![1.0]);
        assert!(matches!(
            col.set(5, Value::Float64(2.0)),
            Err(Error::RowOutOfBounds { row: 5, len: 1, .. })
        ));
        assert!(matches!(
            col.push(Value::Text("x".to_string())),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_slice_is_clamped_and_independent() {
        let col = Column::fixed_string("sym", 4, vec!["A".into(), "B".into(), "C".into()]);
        let mut sliced = col.slice(1..10);
        sliced.rename("renamed");

        assert_eq!(sliced.as_text().unwrap(), &["B".to_string(), "C".to_string()]);
        assert_eq!(col.name(), "sym");
        assert!(col.slice(5..7).is_empty());
    }

    #[test]
    fn test_extend_from() {
        let mut a = Column::int32("n", vec![1, 2]);
        a.extend_from(&Column::int32("n", vec![3])).unwrap();
        assert_eq!(a.as_i32().unwrap(), &[1, 2, 3]);

        assert!(a.extend_from(&Column::int64("n", vec![4])).is_err());
    }

    #[test]
    fn test_datetime_conversion() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
        let col = Column::datetimes("ts", &[ts]).unwrap();

        assert_eq!(col.as_datetime_ns().unwrap()[0], 1_704_187_800_000_000_000);
        assert_eq!(col.datetime_at(0), Some(ts));
        assert_eq!(col.datetime_at(1), None);
        assert_eq!(col.field().dtype.to_string(), "'<M8[ns]'");
    }

    #[test]
    fn test_field_carries_name() {
        let col = Column::fixed_unicode("venue", 3, vec![]);
        let field = col.field();
        assert_eq!(field.name, "venue");
        assert_eq!(field.dtype.itemsize(), 12);
    }
}
