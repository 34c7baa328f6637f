//! Dataframes
//!
//! A `Dataframe` is an ordered collection of uniquely named columns plus an
//! optional index column. It is what callers hand to the segment store and
//! what reads hand back.
//!
//! ## Shape
//! - **Schema**: a record descriptor concatenating the column fields in order
//! - **Rows**: the longest column's length; shorter columns pack as zero bytes
//! - **Index**: one distinguished column, required before persisting. A
//!   `DateTimeNs` index enables replay detection on append.
//!
//! ## Example
//! ```ignore
//! let df = Dataframe::new(vec![
//!     Column::datetime_ns("ts", vec![1, 2, 3]),
//!     Column::float64("Close", vec![10.0, 10.5, 10.25]),
//! ])?
//! .with_index("ts")?;
//!
//! assert_eq!(df.dtype().to_string(), "[('ts', '<M8[ns]'), ('Close', '<f8')]");
//! let tail = df.slice(1..3);
//! ```

use std::ops::Range;

use crate::column::Column;
use crate::dtype::TypeDescriptor;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataframe {
    columns: Vec<Column>,
    index: Option<usize>,
}

impl Dataframe {
    /// Build a frame from columns with unique names
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name() == column.name()) {
                return Err(Error::DuplicateColumn(column.name().to_string()));
            }
        }
        Ok(Self {
            columns,
            index: None,
        })
    }

    /// Builder form of `set_index`
    pub fn with_index(mut self, name: &str) -> Result<Self> {
        self.set_index(name)?;
        Ok(self)
    }

    pub fn set_index(&mut self, name: &str) -> Result<()> {
        let position = self
            .columns
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
        self.index = Some(position);
        Ok(())
    }

    pub fn index(&self) -> Option<&Column> {
        self.index.map(|i| &self.columns[i])
    }

    pub fn index_name(&self) -> Option<&str> {
        self.index().map(Column::name)
    }

    /// The index column, or `MissingIndex`
    pub fn require_index(&self) -> Result<&Column> {
        self.index().ok_or(Error::MissingIndex)
    }

    /// Index values when the index is time-typed
    pub fn time_index(&self) -> Option<&[i64]> {
        self.index()?.as_datetime_ns()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name() == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.column(column.name()).is_some() {
            return Err(Error::DuplicateColumn(column.name().to_string()));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Row count: the longest column
    pub fn len(&self) -> usize {
        self.columns.iter().map(Column::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record descriptor of one packed row
    pub fn dtype(&self) -> TypeDescriptor {
        TypeDescriptor::Record(self.columns.iter().map(Column::field).collect())
    }

    /// Copy of rows `range` (clamped), keeping the index
    pub fn slice(&self, range: Range<usize>) -> Dataframe {
        Dataframe {
            columns: self
                .columns
                .iter()
                .map(|c| c.slice(range.clone()))
                .collect(),
            index: self.index,
        }
    }

    /// Consecutive row ranges of at most `size` rows
    pub fn chunks(&self, size: usize) -> impl Iterator<Item = Dataframe> + '_ {
        let size = size.max(1);
        (0..self.len())
            .step_by(size)
            .map(move |start| self.slice(start..start + size))
    }

    /// Append the rows of `other`, which must have the same columns in the same order
    pub fn extend_from(&mut self, other: &Dataframe) -> Result<()> {
        if self.column_names() != other.column_names() {
            return Err(Error::UnsupportedLayout(format!(
                "cannot concatenate frames with columns {:?} and {:?}",
                self.column_names(),
                other.column_names()
            )));
        }
        for (mine, theirs) in self.columns.iter_mut().zip(&other.columns) {
            mine.extend_from(theirs)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Value;

    fn sample() -> Dataframe {
        Dataframe::new(vec![
            Column::datetime_ns("ts", vec![10, 20, 30, 40, 50]),
            Column::float64("px", vec![1.0, 2.0, 3.0, 4.0, 5.0]),
        ])
        .unwrap()
        .with_index("ts")
        .unwrap()
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let err = Dataframe::new(vec![
            Column::int64("a", vec![1]),
            Column::int64("a", vec![2]),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateColumn(name) if name == "a"));
    }

    #[test]
    fn test_index_required() {
        let df = Dataframe::new(vec![Column::int64("a", vec![1])]).unwrap();
        assert!(matches!(df.require_index(), Err(Error::MissingIndex)));
        assert!(matches!(
            df.clone().with_index("missing"),
            Err(Error::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_len_is_longest_column() {
        let df = Dataframe::new(vec![
            Column::int64("a", vec![1, 2, 3]),
            Column::int32("b", vec![1]),
        ])
        .unwrap();
        assert_eq!(df.len(), 3);
        assert!(Dataframe::default().is_empty());
    }

    #[test]
    fn test_dtype_concatenates_fields() {
        let df = sample();
        let dtype = df.dtype();
        assert_eq!(dtype.to_string(), "[('ts', '<M8[ns]'), ('px', '<f8')]");
        assert_eq!(dtype.itemsize(), 16);
    }

    #[test]
    fn test_slice_keeps_index() {
        let df = sample().slice(2..4);
        assert_eq!(df.len(), 2);
        assert_eq!(df.index_name(), Some("ts"));
        assert_eq!(df.time_index().unwrap(), &[30, 40]);
    }

    #[test]
    fn test_chunks() {
        let sizes: Vec<usize> = sample().chunks(2).map(|c| c.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(sample().chunks(10).count(), 1);
    }

    #[test]
    fn test_extend_and_mutate() {
        let mut df = sample();
        df.extend_from(&sample().slice(0..1)).unwrap();
        assert_eq!(df.len(), 6);

        df.column_mut("px")
            .unwrap()
            .set(5, Value::Float64(9.5))
            .unwrap();
        assert_eq!(df.column("px").unwrap().get(5), Some(Value::Float64(9.5)));

        let other = Dataframe::new(vec![Column::int64("x", vec![1])]).unwrap();
        assert!(df.extend_from(&other).is_err());
    }
}
