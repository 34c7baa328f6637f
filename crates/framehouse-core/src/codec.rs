//! Row-Major Column Codec
//!
//! Transposes between column buffers and the packed row layout described by a
//! record `TypeDescriptor`.
//!
//! ## Packed Layout
//!
//! ```text
//! stride = Σ field widths
//!
//! row 0: | field 0 (w0) | field 1 (w1) | ... |
//! row 1: | field 0 (w0) | field 1 (w1) | ... |
//!          ^ offset 0     ^ offset w0
//! ```
//!
//! No padding anywhere: the buffer is exactly `rows * stride` bytes.
//!
//! ## Hot Path
//!
//! Numeric and time columns are copied with fixed-size, byte-order aware
//! stores into each row slot (`chunks_exact(stride)`); there is one
//! allocation per column and none per element. Text columns go through their
//! codec row by row:
//! - `S<n>`: Latin-1, one byte per char, NUL padded, trailing NULs stripped
//! - `U<n>`: UTF-32 in the field's byte order, NUL padded
//!
//! Values wider than their field are truncated to the field width.
//!
//! ## Example
//! ```ignore
//! let bytes = ColumnCodec::encode(&df)?;
//! let back = ColumnCodec::decode(&bytes, &df.dtype(), df.len())?;
//! ```

use crate::column::{Column, ColumnData};
use crate::dataframe::Dataframe;
use crate::dtype::{Scalar, ScalarKind, TypeDescriptor};
use crate::error::{Error, Result};

/// Stateless encoder/decoder between dataframes and packed rows.
pub struct ColumnCodec;

impl ColumnCodec {
    /// Pack every row of `df` following `df.dtype()`
    pub fn encode(df: &Dataframe) -> Result<Vec<u8>> {
        let dtype = df.dtype();
        dtype.validate()?;
        let stride = dtype.itemsize();
        let rows = df.len();
        let len = rows.checked_mul(stride).ok_or_else(|| {
            Error::UnsupportedLayout(format!("{rows} rows of {stride} bytes overflow usize"))
        })?;
        let mut buf = vec![0u8; len];

        let mut offset = 0;
        for column in df.columns() {
            encode_column(column, &mut buf, offset, stride)?;
            offset += column.scalar().width();
        }
        Ok(buf)
    }

    /// Unpack `rows` rows laid out as `dtype`.
    ///
    /// Bytes past `rows * stride` are ignored. The result has no index set.
    pub fn decode(buf: &[u8], dtype: &TypeDescriptor, rows: usize) -> Result<Dataframe> {
        let fields = match dtype {
            TypeDescriptor::Record(fields) => fields,
            TypeDescriptor::Scalar(scalar) => {
                return Err(Error::UnsupportedLayout(format!(
                    "expected a record descriptor, got scalar '{scalar}'"
                )))
            }
        };

        dtype.validate()?;

        let stride = dtype.itemsize();
        let expected = stride.checked_mul(rows).unwrap_or(usize::MAX);
        if buf.len() < expected {
            return Err(Error::BufferTooShort {
                expected,
                actual: buf.len(),
            });
        }
        let packed = &buf[..expected];

        let mut columns = Vec::with_capacity(fields.len());
        let mut offset = 0;
        for field in fields {
            let scalar = match &field.dtype {
                TypeDescriptor::Scalar(scalar) => *scalar,
                TypeDescriptor::Record(_) => {
                    return Err(Error::UnsupportedLayout(format!(
                        "nested record in field {}",
                        field.name
                    )))
                }
            };
            let data = decode_column(scalar, packed, offset, stride, rows);
            columns.push(Column {
                name: field.name.clone(),
                scalar,
                data,
            });
            offset += scalar.width();
        }

        Dataframe::new(columns)
    }
}

fn encode_column(column: &Column, buf: &mut [u8], offset: usize, stride: usize) -> Result<()> {
    let little = column.scalar.endian.is_little();
    match (&column.data, column.scalar.kind) {
        (ColumnData::Float64(values), _) => {
            let to_bytes: fn(f64) -> [u8; 8] = if little {
                f64::to_le_bytes
            } else {
                f64::to_be_bytes
            };
            put_fixed(buf, offset, stride, values, to_bytes);
        }
        (ColumnData::Int32(values), _) => {
            let to_bytes: fn(i32) -> [u8; 4] = if little {
                i32::to_le_bytes
            } else {
                i32::to_be_bytes
            };
            put_fixed(buf, offset, stride, values, to_bytes);
        }
        (ColumnData::Int64(values), _) | (ColumnData::DateTimeNs(values), _) => {
            let to_bytes: fn(i64) -> [u8; 8] = if little {
                i64::to_le_bytes
            } else {
                i64::to_be_bytes
            };
            put_fixed(buf, offset, stride, values, to_bytes);
        }
        (ColumnData::FixedString(values), ScalarKind::FixedString(width)) => {
            for (row, value) in buf.chunks_exact_mut(stride).zip(values) {
                encode_latin1(&column.name, value, &mut row[offset..offset + width])?;
            }
        }
        (ColumnData::FixedUnicode(values), ScalarKind::FixedUnicode(width)) => {
            for (row, value) in buf.chunks_exact_mut(stride).zip(values) {
                encode_utf32(value, little, &mut row[offset..offset + 4 * width]);
            }
        }
        (data, kind) => {
            return Err(Error::TypeMismatch {
                column: column.name.clone(),
                expected: kind.code(),
                actual: format!("{} values", data.len()),
            })
        }
    }
    Ok(())
}

fn decode_column(
    scalar: Scalar,
    packed: &[u8],
    offset: usize,
    stride: usize,
    rows: usize,
) -> ColumnData {
    let little = scalar.endian.is_little();
    match scalar.kind {
        ScalarKind::Float64 => {
            let from_bytes: fn([u8; 8]) -> f64 = if little {
                f64::from_le_bytes
            } else {
                f64::from_be_bytes
            };
            ColumnData::Float64(take_fixed(packed, offset, stride, rows, from_bytes))
        }
        ScalarKind::Int32 => {
            let from_bytes: fn([u8; 4]) -> i32 = if little {
                i32::from_le_bytes
            } else {
                i32::from_be_bytes
            };
            ColumnData::Int32(take_fixed(packed, offset, stride, rows, from_bytes))
        }
        ScalarKind::Int64 | ScalarKind::DateTimeNs => {
            let from_bytes: fn([u8; 8]) -> i64 = if little {
                i64::from_le_bytes
            } else {
                i64::from_be_bytes
            };
            let values = take_fixed(packed, offset, stride, rows, from_bytes);
            if scalar.kind.is_time() {
                ColumnData::DateTimeNs(values)
            } else {
                ColumnData::Int64(values)
            }
        }
        ScalarKind::FixedString(width) => ColumnData::FixedString(
            packed
                .chunks_exact(stride)
                .map(|row| decode_latin1(&row[offset..offset + width]))
                .collect(),
        ),
        ScalarKind::FixedUnicode(width) => ColumnData::FixedUnicode(
            packed
                .chunks_exact(stride)
                .map(|row| decode_utf32(&row[offset..offset + 4 * width], little))
                .collect(),
        ),
    }
}

/// Store one `N`-byte value per row slot
fn put_fixed<T: Copy, const N: usize>(
    buf: &mut [u8],
    offset: usize,
    stride: usize,
    values: &[T],
    to_bytes: fn(T) -> [u8; N],
) {
    for (row, value) in buf.chunks_exact_mut(stride).zip(values) {
        row[offset..offset + N].copy_from_slice(&to_bytes(*value));
    }
}

/// Load one `N`-byte value per row slot
fn take_fixed<T, const N: usize>(
    packed: &[u8],
    offset: usize,
    stride: usize,
    rows: usize,
    from_bytes: fn([u8; N]) -> T,
) -> Vec<T> {
    let mut values = Vec::with_capacity(rows);
    for row in packed.chunks_exact(stride) {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&row[offset..offset + N]);
        values.push(from_bytes(bytes));
    }
    values
}

fn encode_latin1(column: &str, value: &str, slot: &mut [u8]) -> Result<()> {
    for (byte, c) in slot.iter_mut().zip(value.chars()) {
        *byte = u8::try_from(u32::from(c)).map_err(|_| Error::TextEncoding {
            column: column.to_string(),
            codec: "latin-1",
            value: value.to_string(),
        })?;
    }
    Ok(())
}

fn decode_latin1(slot: &[u8]) -> String {
    let end = slot.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
    slot[..end].iter().map(|&b| char::from(b)).collect()
}

fn encode_utf32(value: &str, little: bool, slot: &mut [u8]) {
    for (unit, c) in slot.chunks_exact_mut(4).zip(value.chars()) {
        let code = u32::from(c);
        let bytes = if little {
            code.to_le_bytes()
        } else {
            code.to_be_bytes()
        };
        unit.copy_from_slice(&bytes);
    }
}

fn decode_utf32(slot: &[u8], little: bool) -> String {
    let mut units: Vec<u32> = slot
        .chunks_exact(4)
        .map(|unit| {
            let bytes = [unit[0], unit[1], unit[2], unit[3]];
            if little {
                u32::from_le_bytes(bytes)
            } else {
                u32::from_be_bytes(bytes)
            }
        })
        .collect();
    while units.last() == Some(&0) {
        units.pop();
    }
    units
        .into_iter()
        .map(|u| char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
