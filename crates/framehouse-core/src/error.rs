//! Error Types for framehouse-core
//!
//! This module defines every error the in-memory layer can raise: descriptor
//! parsing, column construction and the row-major codec.
//!
//! ## Error Categories
//!
//! ### Descriptor Errors
//! - `Parse`: malformed descriptor text, with the byte position and the token
//!   the parser expected there
//!
//! ### Layout Errors
//! - `BufferTooShort`: a packed buffer holds fewer bytes than `rows * stride`
//! - `UnsupportedLayout`: nested records or a bare scalar where a record is needed
//!
//! ### Frame Errors
//! - `MissingIndex`: a dataframe without an index column was handed to persistence
//! - `ColumnNotFound` / `DuplicateColumn`: name lookups and uniqueness
//! - `TypeMismatch`: a value or buffer does not match the column's scalar kind
//! - `RowOutOfBounds`: index access past the end of a column
//!
//! ### Text Errors
//! - `TextEncoding`: a value cannot be represented by a fixed-width text codec
//!
//! ## Usage
//! All fallible functions return `Result<T>`, aliased to `Result<T, Error>`.
//!
//! ```ignore
//! use framehouse_core::{Error, TypeDescriptor};
//!
//! match TypeDescriptor::parse("[('Open', '<f4')]") {
//!     Err(Error::Parse { position, expected, .. }) => {
//!         eprintln!("bad dtype at {position}, expected {expected}");
//!     }
//!     other => { /* ... */ }
//! }
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("syntax error at position {position}: expected {expected}, found {found}")]
    Parse {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("dataframe has no index column")]
    MissingIndex,

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("type mismatch in column {column}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("cannot encode {value:?} in column {column} as {codec}")]
    TextEncoding {
        column: String,
        codec: &'static str,
        value: String,
    },

    #[error("unsupported layout: {0}")]
    UnsupportedLayout(String),

    #[error("row {row} out of bounds for column {column} of length {len}")]
    RowOutOfBounds {
        column: String,
        row: usize,
        len: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
