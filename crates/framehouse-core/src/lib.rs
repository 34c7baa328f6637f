//! framehouse core types
//!
//! The in-memory half of framehouse: the structured type descriptor language,
//! typed columns, dataframes, and the codec that packs a dataframe into
//! row-major bytes and back.
//!
//! ```text
//! Dataframe ──ColumnCodec::encode──► packed rows ──► (storage: compress, persist)
//!     ▲                                   │
//!     └──────ColumnCodec::decode──────────┘
//! ```

pub mod codec;
pub mod column;
pub mod compression;
pub mod dataframe;
pub mod dtype;
pub mod error;

pub use codec::ColumnCodec;
pub use column::{Column, ColumnData, Value};
pub use compression::Compression;
pub use dataframe::Dataframe;
pub use dtype::{Endian, Field, Scalar, ScalarKind, TypeDescriptor};
pub use error::{Error, Result};
