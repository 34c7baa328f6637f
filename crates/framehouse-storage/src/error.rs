//! Storage Error Types
//!
//! This module defines all error types that can occur during storage operations.
//!
//! ## Error Categories
//!
//! ### Wrapped Errors
//! - `Core`: descriptor, frame or codec failure from `framehouse-core`
//! - `Metadata`: backing document store failure
//!
//! ### Write Errors
//! - `SchemaMismatch`: the incoming frame's descriptor differs from the stored one
//!
//! ### Lookup Errors
//! - `SymbolNotFound`: nothing has been written under the symbol
//! - `VersionNotFound`: the requested version is not the live head
//! - `NoSegmentsFound`: a version exists but none of its segments do
//!
//! ### Integrity Errors
//! - `Decompression`: a block is truncated or its declared size is implausible
//! - `BlockTooLarge`: a payload does not fit the 4-byte length header
//! - `SegmentHashMismatch`: a segment's stored hash does not match its contents
//! - `BrokenSegmentChain`: no segment ends at an offset the chain requires
//! - `CorruptSegmentIndex`: the segment index stream is not a whole number of records
//!
//! ### Configuration Errors
//! - `Config`: a configuration file could not be read or parsed
//!
//! ## Usage
//!
//! All storage operations return `Result<T>` which is aliased to
//! `Result<T, Error>`. This allows clean error propagation with `?`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] framehouse_core::Error),

    #[error("Metadata error: {0}")]
    Metadata(#[from] framehouse_metadata::MetadataError),

    #[error("Schema mismatch for {symbol}: stored {stored}, incoming {incoming}")]
    SchemaMismatch {
        symbol: String,
        stored: String,
        incoming: String,
    },

    #[error("No segments found for {symbol} version {version}")]
    NoSegmentsFound { symbol: String, version: u64 },

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Version {version} of {symbol} not found")]
    VersionNotFound { symbol: String, version: u64 },

    #[error("Decompression error: {0}")]
    Decompression(String),

    #[error("Block of {len} bytes exceeds the u32 length header")]
    BlockTooLarge { len: usize },

    #[error("Segment hash mismatch for {symbol} at offset {segment}")]
    SegmentHashMismatch { symbol: String, segment: u64 },

    #[error("Broken segment chain for {symbol}: no segment ends at offset {offset}")]
    BrokenSegmentChain { symbol: String, offset: u64 },

    #[error("Corrupt segment index: {0}")]
    CorruptSegmentIndex(String),

    #[error("Config error: {0}")]
    Config(String),
}
